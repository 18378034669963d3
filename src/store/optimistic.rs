//! Apply locally, attempt remotely, compensate on failure.

use crate::error::StoreError;
use std::future::Future;
use tracing::warn;

/// Lifecycle of the most recent mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MutationState {
    #[default]
    Idle,
    /// Remote call in flight.
    Pending,
    /// Remote confirmed; local state reflects it.
    Applied,
    /// Remote failed after an optimistic apply; local change rolled back.
    Reverted,
    /// Remote failed before anything was applied locally.
    Failed,
}

/// Run `remote` with `apply` visible locally while it is in flight.
///
/// `apply` returns whatever `revert` needs to undo it. On failure `revert`
/// runs with that token before the error is returned.
pub async fn run_optimistic<S, U, T, Fut>(
    state: &mut S,
    status: &mut MutationState,
    apply: impl FnOnce(&mut S) -> U,
    revert: impl FnOnce(&mut S, U),
    remote: Fut,
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    let undo = apply(state);
    *status = MutationState::Pending;
    match remote.await {
        Ok(value) => {
            *status = MutationState::Applied;
            Ok(value)
        }
        Err(err) => {
            warn!(error = %err, "remote rejected optimistic update, reverting");
            revert(state, undo);
            *status = MutationState::Reverted;
            Err(err)
        }
    }
}

/// Run `remote` and only then apply its result locally.
pub async fn run_confirmed<S, T, Fut>(
    state: &mut S,
    status: &mut MutationState,
    remote: Fut,
    apply: impl FnOnce(&mut S, &T),
) -> Result<T, StoreError>
where
    Fut: Future<Output = Result<T, StoreError>>,
{
    *status = MutationState::Pending;
    match remote.await {
        Ok(value) => {
            apply(state, &value);
            *status = MutationState::Applied;
            Ok(value)
        }
        Err(err) => {
            *status = MutationState::Failed;
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn optimistic_success_keeps_change() {
        let mut value = 1;
        let mut status = MutationState::Idle;
        let out = run_optimistic(
            &mut value,
            &mut status,
            |v| {
                let old = *v;
                *v = 2;
                old
            },
            |v, old| *v = old,
            async { Ok::<_, StoreError>("ok") },
        )
        .await;
        assert_eq!(out.unwrap(), "ok");
        assert_eq!(value, 2);
        assert_eq!(status, MutationState::Applied);
    }

    #[tokio::test]
    async fn optimistic_failure_reverts() {
        let mut value = 1;
        let mut status = MutationState::Idle;
        let out: Result<(), _> = run_optimistic(
            &mut value,
            &mut status,
            |v| {
                let old = *v;
                *v = 2;
                old
            },
            |v, old| *v = old,
            async { Err(StoreError::remote("offline")) },
        )
        .await;
        assert!(out.is_err());
        assert_eq!(value, 1);
        assert_eq!(status, MutationState::Reverted);
    }

    #[tokio::test]
    async fn confirmed_failure_applies_nothing() {
        let mut value = 1;
        let mut status = MutationState::Idle;
        let out: Result<i32, _> = run_confirmed(
            &mut value,
            &mut status,
            async { Err(StoreError::remote("offline")) },
            |v, new| *v = *new,
        )
        .await;
        assert!(out.is_err());
        assert_eq!(value, 1);
        assert_eq!(status, MutationState::Failed);

        let out = run_confirmed(&mut value, &mut status, async { Ok(5) }, |v, new| *v = *new).await;
        assert_eq!(out.unwrap(), 5);
        assert_eq!(value, 5);
        assert_eq!(status, MutationState::Applied);
    }
}
