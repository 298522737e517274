//! Retry policy for transient store conflicts.
//!
//! Every write operation in the engine is idempotent through its idempotency
//! key, so re-running a whole database transaction after a conflict is always
//! safe: either the previous attempt never committed and the re-run redoes it
//! from scratch, or it did commit and the re-run short-circuits into a replay
//! of the recorded result.
//!
//! That property is what makes the policy here deliberately blunt: on a
//! retryable error we simply execute the same logical operation again with
//! the original arguments, up to a bounded number of extra attempts.

use std::future::Future;

use sea_orm::{DbErr, SqlErr};

use crate::{LedgerError, ResultLedger};

/// Extra attempts after the first failed one.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Whether a database error is expected to succeed on a fresh attempt.
///
/// Matches the PostgreSQL SQLSTATEs for serialization failure (`40001`) and
/// deadlock (`40P01`), SQLite writer contention, and unique-constraint
/// violations. The last one covers the race where two transactions insert the
/// same idempotency key: the loser re-runs, finds the winner's row, and
/// returns it as a replay instead of surfacing the constraint error.
pub(crate) fn is_transient_conflict(err: &DbErr) -> bool {
    if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
        return true;
    }

    let text = err.to_string();
    text.contains("40001")
        || text.contains("40P01")
        || text.contains("deadlock")
        || text.contains("database is locked")
        || text.contains("database table is locked")
}

/// Runs `op`, re-executing it after transient store conflicts.
///
/// Any non-transient error, or exhaustion of `max_retries` extra attempts,
/// propagates to the caller unchanged.
pub async fn with_retry<T, F, Fut>(max_retries: u32, mut op: F) -> ResultLedger<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = ResultLedger<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Err(LedgerError::Database(err))
                if is_transient_conflict(&err) && attempt < max_retries =>
            {
                attempt += 1;
                tracing::warn!(attempt, "retrying ledger transaction after conflict: {err}");
            }
            other => return other,
        }
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::RuntimeErr;

    use super::*;

    fn conflict(code: &str) -> DbErr {
        DbErr::Exec(RuntimeErr::Internal(format!("error returned: {code}")))
    }

    #[test]
    fn serialization_and_deadlock_codes_are_transient() {
        assert!(is_transient_conflict(&conflict("SQLSTATE 40001")));
        assert!(is_transient_conflict(&conflict("SQLSTATE 40P01")));
        assert!(is_transient_conflict(&conflict("database is locked")));
        assert!(!is_transient_conflict(&conflict("syntax error")));
    }

    #[tokio::test]
    async fn retries_until_conflict_clears() {
        let mut failures = 2;
        let result: ResultLedger<u32> = with_retry(DEFAULT_MAX_RETRIES, || {
            let attempt_fails = failures > 0;
            if attempt_fails {
                failures -= 1;
            }
            async move {
                if attempt_fails {
                    Err(LedgerError::Database(conflict("40001")))
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn non_transient_errors_propagate_immediately() {
        let mut calls = 0;
        let result: ResultLedger<u32> = with_retry(DEFAULT_MAX_RETRIES, || {
            calls += 1;
            async { Err(LedgerError::WalletNotFound("w".to_string())) }
        })
        .await;

        assert_eq!(result.unwrap_err(), LedgerError::WalletNotFound("w".to_string()));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_the_last_conflict() {
        let result: ResultLedger<u32> = with_retry(1, || async {
            Err(LedgerError::Database(conflict("40P01")))
        })
        .await;

        match result.unwrap_err() {
            LedgerError::Database(err) => assert!(is_transient_conflict(&err)),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
