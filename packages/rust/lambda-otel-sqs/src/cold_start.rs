//! Cold start detection for Lambda functions.
//!
//! The tracker is a process-wide state cell owned by the telemetry
//! initialization and passed by reference wherever the cold-start flag is
//! read, rather than living in a global. Within one tracker at most one
//! call observes `true`, even under concurrent invocations.

use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::constants::{env_vars, values};

/// One-shot cold-start flag with the lifetime of the hosting process.
///
/// Starts in the cold state; the first [`check_cold_start`](Self::check_cold_start)
/// consumes it. When the execution environment was pre-warmed through
/// provisioned concurrency the flag is forced warm and `false` is reported
/// without a consuming read.
#[derive(Debug)]
pub struct ColdStartTracker {
    is_cold_start: AtomicBool,
}

impl ColdStartTracker {
    /// Creates a tracker in the cold state.
    pub const fn new() -> Self {
        Self {
            is_cold_start: AtomicBool::new(true),
        }
    }

    /// Reports whether this invocation is the cold start, consuming the flag.
    ///
    /// Exactly one call per tracker returns `true`; the atomic swap keeps
    /// that invariant under concurrent callers. With
    /// `AWS_LAMBDA_INITIALIZATION_TYPE=provisioned-concurrency` every call
    /// returns `false`.
    pub fn check_cold_start(&self) -> bool {
        if env::var(env_vars::LAMBDA_INITIALIZATION_TYPE)
            .map(|v| v == values::PROVISIONED_CONCURRENCY)
            .unwrap_or(false)
        {
            self.is_cold_start.store(false, Ordering::SeqCst);
            return false;
        }

        self.is_cold_start.swap(false, Ordering::SeqCst)
    }
}

impl Default for ColdStartTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealed_test::prelude::*;

    #[sealed_test]
    fn test_first_call_is_cold_then_warm() {
        std::env::remove_var(env_vars::LAMBDA_INITIALIZATION_TYPE);
        let tracker = ColdStartTracker::new();

        assert!(tracker.check_cold_start());
        assert!(!tracker.check_cold_start());
        assert!(!tracker.check_cold_start());
    }

    #[sealed_test]
    fn test_provisioned_concurrency_is_never_cold() {
        std::env::set_var(
            env_vars::LAMBDA_INITIALIZATION_TYPE,
            values::PROVISIONED_CONCURRENCY,
        );
        let tracker = ColdStartTracker::new();

        assert!(!tracker.check_cold_start());
        assert!(!tracker.check_cold_start());
    }

    #[sealed_test]
    fn test_other_initialization_types_do_not_force_warm() {
        std::env::set_var(env_vars::LAMBDA_INITIALIZATION_TYPE, "on-demand");
        let tracker = ColdStartTracker::new();

        assert!(tracker.check_cold_start());
        assert!(!tracker.check_cold_start());
    }

    #[sealed_test]
    fn test_trackers_are_independent() {
        std::env::remove_var(env_vars::LAMBDA_INITIALIZATION_TYPE);
        let first = ColdStartTracker::new();
        let second = ColdStartTracker::new();

        assert!(first.check_cold_start());
        assert!(second.check_cold_start());
    }

    #[sealed_test]
    fn test_at_most_one_concurrent_caller_sees_cold() {
        std::env::remove_var(env_vars::LAMBDA_INITIALIZATION_TYPE);
        let tracker = std::sync::Arc::new(ColdStartTracker::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = tracker.clone();
                std::thread::spawn(move || tracker.check_cold_start())
            })
            .collect();

        let cold_count = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|cold| *cold)
            .count();
        assert_eq!(cold_count, 1);
    }
}
