//! Request and result types for the optimistic CAS transaction loop.
//!
//! The loop itself lives on [`TypedStore::execute_transaction`](crate::TypedStore::execute_transaction):
//! read every condition key, hand the values to the update closure, then CAS
//! each returned pair against the bytes read in the same attempt. A lost race
//! restarts from a fresh read.

/// Default attempt bound used by stores that do not pick their own policy.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1_000;

/// How many times a transaction may be attempted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryPolicy {
    /// One attempt; a lost race is reported as not committed.
    Once,
    /// Retry after every lost race. `None` never gives up.
    UntilCommitted { max_attempts: Option<u32> },
}

impl RetryPolicy {
    pub fn unbounded() -> Self {
        Self::UntilCommitted { max_attempts: None }
    }

    pub fn bounded(max_attempts: u32) -> Self {
        Self::UntilCommitted {
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    /// Whether another attempt is allowed after `attempts` have failed.
    pub(crate) fn allows_retry(&self, attempts: u32) -> bool {
        match self {
            Self::Once => false,
            Self::UntilCommitted { max_attempts: None } => true,
            Self::UntilCommitted {
                max_attempts: Some(max),
            } => attempts < *max,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::bounded(DEFAULT_MAX_ATTEMPTS)
    }
}

/// Current state of one condition key. `value` is `None` when absent.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedKeyValue<K, V> {
    pub key: K,
    pub value: Option<V>,
}

/// What the update closure wants done with the values it was shown.
#[derive(Clone, Debug, PartialEq)]
pub enum CasUpdate<K, V> {
    /// Write these pairs. Every key must be one of the condition keys.
    Write(Vec<(K, V)>),
    /// Nothing to change; the transaction succeeds without writing.
    Unchanged,
}

/// A read-modify-write request over one or more keys of a typed store.
///
/// `update` is called once per attempt with fresh values for
/// `condition_keys`, in the same order. It may run several times, so it must
/// not have side effects beyond computing its result.
pub struct TypedCasRequest<K, F> {
    pub condition_keys: Vec<K>,
    pub retry: RetryPolicy,
    pub update: F,
}

impl<K, F> TypedCasRequest<K, F> {
    pub fn new(condition_keys: Vec<K>, retry: RetryPolicy, update: F) -> Self {
        Self {
            condition_keys,
            retry,
            update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn once_never_retries() {
        assert!(!RetryPolicy::Once.allows_retry(1));
    }

    #[test]
    fn bounded_stops_at_the_limit() {
        let policy = RetryPolicy::bounded(3);
        assert!(policy.allows_retry(1));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
    }

    #[test]
    fn bounded_zero_still_makes_one_attempt() {
        assert_eq!(RetryPolicy::bounded(0), RetryPolicy::bounded(1));
        assert!(!RetryPolicy::bounded(0).allows_retry(1));
    }

    #[test]
    fn unbounded_always_retries() {
        assert!(RetryPolicy::unbounded().allows_retry(u32::MAX - 1));
    }
}
