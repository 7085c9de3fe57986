//! Per-agent session state.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Call counters and rate-limit timestamps for one agent's session.
///
/// Created lazily on the first check that reaches the rate/quota rules;
/// cleared only by an explicit [`crate::PermissionManager::reset_session`].
/// The session boundary is policy-defined, not a wall-clock TTL.
#[derive(Debug)]
pub(crate) struct SessionState {
    call_count: u32,
    last_call: HashMap<String, Instant>,
    session_start: DateTime<Utc>,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self {
            call_count: 0,
            last_call: HashMap::new(),
            session_start: Utc::now(),
        }
    }

    /// Allowed calls so far in this session.
    pub(crate) fn call_count(&self) -> u32 {
        self.call_count
    }

    pub(crate) fn session_start(&self) -> DateTime<Utc> {
        self.session_start
    }

    /// Seconds since the last allowed call to `tool`, if any.
    pub(crate) fn seconds_since_last_call(&self, tool: &str) -> Option<f64> {
        self.last_call
            .get(tool)
            .map(|at| at.elapsed().as_secs_f64())
    }

    /// Record an allowed call: bump the quota counter and stamp the tool.
    ///
    /// Runs only on the allow path; denied attempts never advance the
    /// timestamp or the counter.
    pub(crate) fn record_allowed(&mut self, tool: &str) {
        self.call_count += 1;
        self.last_call.insert(tool.to_string(), Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_empty() {
        let session = SessionState::new();
        assert_eq!(session.call_count(), 0);
        assert!(session.seconds_since_last_call("t").is_none());
    }

    #[test]
    fn test_record_allowed_updates_count_and_stamp() {
        let mut session = SessionState::new();
        session.record_allowed("t");
        session.record_allowed("t");
        session.record_allowed("other");

        assert_eq!(session.call_count(), 3);
        assert!(session.seconds_since_last_call("t").unwrap() >= 0.0);
        assert!(session.seconds_since_last_call("other").is_some());
        assert!(session.seconds_since_last_call("third").is_none());
    }

    #[test]
    fn test_session_start_is_set() {
        let session = SessionState::new();
        assert!(session.session_start() <= Utc::now());
    }
}
