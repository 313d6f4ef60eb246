//! Process-wide run state and the single-flight guard.
//!
//! The original design used a bare boolean as a mutex; here the
//! Idle→Running transition is an atomic compare-exchange and release is
//! an RAII drop, so the flag clears on every exit path.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use tokio::sync::RwLock;

/// Mutable state shared between the workflow, the scheduler and the
/// message bridge. Never persisted: resets to defaults on restart.
#[derive(Debug, Default)]
pub struct RunState {
    latest_count: AtomicU32,
    login_attempt: AtomicU32,
    running: AtomicBool,
    /// Last observed session token, diagnostics only.
    latest_cookie: RwLock<String>,
}

impl RunState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Try to enter the workflow. `None` means a cycle is already in
    /// flight and this trigger should be dropped.
    pub fn try_begin(self: &Arc<Self>) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard { state: Arc::clone(self) })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Last cached count. Unsynchronized read: may be stale while a
    /// cycle is in progress, by design.
    pub fn latest_count(&self) -> u32 {
        self.latest_count.load(Ordering::Relaxed)
    }

    pub fn set_latest_count(&self, count: u32) {
        self.latest_count.store(count, Ordering::Relaxed);
    }

    pub async fn latest_cookie(&self) -> String {
        self.latest_cookie.read().await.clone()
    }

    pub async fn set_latest_cookie(&self, cookie: String) {
        *self.latest_cookie.write().await = cookie;
    }

    pub fn login_attempt(&self) -> u32 {
        self.login_attempt.load(Ordering::Relaxed)
    }

    /// Increment the consecutive-attempt counter and return the new value.
    pub fn bump_login_attempt(&self) -> u32 {
        self.login_attempt.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Reset only after a cycle that completed the relay loop.
    pub fn reset_login_attempts(&self) {
        self.login_attempt.store(0, Ordering::Relaxed);
    }
}

/// Scoped hold on the single-flight flag.
pub struct RunGuard {
    state: Arc<RunState>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.state.running.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_begin_is_refused_until_guard_drops() {
        let state = RunState::new();
        let guard = state.try_begin().expect("first begin");
        assert!(state.is_running());
        assert!(state.try_begin().is_none());
        drop(guard);
        assert!(!state.is_running());
        assert!(state.try_begin().is_some());
    }

    #[test]
    fn guard_releases_on_unwind() {
        let state = RunState::new();
        let state2 = Arc::clone(&state);
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _guard = state2.try_begin().unwrap();
            panic!("cycle blew up");
        }));
        assert!(!state.is_running());
    }

    #[test]
    fn attempt_counter_bumps_and_resets() {
        let state = RunState::new();
        assert_eq!(state.bump_login_attempt(), 1);
        assert_eq!(state.bump_login_attempt(), 2);
        assert_eq!(state.login_attempt(), 2);
        state.reset_login_attempts();
        assert_eq!(state.login_attempt(), 0);
    }

    #[tokio::test]
    async fn cookie_is_readable_while_idle_or_running() {
        let state = RunState::new();
        state.set_latest_cookie("abc123".into()).await;
        let _guard = state.try_begin().unwrap();
        assert_eq!(state.latest_cookie().await, "abc123");
    }
}
