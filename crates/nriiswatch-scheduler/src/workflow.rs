//! The main polling workflow.
//!
//! One cycle: probe the session, recover it through the login automator
//! if needed, extract the pending list, drive the badge/notification
//! surface, relay rows. At most one cycle runs at a time; a trigger
//! that arrives mid-cycle is dropped.
//!
//! ```text
//! trigger → guard → probe ──ok──────────────→ extract → badge → relay
//!                     │                          ↑
//!                     └─ login (≤ ceiling) ──────┘ (re-probe once)
//! ```

use std::sync::Arc;

use nriiswatch_core::NAME_PREFIX;
use nriiswatch_core::config::ScheduleConfig;
use nriiswatch_core::error::Result;
use nriiswatch_core::state::RunState;
use nriiswatch_core::traits::{CredentialStore, NotifySink, Portal, StatusSurface};
use nriiswatch_relay::deliver_all;

pub struct Watcher {
    portal: Arc<dyn Portal>,
    sink: Arc<dyn NotifySink>,
    surface: Arc<dyn StatusSurface>,
    credentials: Arc<dyn CredentialStore>,
    state: Arc<RunState>,
    schedule: ScheduleConfig,
}

impl Watcher {
    pub fn new(
        portal: Arc<dyn Portal>,
        sink: Arc<dyn NotifySink>,
        surface: Arc<dyn StatusSurface>,
        credentials: Arc<dyn CredentialStore>,
        state: Arc<RunState>,
        schedule: ScheduleConfig,
    ) -> Self {
        Self { portal, sink, surface, credentials, state, schedule }
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.state
    }

    /// Run one cycle, or drop the trigger if a cycle is in flight.
    /// Never propagates an error: an unhandled failure cools down and
    /// makes one login-retry attempt, then yields to the next alarm.
    pub async fn run_cycle(&self) {
        let Some(_guard) = self.state.try_begin() else {
            tracing::info!("cycle already running, dropping this trigger");
            return;
        };
        tracing::info!("cycle starting");
        if let Err(e) = self.cycle_body().await {
            tracing::warn!("cycle failed: {e}; cooling down before a login retry");
            tokio::time::sleep(self.schedule.retry_cooldown()).await;
            self.attempt_login().await;
        }
    }

    async fn cycle_body(&self) -> Result<()> {
        let mut probe = self.portal.probe_access().await;
        if !probe.ok {
            tracing::info!(detail = %probe.detail, "cannot access list page, trying auto-login");
            if !self.attempt_login().await {
                return Ok(());
            }
            // Back to the top: the prober decides whether the replayed
            // login actually took. One login attempt per cycle.
            probe = self.portal.probe_access().await;
            if !probe.ok {
                tracing::info!("still unauthenticated after login attempt, ending cycle");
                return Ok(());
            }
        }
        tracing::info!("access OK");

        let token = self.portal.session_token().await.unwrap_or_default();
        self.state.set_latest_cookie(token).await;

        let snapshot = self.portal.fetch_pending().await?;
        let count = snapshot.count;
        tracing::info!(count, rows = snapshot.rows.len(), "data retrieved");

        self.state.set_latest_count(count);
        self.surface.set_badge(Some(count)).await;

        if count == 0 {
            self.surface.notify_pending(0).await;
            return Ok(());
        }
        if snapshot.rows.is_empty() {
            // Count label says there is work but the grid gave nothing:
            // a parse failure, not an empty queue.
            tracing::warn!(count, "count is positive but extracted rows are empty");
            self.report(&format!(
                "{NAME_PREFIX}Error : มีจำนวนโครงการแต่ดึงรายละเอียดไม่ได้ (Parse Error)"
            ))
            .await;
            return Ok(());
        }

        self.surface.notify_pending(count).await;
        deliver_all(self.sink.as_ref(), &snapshot.rows, self.schedule.pacing()).await;

        // Only a cycle that reached the end of the relay loop clears
        // the login failure streak.
        self.state.reset_login_attempts();
        Ok(())
    }

    /// One bounded login attempt. Returns whether a form was actually
    /// submitted (and the caller should re-probe).
    async fn attempt_login(&self) -> bool {
        let attempt = self.state.bump_login_attempt();
        if attempt > self.schedule.max_login_retry {
            tracing::error!(attempt, ceiling = self.schedule.max_login_retry, "login retries exhausted");
            self.report(&format!("{NAME_PREFIX}Error : เข้าสู่ระบบ NRIIS ไม่ได้... กรุณาตรวจสอบ"))
                .await;
            return false;
        }

        let credentials = self.credentials.get().await;
        if !credentials.is_complete() {
            // A setup gap, not a runtime failure: nothing to report
            // upstream, the user has to fill in the settings.
            tracing::warn!("no credentials configured, skipping login attempt");
            return false;
        }

        tracing::info!(attempt, "replaying login form");
        if let Err(e) = self.portal.login(&credentials).await {
            tracing::warn!("login attempt failed: {e}");
            return false;
        }
        // Give the post-login redirect time to land before re-probing.
        tokio::time::sleep(self.schedule.settle()).await;
        true
    }

    async fn report(&self, message: &str) {
        if let Err(e) = self.sink.report_error(message).await {
            tracing::warn!("error report did not reach the sink: {e}");
        }
    }
}
