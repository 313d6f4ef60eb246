//! Trait seams between the workflow and its collaborators.
//!
//! The workflow only ever talks to these; production wires in the
//! reqwest-backed portal and sink, tests wire in mocks.

use async_trait::async_trait;

use crate::config::Credentials;
use crate::error::Result;
use crate::types::{AccessProbe, ListSnapshot, SheetPayload};

/// The target site: session check, login replay, list retrieval.
#[async_trait]
pub trait Portal: Send + Sync {
    /// Load the list page and decide whether the session is live.
    /// Never errors: an unreachable page is an `ok: false` probe.
    async fn probe_access(&self) -> AccessProbe;

    /// Replay the login form with the given credentials. Returns once
    /// the form is submitted; callers apply the settle delay.
    async fn login(&self, credentials: &Credentials) -> Result<()>;

    /// Load the list page and extract the pending count plus rows.
    async fn fetch_pending(&self) -> Result<ListSnapshot>;

    /// Current session token, if one is in the jar.
    async fn session_token(&self) -> Option<String>;
}

/// The external notification sink (webhook endpoint, fire-and-forget).
#[async_trait]
pub trait NotifySink: Send + Sync {
    /// Forward one record.
    async fn add_record(&self, payload: &SheetPayload) -> Result<()>;

    /// Raise a free-text error report.
    async fn report_error(&self, message: &str) -> Result<()>;
}

/// User-facing badge and notification surface.
#[async_trait]
pub trait StatusSurface: Send + Sync {
    /// Badge shows the decimal count; `None` clears the text.
    async fn set_badge(&self, count: Option<u32>);

    /// Raise (or replace) the pending-items notification.
    async fn notify_pending(&self, count: u32);
}

/// Where credentials come from. Read on every login attempt, never
/// cached, so the user can fix them without a restart.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self) -> Credentials;
}
