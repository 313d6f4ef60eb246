//! nriiswatch configuration system.
//!
//! Everything site-specific lives here, including the element ids the
//! extractor looks for. The defaults match the NRIIS portal as of the
//! last survey; a site markup change is a config edit, not a code change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, WatchError};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatchConfig {
    #[serde(default)]
    pub portal: PortalConfig,
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub bridge: BridgeConfig,
    #[serde(default)]
    pub credentials: Credentials,
}

impl WatchConfig {
    /// Load config from the default path (~/.nriiswatch/config.toml).
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| WatchError::Config(format!("Failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| WatchError::Config(format!("Failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| WatchError::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default config path.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".nriiswatch")
            .join("config.toml")
    }
}

/// Target-site configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_list_path")]
    pub list_path: String,
    /// Hard ceiling on any single page load, so a hung request cannot
    /// stall the workflow forever.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub selectors: PortalSelectors,
}

fn default_base_url() -> String { "https://nriis.go.th".into() }
fn default_login_path() -> String { "/Login.aspx".into() }
fn default_list_path() -> String { "/ProposalListAgree.aspx".into() }
fn default_request_timeout() -> u64 { 30 }
fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0".into()
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            login_path: default_login_path(),
            list_path: default_list_path(),
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
            selectors: PortalSelectors::default(),
        }
    }
}

impl PortalConfig {
    pub fn login_url(&self) -> String {
        format!("{}{}", self.base_url, self.login_path)
    }

    pub fn list_url(&self) -> String {
        format!("{}{}", self.base_url, self.list_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Element ids the prober, extractor and login automator look for.
/// These are data, not logic: the parsing rules never hard-code an id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalSelectors {
    /// Label whose text carries the pending count.
    #[serde(default = "default_count_label")]
    pub count_label: String,
    /// Grid table holding one row per pending proposal.
    #[serde(default = "default_grid_table")]
    pub grid_table: String,
    /// Id fragment of the deadline span inside the last consulted cell.
    #[serde(default = "default_deadline_fragment")]
    pub deadline_fragment: String,
    /// Login-mode radio button (external researcher mode).
    #[serde(default = "default_mode_radio")]
    pub mode_radio: String,
    #[serde(default = "default_username_field")]
    pub username_field: String,
    #[serde(default = "default_password_field")]
    pub password_field: String,
    #[serde(default = "default_submit_button")]
    pub submit_button: String,
    /// Session cookie name, exposed through the bridge for diagnostics.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

fn default_count_label() -> String { "ctl00_ContentDetail_lbN".into() }
fn default_grid_table() -> String { "ctl00_ContentDetail_gv_wait".into() }
fn default_deadline_fragment() -> String { "lbHAEnddate".into() }
fn default_mode_radio() -> String { "ctl00_ContentDetail_gridRadios2".into() }
fn default_username_field() -> String { "ctl00_ContentDetail_tb_user".into() }
fn default_password_field() -> String { "ctl00_ContentDetail_tb_password".into() }
fn default_submit_button() -> String { "ctl00_ContentDetail_bt_login".into() }
fn default_session_cookie() -> String { "ASP.NET_SessionId".into() }

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            count_label: default_count_label(),
            grid_table: default_grid_table(),
            deadline_fragment: default_deadline_fragment(),
            mode_radio: default_mode_radio(),
            username_field: default_username_field(),
            password_field: default_password_field(),
            submit_button: default_submit_button(),
            session_cookie: default_session_cookie(),
        }
    }
}

/// Notification sink (Apps Script webhook) configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Webhook URL. No default: each deployment carries its own key.
    #[serde(default)]
    pub script_url: String,
    /// Window the remote script gets to execute before we give up on a
    /// call. Doubles as the request timeout; the response body is never
    /// consumed.
    #[serde(default = "default_call_window")]
    pub call_window_secs: u64,
}

fn default_call_window() -> u64 { 5 }

impl Default for SinkConfig {
    fn default() -> Self {
        Self { script_url: String::new(), call_window_secs: default_call_window() }
    }
}

impl SinkConfig {
    pub fn call_window(&self) -> Duration {
        Duration::from_secs(self.call_window_secs)
    }
}

/// Workflow timing knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Grace period after process start before the first cycle.
    #[serde(default = "default_startup_delay")]
    pub startup_delay_mins: u64,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_mins: u64,
    /// Cooldown after an unhandled cycle error, before the login retry.
    #[serde(default = "default_retry_cooldown")]
    pub retry_cooldown_mins: u64,
    /// Consecutive-attempt ceiling for the login automator.
    #[serde(default = "default_max_login_retry")]
    pub max_login_retry: u32,
    /// Wait after submitting the login form, so the redirect completes.
    #[serde(default = "default_settle")]
    pub settle_secs: u64,
    /// Spacing between consecutive relay calls.
    #[serde(default = "default_pacing")]
    pub pacing_secs: u64,
}

fn default_startup_delay() -> u64 { 5 }
fn default_poll_interval() -> u64 { 60 }
fn default_retry_cooldown() -> u64 { 2 }
fn default_max_login_retry() -> u32 { 4 }
fn default_settle() -> u64 { 5 }
fn default_pacing() -> u64 { 10 }

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            startup_delay_mins: default_startup_delay(),
            poll_interval_mins: default_poll_interval(),
            retry_cooldown_mins: default_retry_cooldown(),
            max_login_retry: default_max_login_retry(),
            settle_secs: default_settle(),
            pacing_secs: default_pacing(),
        }
    }
}

impl ScheduleConfig {
    pub fn startup_delay(&self) -> Duration {
        Duration::from_secs(self.startup_delay_mins * 60)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_mins * 60)
    }

    pub fn retry_cooldown(&self) -> Duration {
        Duration::from_secs(self.retry_cooldown_mins * 60)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_secs(self.pacing_secs)
    }
}

/// Message-bridge listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default = "default_bridge_enabled")]
    pub enabled: bool,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

fn default_bridge_enabled() -> bool { true }
fn default_listen_addr() -> String { "127.0.0.1:8744".into() }

impl Default for BridgeConfig {
    fn default() -> Self {
        Self { enabled: default_bridge_enabled(), listen_addr: default_listen_addr() }
    }
}

/// Portal credentials. Empty strings until the user sets them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl Credentials {
    /// A login attempt needs both halves.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

/// Credential store backed by the settings file. Reads the file on
/// every call, so a `creds` edit takes effect on the next login attempt
/// without a restart.
pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait::async_trait]
impl crate::traits::CredentialStore for FileCredentials {
    async fn get(&self) -> Credentials {
        match WatchConfig::load_from(&self.path) {
            Ok(cfg) => cfg.credentials,
            Err(e) => {
                tracing::warn!("could not read credentials: {e}");
                Credentials::default()
            }
        }
    }
}
