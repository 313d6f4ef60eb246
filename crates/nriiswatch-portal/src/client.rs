//! HTTP client for the NRIIS portal.
//!
//! One reqwest client with a shared cookie jar stands in for the
//! browser session: the probe, the login replay and the list fetch all
//! ride the same jar, and the session cookie in it is what the bridge
//! reports as the session token.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Url;
use reqwest::cookie::{CookieStore, Jar};

use nriiswatch_core::config::{Credentials, PortalConfig};
use nriiswatch_core::error::{Result, WatchError};
use nriiswatch_core::traits::Portal;
use nriiswatch_core::types::{AccessProbe, ListSnapshot};

use crate::{extract, html};

pub struct NriisPortal {
    client: reqwest::Client,
    jar: Arc<Jar>,
    base: Url,
    cfg: PortalConfig,
}

impl NriisPortal {
    pub fn new(cfg: PortalConfig) -> Result<Self> {
        let base = Url::parse(&cfg.base_url)
            .map_err(|e| WatchError::Config(format!("Bad portal base_url: {e}")))?;
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .user_agent(cfg.user_agent.clone())
            .timeout(cfg.request_timeout())
            .build()
            .map_err(|e| WatchError::Portal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, jar, base, cfg })
    }

    async fn load_page(&self, url: &str) -> Result<(String, String)> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| WatchError::Portal(format!("GET {url}: {e}")))?
            .error_for_status()
            .map_err(|e| WatchError::Portal(format!("GET {url}: {e}")))?;
        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| WatchError::Portal(format!("Reading {url}: {e}")))?;
        Ok((final_url, body))
    }

    /// Form pairs the login page expects. Every element is optional:
    /// a missing field is skipped, never an error, mirroring how the
    /// site tolerates partial forms.
    fn login_form(&self, doc: &str, credentials: &Credentials) -> Vec<(String, String)> {
        let sel = &self.cfg.selectors;
        let mut form = html::hidden_inputs(doc);

        if let Some(tag) = html::tag_by_id(doc, &sel.mode_radio)
            && let Some(name) = html::attr(tag, "name")
        {
            // Checked radios submit their value attr, or "on" without one.
            let value = html::attr(tag, "value").unwrap_or_else(|| "on".into());
            form.push((name, value));
        }
        if let Some(name) = html::tag_by_id(doc, &sel.username_field).and_then(|t| html::attr(t, "name")) {
            form.push((name, credentials.username.clone()));
        }
        if let Some(name) = html::tag_by_id(doc, &sel.password_field).and_then(|t| html::attr(t, "name")) {
            form.push((name, credentials.password.clone()));
        }
        if let Some(tag) = html::tag_by_id(doc, &sel.submit_button)
            && let Some(name) = html::attr(tag, "name")
        {
            form.push((name, html::attr(tag, "value").unwrap_or_default()));
        }
        form
    }
}

#[async_trait]
impl Portal for NriisPortal {
    async fn probe_access(&self) -> AccessProbe {
        let sel = &self.cfg.selectors;
        match self.load_page(&self.cfg.list_url()).await {
            Ok((final_url, body)) => {
                let login_page = final_url.to_lowercase().contains("login.aspx");
                let has_table = html::has_id(&body, &sel.grid_table);
                let has_count = html::has_id(&body, &sel.count_label);
                let ok = !login_page && (has_table || has_count);
                tracing::debug!(ok, login_page, has_table, has_count, url = %final_url, "access probe");
                AccessProbe { ok, login_page, has_table, has_count, detail: final_url }
            }
            Err(e) => {
                tracing::debug!("access probe failed to load page: {e}");
                AccessProbe::unreachable(e.to_string())
            }
        }
    }

    async fn login(&self, credentials: &Credentials) -> Result<()> {
        let login_url = self.cfg.login_url();
        let (_, doc) = self.load_page(&login_url).await?;
        let form = self.login_form(&doc, credentials);
        tracing::info!(fields = form.len(), "submitting login form");
        self.client
            .post(&login_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| WatchError::Portal(format!("POST {login_url}: {e}")))?
            .error_for_status()
            .map_err(|e| WatchError::Portal(format!("POST {login_url}: {e}")))?;
        Ok(())
    }

    async fn fetch_pending(&self) -> Result<ListSnapshot> {
        let (_, body) = self.load_page(&self.cfg.list_url()).await?;
        Ok(extract::parse_list_page(&body, &self.cfg.selectors))
    }

    async fn session_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let cookies = header.to_str().ok()?;
        let prefix = format!("{}=", self.cfg.selectors.session_cookie);
        cookies
            .split("; ")
            .find_map(|c| c.strip_prefix(prefix.as_str()))
            .map(str::to_string)
    }
}
