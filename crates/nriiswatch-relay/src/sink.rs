//! Apps Script webhook sink.
//!
//! Two URL-based calls, both fire-and-forget: `?a=addData&d=<payload>`
//! appends one spreadsheet row, `?er=<message>` files an error report.
//! The endpoint returns nothing we care about; the timeout is the
//! execution window we grant the remote script.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Local, Timelike};

use nriiswatch_core::config::SinkConfig;
use nriiswatch_core::error::{Result, WatchError};
use nriiswatch_core::traits::NotifySink;
use nriiswatch_core::types::SheetPayload;

pub struct AppsScriptSink {
    client: reqwest::Client,
    script_url: String,
}

impl AppsScriptSink {
    pub fn new(cfg: &SinkConfig) -> Result<Self> {
        if cfg.script_url.is_empty() {
            return Err(WatchError::Config(
                "sink.script_url is not set; the relay has nowhere to deliver".into(),
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(cfg.call_window())
            .build()
            .map_err(|e| WatchError::Sink(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, script_url: cfg.script_url.clone() })
    }

    async fn fire(&self, url: String) -> Result<()> {
        // Response body deliberately ignored: the contract is
        // fire-and-forget, delivery is at-most-once.
        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchError::Sink(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl NotifySink for AppsScriptSink {
    async fn add_record(&self, payload: &SheetPayload) -> Result<()> {
        let json = serde_json::to_string(payload)
            .map_err(|e| WatchError::Sink(format!("Payload serialization: {e}")))?;
        let url = format!("{}?a=addData&d={}", self.script_url, urlencoding::encode(&json));
        self.fire(url).await
    }

    async fn report_error(&self, message: &str) -> Result<()> {
        let url = format!("{}?er={}", self.script_url, urlencoding::encode(message));
        self.fire(url).await
    }
}

/// Timestamp in the Thai convention the spreadsheet uses: day/month
/// with the Buddhist-era year, then wall-clock time.
pub fn thai_timestamp(now: DateTime<Local>) -> String {
    format!(
        "{}/{}/{} {:02}:{:02}:{:02}",
        now.day(),
        now.month(),
        now.year() + 543,
        now.hour(),
        now.minute(),
        now.second()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sink_requires_a_script_url() {
        assert!(AppsScriptSink::new(&SinkConfig::default()).is_err());
        let cfg = SinkConfig {
            script_url: "https://script.google.com/macros/s/KEY/exec".into(),
            ..SinkConfig::default()
        };
        assert!(AppsScriptSink::new(&cfg).is_ok());
    }

    #[test]
    fn thai_timestamp_uses_buddhist_era() {
        let at = Local.with_ymd_and_hms(2026, 8, 30, 9, 5, 7).unwrap();
        assert_eq!(thai_timestamp(at), "30/8/2569 09:05:07");
    }

    #[test]
    fn payload_round_trips_through_the_query_encoding() {
        let payload = SheetPayload::from_record(&Default::default(), "1/1/2569 00:00:00".into());
        let json = serde_json::to_string(&payload).unwrap();
        let encoded = urlencoding::encode(&json);
        // No raw separators may survive into the query value.
        assert!(!encoded.contains('&'));
        assert!(!encoded.contains('='));
        let decoded = urlencoding::decode(&encoded).unwrap();
        let back: SheetPayload = serde_json::from_str(&decoded).unwrap();
        assert_eq!(back.a, "1/1/2569 00:00:00");
    }
}
