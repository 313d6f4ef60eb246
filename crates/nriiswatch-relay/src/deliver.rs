//! Sequential paced delivery.
//!
//! Rows go out strictly in extraction order; record i is scheduled at
//! `loop start + i × pacing`, a crude linear backpressure against the
//! webhook's rate limits. A record that fails is logged and skipped,
//! not retried; partial delivery is accepted.

use std::time::Duration;

use chrono::Local;
use tokio::time::Instant;

use nriiswatch_core::traits::NotifySink;
use nriiswatch_core::types::{ProposalRecord, SheetPayload};

use crate::sink::thai_timestamp;

/// Relay every record through the sink. Returns the number delivered.
pub async fn deliver_all(
    sink: &dyn NotifySink,
    rows: &[ProposalRecord],
    pacing: Duration,
) -> usize {
    let start = Instant::now();
    let mut delivered = 0;
    for (i, row) in rows.iter().enumerate() {
        tokio::time::sleep_until(start + pacing * i as u32).await;
        let payload = SheetPayload::from_record(row, thai_timestamp(Local::now()));
        tracing::info!(n = i + 1, of = rows.len(), id = %row.id, "relaying record");
        match sink.add_record(&payload).await {
            Ok(()) => delivered += 1,
            Err(e) => tracing::warn!(id = %row.id, "relay call failed, continuing: {e}"),
        }
    }
    delivered
}
