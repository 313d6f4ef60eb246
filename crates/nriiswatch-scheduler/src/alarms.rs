//! Alarm loop: the startup grace period, the recurring refresh, and
//! external triggers from the bridge, all funneled into the same
//! single-flight workflow.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};

use crate::workflow::Watcher;

/// Why a cycle was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Startup grace period elapsed.
    Startup,
    /// A bridge query asked for fresh data.
    Query,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Startup => write!(f, "startup"),
            Trigger::Query => write!(f, "query"),
        }
    }
}

/// Arm the one-shot startup alarm. Runs detached; the delay keeps the
/// first cycle out of the way of other boot-time work.
pub fn arm_startup_alarm(triggers: mpsc::Sender<Trigger>, delay: Duration) {
    tracing::info!(secs = delay.as_secs(), "⏰ startup alarm armed");
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if triggers.send(Trigger::Startup).await.is_err() {
            tracing::debug!("scheduler gone before the startup alarm fired");
        }
    });
}

/// Drive the watcher until the trigger channel closes: a recurring
/// refresh every `period` (first firing one full period in), plus
/// whatever arrives on the channel. Overlap is resolved by the
/// single-flight guard, not here.
pub async fn run(watcher: Arc<Watcher>, period: Duration, mut triggers: mpsc::Receiver<Trigger>) {
    tracing::info!(mins = period.as_secs() / 60, "⏰ refresh alarm armed");
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                tracing::info!("alarm: refresh");
                watcher.run_cycle().await;
            }
            trigger = triggers.recv() => match trigger {
                Some(trigger) => {
                    tracing::info!(%trigger, "alarm: external trigger");
                    watcher.run_cycle().await;
                }
                None => {
                    tracing::info!("trigger channel closed, scheduler stopping");
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn startup_alarm_fires_once_after_the_delay() {
        let (tx, mut rx) = mpsc::channel(4);
        arm_startup_alarm(tx, Duration::from_secs(300));

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.try_recv(), Ok(Trigger::Startup));
        assert!(rx.try_recv().is_err());
    }
}
