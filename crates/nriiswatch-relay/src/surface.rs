//! Badge and notification surface.
//!
//! The daemon has no browser toolbar, so the badge is a small value
//! object and notifications land in a replace-by-id history (the fixed
//! channel id replaces its predecessor, same as the platform
//! notification API did). Every raise also emits a tracing event, which
//! is what a headless deployment actually watches.

use async_trait::async_trait;
use tokio::sync::Mutex;

use nriiswatch_core::NAME_PREFIX;
use nriiswatch_core::traits::StatusSurface;

/// Notification channel id; one slot, newest wins.
pub const PENDING_NOTIFICATION_ID: &str = "NRIIS_NOTI";

/// Neutral color shown at zero pending items.
pub const BADGE_NEUTRAL: &str = "#000000";
/// Alert color for any non-zero count.
pub const BADGE_ALERT: &str = "#FF0000";

const HISTORY_CAP: usize = 100;

/// Toolbar-badge equivalent: text plus background color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub text: String,
    pub color: &'static str,
}

impl Badge {
    /// `None` clears the text; color stays neutral only at exactly 0.
    pub fn for_count(count: Option<u32>) -> Self {
        let text = count.map(|n| n.to_string()).unwrap_or_default();
        let color = if count == Some(0) { BADGE_NEUTRAL } else { BADGE_ALERT };
        Self { text, color }
    }
}

impl Default for Badge {
    fn default() -> Self {
        Self { text: String::new(), color: BADGE_NEUTRAL }
    }
}

/// One raised notification.
#[derive(Debug, Clone)]
pub struct UserNotification {
    pub id: String,
    pub title: String,
    pub message: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
struct SurfaceState {
    badge: Badge,
    notifications: Vec<UserNotification>,
}

/// Production surface: tracing events plus an in-memory history the
/// bridge and tests can read back.
#[derive(Default)]
pub struct DesktopSurface {
    inner: Mutex<SurfaceState>,
}

impl DesktopSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn badge(&self) -> Badge {
        self.inner.lock().await.badge.clone()
    }

    pub async fn notifications(&self) -> Vec<UserNotification> {
        self.inner.lock().await.notifications.clone()
    }

    async fn raise(&self, id: &str, title: String, message: String) {
        tracing::info!(id, %title, %message, "🔔 notification");
        let note = UserNotification {
            id: id.to_string(),
            title,
            message,
            timestamp: chrono::Utc::now(),
        };
        let mut state = self.inner.lock().await;
        // Same id replaces the previous notification in place.
        if let Some(slot) = state.notifications.iter_mut().find(|n| n.id == id) {
            *slot = note;
        } else {
            state.notifications.push(note);
            if state.notifications.len() > HISTORY_CAP {
                state.notifications.remove(0);
            }
        }
    }
}

#[async_trait]
impl StatusSurface for DesktopSurface {
    async fn set_badge(&self, count: Option<u32>) {
        let badge = Badge::for_count(count);
        tracing::debug!(text = %badge.text, color = badge.color, "badge updated");
        self.inner.lock().await.badge = badge;
    }

    async fn notify_pending(&self, count: u32) {
        self.raise(
            PENDING_NOTIFICATION_ID,
            format!("{NAME_PREFIX}NRIIS ตรวจสอบ/รับรองฯ ทุนภายนอก"),
            format!("มีโครงการวิจัยที่รอการพิจารณา จำนวน {count} โครงการ"),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nriiswatch_core::traits::StatusSurface;

    #[test]
    fn badge_text_is_decimal_and_color_flips_off_zero() {
        for n in [0u32, 1, 3, 42, 999] {
            let badge = Badge::for_count(Some(n));
            assert_eq!(badge.text, n.to_string());
            if n == 0 {
                assert_eq!(badge.color, BADGE_NEUTRAL);
            } else {
                assert_eq!(badge.color, BADGE_ALERT);
            }
        }
        let cleared = Badge::for_count(None);
        assert_eq!(cleared.text, "");
        assert_eq!(cleared.color, BADGE_ALERT);
    }

    #[tokio::test]
    async fn pending_notification_replaces_its_predecessor() {
        let surface = DesktopSurface::new();
        surface.notify_pending(3).await;
        surface.notify_pending(5).await;

        let notes = surface.notifications().await;
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, PENDING_NOTIFICATION_ID);
        assert!(notes[0].message.contains("จำนวน 5 โครงการ"));
        assert!(notes[0].title.starts_with("Comet :: "));
    }

    #[tokio::test]
    async fn set_badge_is_readable_back() {
        let surface = DesktopSurface::new();
        surface.set_badge(Some(7)).await;
        assert_eq!(surface.badge().await, Badge { text: "7".into(), color: BADGE_ALERT });
    }
}
