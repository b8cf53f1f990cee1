//! Self-hiding message region.

use crate::model::MessageKind;
use std::time::{Duration, Instant};

/// How long a message stays visible.
pub(crate) const MESSAGE_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Message {
    pub text: String,
    pub kind: MessageKind,
    pub stamp: String,
    shown_at: Instant,
}

/// Holds at most one message. A newer message replaces the current one and restarts the timer.
#[derive(Debug, Default)]
pub(crate) struct MessageBox {
    current: Option<Message>,
}

impl MessageBox {
    pub fn show(&mut self, text: impl Into<String>, kind: MessageKind, now: Instant) {
        self.current = Some(Message {
            text: text.into(),
            kind,
            stamp: clock_stamp(),
            shown_at: now,
        });
    }

    pub fn hide(&mut self) {
        self.current = None;
    }

    /// The message still on screen at `now`, if any.
    pub fn visible(&self, now: Instant) -> Option<&Message> {
        self.current
            .as_ref()
            .filter(|m| now.saturating_duration_since(m.shown_at) < MESSAGE_TTL)
    }

    /// Drop an expired message so the next draw doesn't have to re-check it.
    pub fn expire(&mut self, now: Instant) {
        if self.visible(now).is_none() {
            self.current = None;
        }
    }
}

/// Local wall-clock `HH:MM:SS`, UTC when the local offset can't be determined.
pub(crate) fn clock_stamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(time::macros::format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "--:--:--".into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_hides_after_ttl() {
        let t0 = Instant::now();
        let mut mb = MessageBox::default();
        mb.show("Started", MessageKind::Success, t0);

        assert_eq!(
            mb.visible(t0 + Duration::from_millis(4_999)).map(|m| m.text.as_str()),
            Some("Started")
        );
        assert!(mb.visible(t0 + MESSAGE_TTL).is_none());
    }

    #[test]
    fn newer_message_replaces_and_restarts_timer() {
        let t0 = Instant::now();
        let mut mb = MessageBox::default();
        mb.show("first", MessageKind::Success, t0);
        let t1 = t0 + Duration::from_secs(3);
        mb.show("second", MessageKind::Error, t1);

        let m = mb.visible(t1).expect("visible");
        assert_eq!(m.text, "second");
        assert_eq!(m.kind, MessageKind::Error);
        // Still visible past the first message's deadline.
        assert!(mb.visible(t0 + Duration::from_secs(7)).is_some());
        assert!(mb.visible(t1 + MESSAGE_TTL).is_none());
    }

    #[test]
    fn hide_and_expire_clear_the_message() {
        let t0 = Instant::now();
        let mut mb = MessageBox::default();
        mb.show("x", MessageKind::Error, t0);
        mb.hide();
        assert!(mb.visible(t0).is_none());

        mb.show("y", MessageKind::Error, t0);
        mb.expire(t0 + Duration::from_secs(1));
        assert!(mb.visible(t0 + Duration::from_secs(1)).is_some());
        mb.expire(t0 + Duration::from_secs(6));
        assert!(mb.current.is_none());
    }

    #[test]
    fn clock_stamp_is_hh_mm_ss() {
        let s = clock_stamp();
        assert_eq!(s.len(), 8);
        assert_eq!(s.as_bytes()[2], b':');
        assert_eq!(s.as_bytes()[5], b':');
    }
}
