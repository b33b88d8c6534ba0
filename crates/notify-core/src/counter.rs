//! Unseen badge count.
//!
//! Local records count while `seen` is false, with two gates:
//!
//! - scheduled-meeting records need the chat subsystem to be ready, and are
//!   skipped when the meeting evaluates to [`MeetingVerdict::Rejected`] or
//!   [`MeetingVerdict::Zero`];
//! - dynamic records count when unexpired and above the watermark.

use crate::host::{ChatGate, MeetingVerdict};
use crate::model::{Notification, NotificationKind};

/// Inputs the count depends on besides the records themselves.
pub struct CountContext<'a> {
    pub now: i64,
    pub watermark: u64,
    pub chat: &'a dyn ChatGate,
}

#[must_use]
pub fn count_unseen(records: &[Notification], ctx: &CountContext<'_>) -> usize {
    records.iter().filter(|r| counts_as_unseen(r, ctx)).count()
}

#[must_use]
pub fn counts_as_unseen(record: &Notification, ctx: &CountContext<'_>) -> bool {
    if let Some(id) = record.dynamic_id() {
        return !record.is_expired(ctx.now) && id > ctx.watermark;
    }

    if record.seen {
        return false;
    }

    if record.kind == NotificationKind::ScheduledMeeting {
        if !ctx.chat.is_ready() {
            return false;
        }
        return matches!(ctx.chat.evaluate_meeting(record), MeetingVerdict::Metadata(_));
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::StaticChat;
    use crate::model::{
        DynamicData, NotificationData, NotificationId, PaymentData, ScheduledMeetingData,
    };
    use std::collections::BTreeMap;

    fn payment(seen: bool) -> Notification {
        Notification {
            id: NotificationId::Local("p".to_string()),
            kind: NotificationKind::Payment,
            data: NotificationData::Payment(PaymentData {
                result: "s".to_string(),
                plan: None,
            }),
            user_handle: None,
            timestamp: 0,
            time_delta: 0,
            seen,
            all_data_items: Vec::new(),
        }
    }

    fn meeting() -> Notification {
        Notification {
            id: NotificationId::Local("m".to_string()),
            kind: NotificationKind::ScheduledMeeting,
            data: NotificationData::ScheduledMeeting(ScheduledMeetingData {
                meeting_id: "m1".to_string(),
                chat_id: None,
                organizer: None,
                extra: BTreeMap::new(),
            }),
            user_handle: Some("org".to_string()),
            timestamp: 0,
            time_delta: 0,
            seen: false,
            all_data_items: Vec::new(),
        }
    }

    fn dynamic(id: u64, expiry: Option<i64>) -> Notification {
        Notification {
            id: NotificationId::Dynamic(id),
            kind: NotificationKind::Dynamic,
            data: NotificationData::Dynamic(DynamicData {
                id,
                title: String::new(),
                description: String::new(),
                image: None,
                primary_action: None,
                secondary_action: None,
                start: None,
                expiry,
                remaining: None,
            }),
            user_handle: None,
            timestamp: 0,
            time_delta: 0,
            seen: false,
            all_data_items: Vec::new(),
        }
    }

    #[test]
    fn counts_unseen_local_records() {
        let chat = StaticChat::default();
        let ctx = CountContext {
            now: 0,
            watermark: 0,
            chat: &chat,
        };
        assert_eq!(count_unseen(&[payment(false), payment(true), payment(false)], &ctx), 2);
    }

    #[test]
    fn meeting_waits_for_chat_readiness() {
        let chat = StaticChat::default();
        let records = [meeting()];
        let ctx = CountContext {
            now: 0,
            watermark: 0,
            chat: &chat,
        };
        assert_eq!(count_unseen(&records, &ctx), 0);

        chat.set_ready(true);
        assert_eq!(count_unseen(&records, &ctx), 1);

        chat.set_verdict(MeetingVerdict::Zero);
        assert_eq!(count_unseen(&records, &ctx), 0);

        chat.set_verdict(MeetingVerdict::Rejected);
        assert_eq!(count_unseen(&records, &ctx), 0);

        chat.set_ready(false);
        chat.set_verdict(MeetingVerdict::Metadata(serde_json::json!({ "title": "x" })));
        assert_eq!(count_unseen(&records, &ctx), 0);
    }

    #[test]
    fn dynamic_counts_above_watermark_until_expiry() {
        let chat = StaticChat::default();
        let records = [dynamic(5, None), dynamic(6, Some(100)), dynamic(3, None)];
        let mut ctx = CountContext {
            now: 100,
            watermark: 4,
            chat: &chat,
        };
        assert_eq!(count_unseen(&records, &ctx), 2);

        ctx.now = 101;
        assert_eq!(count_unseen(&records, &ctx), 1);

        ctx.watermark = 5;
        assert_eq!(count_unseen(&records, &ctx), 0);
    }

    #[test]
    fn dynamic_ignores_stored_seen_flag() {
        let chat = StaticChat::default();
        let mut record = dynamic(9, None);
        record.seen = true;
        let ctx = CountContext {
            now: 0,
            watermark: 0,
            chat: &chat,
        };
        assert!(counts_as_unseen(&record, &ctx));
    }
}
