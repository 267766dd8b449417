use chrono::{Duration, TimeZone, Utc};
use core_client::RoomMessage;
use core_state::{RETENTION_CAP, RetentionWindow};
use proptest::prelude::*;
use std::collections::HashSet;

fn message(id: u16, secs: i64) -> RoomMessage {
    RoomMessage {
        id: format!("m{id}"),
        room_id: String::new(),
        sender_id: String::new(),
        sender_login: "alice".into(),
        sender_guild: String::new(),
        body: String::new(),
        kind: String::new(),
        metadata: None,
        created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::seconds(secs),
    }
}

fn batches() -> impl Strategy<Value = Vec<Vec<(u16, i64)>>> {
    prop::collection::vec(prop::collection::vec((0u16..400, 0i64..10_000), 0..60), 1..12)
}

proptest! {
    #[test]
    fn window_stays_sorted_bounded_and_consistent(input in batches()) {
        let mut w = RetentionWindow::new();
        for batch in &input {
            let msgs: Vec<_> = batch.iter().map(|(id, t)| message(*id, *t)).collect();
            w.merge(&msgs, None);

            let entries = w.entries();
            prop_assert!(entries.windows(2).all(|p| p[0].created_at <= p[1].created_at));
            prop_assert!(w.len() <= RETENTION_CAP);

            let ids: HashSet<String> = w.ids().into_iter().collect();
            prop_assert_eq!(ids.len(), w.len());
            prop_assert_eq!(w.seen_len(), ids.len());
            prop_assert!(ids.iter().all(|id| w.has_seen(id)));
        }
    }

    #[test]
    fn redelivery_is_idempotent(batch in prop::collection::vec((0u16..100, 0i64..1000), 0..80)) {
        let msgs: Vec<_> = batch.iter().map(|(id, t)| message(*id, *t)).collect();
        let mut w = RetentionWindow::new();
        w.merge(&msgs, None);
        let first = w.ids();
        let report = w.merge(&msgs, None);
        prop_assert_eq!(report.inserted, 0);
        prop_assert_eq!(w.ids(), first);
    }
}

#[test]
fn overflow_keeps_most_recent_cap() {
    let mut w = RetentionWindow::new();
    let msgs: Vec<_> = (0..450u16).rev().map(|i| message(i, i as i64)).collect();
    w.merge(&msgs, None);
    assert_eq!(w.len(), RETENTION_CAP);
    assert_eq!(w.ids().first().map(String::as_str), Some("m250"));
    assert_eq!(w.ids().last().map(String::as_str), Some("m449"));
}
