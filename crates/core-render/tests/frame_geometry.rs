//! Frame geometry: the frame always fills the terminal exactly, the input row
//! stays anchored at the bottom, and scrolling clamps to available history.

use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, TimeZone, Utc};
use core_client::{ClientError, Presence, RoomMessage};
use core_events::{KeyCode, KeyEvent, KeyModifiers};
use core_model::ChatModel;
use core_render::{Frame, render};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::time::Duration;

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
}

fn now() -> DateTime<FixedOffset> {
    (base_time() + ChronoDuration::hours(3)).fixed_offset()
}

fn msg(i: usize, login: &str, body: &str) -> RoomMessage {
    RoomMessage {
        id: format!("m{i}"),
        room_id: String::new(),
        sender_id: String::new(),
        sender_login: login.into(),
        sender_guild: String::new(),
        body: body.into(),
        kind: String::new(),
        metadata: None,
        created_at: base_time() + ChronoDuration::seconds(i as i64),
    }
}

fn presence(logins: &[&str]) -> Presence {
    Presence {
        room_slug: "the-hall".into(),
        count: logins.len(),
        logins: logins.iter().map(|s| s.to_string()).collect(),
    }
}

fn model_with(n: usize) -> ChatModel {
    let mut m = ChatModel::new(Duration::from_secs(4));
    m.state_mut().set_identity("me");
    let batch = (0..n).map(|i| msg(i, "bob", &format!("message {i}"))).collect();
    m.state_mut().apply_poll(Ok(batch), Ok(presence(&["bob"])), base_time());
    m
}

fn texts(frame: &Frame) -> Vec<String> {
    frame.lines.iter().map(|l| l.text()).collect()
}

fn key(c: char) -> KeyEvent {
    KeyEvent::plain(KeyCode::Char(c))
}

#[test]
fn connecting_banner_reserves_full_chrome() {
    let m = ChatModel::new(Duration::from_secs(4));
    let f = render(&m, 80, 24, now());
    let rows = texts(&f);
    assert_eq!(rows.len(), 24);
    assert_eq!(rows[22], " connecting...");
    assert_eq!(rows[23], "> █sign in to chat");
}

#[test]
fn could_not_connect_banner() {
    let mut m = ChatModel::new(Duration::from_secs(4));
    m.state_mut().apply_poll(
        Err(ClientError::Transport("refused".into())),
        Ok(presence(&[])),
        base_time(),
    );
    let rows = texts(&render(&m, 80, 10, now()));
    assert!(rows[8].starts_with(" could not connect"));
}

#[test]
fn newest_message_sits_above_input() {
    let m = model_with(30);
    let f = render(&m, 80, 12, now());
    let rows = texts(&f);
    assert_eq!(rows.len(), 12);
    assert_eq!(f.log_height, 11);
    assert!(rows[10].ends_with("bob · message 29"));
    assert_eq!(rows[11], "> █say something...");
}

#[test]
fn overscroll_snaps_to_oldest_line() {
    let mut m = model_with(30);
    m.handle_key(&KeyEvent::plain(KeyCode::Esc));
    for _ in 0..200 {
        m.handle_key(&key('k'));
    }
    let f = render(&m, 80, 12, now());
    assert_eq!(f.scroll, 30 - 11);
    assert!(texts(&f)[0].ends_with("bob · message 0"));

    m.snap_scroll(f.scroll, f.log_height);
    assert_eq!(m.view().scroll, 19);
    m.handle_key(&key('j'));
    let rows = texts(&render(&m, 80, 12, now()));
    assert!(rows[0].ends_with("bob · message 1"));
}

#[test]
fn popup_does_not_move_input_row() {
    let mut m = model_with(5);
    m.handle_key(&key('@'));
    let rows = texts(&render(&m, 80, 12, now()));
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[10], "   ▸ bob");
    assert_eq!(rows[11], "> @█");
}

#[test]
fn slash_hints_sit_between_log_and_input() {
    let mut m = model_with(5);
    m.handle_key(&key('/'));
    let rows = texts(&render(&m, 80, 12, now()));
    assert_eq!(rows[7], "   /build <title>  start a build");
    assert_eq!(rows[11], "> /█");
}

#[test]
fn status_line_is_last_row() {
    let mut m = ChatModel::new(Duration::from_secs(4));
    m.state_mut().apply_poll(Ok(Vec::new()), Ok(presence(&[])), base_time());
    m.handle_key(&key('h'));
    m.handle_key(&key('i'));
    m.handle_key(&KeyEvent::plain(KeyCode::Enter));
    let rows = texts(&render(&m, 80, 6, now()));
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[5], " sign in to chat (set [server].token)");
    assert_eq!(rows[4], "> hi█");
}

#[test]
fn tiny_terminal_keeps_input() {
    let mut m = model_with(3);
    m.handle_key(&key('/'));
    let rows = texts(&render(&m, 80, 3, now()));
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2], "> /█");
}

#[test]
fn presence_notices_render_as_system_rows() {
    let mut m = model_with(2);
    m.state_mut().apply_poll(Ok(Vec::new()), Ok(presence(&["bob", "cy"])), base_time() + ChronoDuration::minutes(1));
    let rows = texts(&render(&m, 40, 8, now()));
    assert_eq!(rows[6].trim(), "— cy joined —");
}

proptest! {
    #[test]
    fn frame_always_fills_terminal(
        width in 10u16..120,
        height in 1u16..50,
        bodies in proptest::collection::vec("[a-z漢 @/:.]{0,80}", 0..30),
        typed in "[a-z/@ ]{0,40}",
        multiline in any::<bool>(),
    ) {
        let mut m = ChatModel::new(Duration::from_secs(4));
        m.state_mut().set_identity("me");
        let batch = bodies.iter().enumerate().map(|(i, b)| msg(i, "bob", b)).collect();
        m.state_mut().apply_poll(Ok(batch), Ok(presence(&["bob"])), base_time());
        for c in typed.chars() {
            m.handle_key(&key(c));
        }
        if multiline {
            m.handle_key(&KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
            m.handle_key(&key('x'));
        }

        let f = render(&m, width, height, now());
        prop_assert_eq!(f.lines.len(), height as usize);
        prop_assert!(f.lines.iter().all(|l| l.width() <= width as usize));
        prop_assert!(f.log_height >= 2);
        if m.state().status_text().is_none() {
            let last = f.lines.last().map(|l| l.text()).unwrap_or_default();
            prop_assert!(last.starts_with("> ") || last.starts_with("  ") || last.ends_with('…'));
        }
    }
}
