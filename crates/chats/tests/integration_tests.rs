//! Integration tests for the synchronizer against recorded channel traffic.

use std::time::Duration;

use chatsync_chats::test_support::{frame, RecordingChannel};
use chatsync_chats::{
    DeliveryStatus, Dispatch, IgnoreReason, InboundEvent, Message, OutboundSignal,
    PresenceSynchronizer, StatusChange, TypingSignal,
};
use serde_json::json;
use tokio::time::Instant;

const TTL: Duration = Duration::from_secs(5);

fn synchronizer() -> PresenceSynchronizer<RecordingChannel> {
    let mut sync = PresenceSynchronizer::new(RecordingChannel::default(), TTL);
    sync.attach("me");
    sync
}

fn new_message(sync: &mut PresenceSynchronizer<RecordingChannel>, id: &str, conversation: &str) {
    let outcome = sync.handle(InboundEvent::MessageNew(Message::new(
        id,
        conversation,
        "bob",
        format!("text {id}"),
    )));
    assert!(outcome.is_applied(), "seeding {id} failed: {outcome:?}");
}

fn status(message_id: &str, conversation_id: Option<&str>) -> InboundEvent {
    InboundEvent::MessageStatus(StatusChange {
        message_id: message_id.to_string(),
        user_id: "carol".to_string(),
        conversation_id: conversation_id.map(str::to_string),
        status: DeliveryStatus::Read,
    })
}

fn status_of(sync: &PresenceSynchronizer<RecordingChannel>, conversation: &str, id: &str) -> DeliveryStatus {
    sync.store()
        .conversation(conversation)
        .and_then(|c| c.message(id))
        .map(|m| m.status)
        .expect("message should exist")
}

#[test]
fn new_message_is_appended_last() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");
    new_message(&mut sync, "m2", "c1");

    let before = sync.store().messages("c1").len();
    let outcome = sync.dispatch_frame(&frame(
        "message:new",
        json!({
            "_id": "m3",
            "conversationId": "c1",
            "senderId": "bob",
            "text": "third"
        }),
    ));

    assert!(outcome.is_applied());
    let messages = sync.store().messages("c1");
    assert_eq!(messages.len(), before + 1);
    assert_eq!(messages.last().map(|m| m.id.as_str()), Some("m3"));
}

#[test]
fn new_message_without_sender_is_still_appended() {
    let mut sync = synchronizer();

    let outcome = sync.dispatch_frame(&frame(
        "message:new",
        json!({ "_id": "m1", "conversationId": "c1", "text": "hi" }),
    ));

    assert!(outcome.is_applied());
    assert_eq!(sync.store().messages("c1").len(), 1);
}

#[test]
fn new_message_for_unseen_conversation_creates_it() {
    let mut sync = synchronizer();
    assert!(!sync.store().contains("fresh"));

    new_message(&mut sync, "m1", "fresh");

    assert_eq!(sync.store().messages("fresh").len(), 1);
}

#[test]
fn duplicate_message_is_not_appended_twice() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");

    let outcome = sync.handle(InboundEvent::MessageNew(Message::new("m1", "c1", "bob", "again")));

    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::Duplicate));
    assert_eq!(sync.store().messages("c1").len(), 1);
}

#[test]
fn explicit_status_touches_only_the_matching_message() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");
    new_message(&mut sync, "m2", "c1");
    new_message(&mut sync, "m3", "c2");

    assert!(sync.handle(status("m2", Some("c1"))).is_applied());

    assert_eq!(status_of(&sync, "c1", "m1"), DeliveryStatus::Sent);
    assert_eq!(status_of(&sync, "c1", "m2"), DeliveryStatus::Read);
    assert_eq!(status_of(&sync, "c2", "m3"), DeliveryStatus::Sent);
}

#[test]
fn explicit_status_does_not_fall_back_when_message_is_elsewhere() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");
    sync.store_mut().upsert_summary("c2", None, Default::default());

    let outcome = sync.handle(status("m1", Some("c2")));

    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::NoChange));
    assert_eq!(status_of(&sync, "c1", "m1"), DeliveryStatus::Sent);
}

#[test]
fn implicit_status_finds_loaded_message_over_active_conversation() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");
    new_message(&mut sync, "m2", "c2");
    sync.set_active_conversation(Some("c2".into()));

    assert!(sync.handle(status("m1", None)).is_applied());

    assert_eq!(status_of(&sync, "c1", "m1"), DeliveryStatus::Read);
    assert_eq!(status_of(&sync, "c2", "m2"), DeliveryStatus::Sent);
}

#[test]
fn implicit_status_for_unknown_message_routes_to_active_conversation() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m2", "c2");
    sync.set_active_conversation(Some("c2".into()));

    let change = match status("ghost", None) {
        InboundEvent::MessageStatus(change) => change,
        _ => unreachable!(),
    };
    assert_eq!(sync.resolve_conversation(&change).as_deref(), Some("c2"));

    // The active conversation has no such message, so nothing changes there.
    let outcome = sync.handle(InboundEvent::MessageStatus(change));
    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::NoChange));
    assert_eq!(status_of(&sync, "c2", "m2"), DeliveryStatus::Sent);
}

#[test]
fn implicit_status_without_active_conversation_is_dropped() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");

    let outcome = sync.handle(status("ghost", None));

    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::Unresolved));
    assert_eq!(status_of(&sync, "c1", "m1"), DeliveryStatus::Sent);
}

#[test]
fn status_event_from_frame_without_conversation_uses_index() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m7", "c3");

    let outcome = sync.dispatch_frame(&frame(
        "message:status",
        json!({ "messageId": "m7", "userId": "carol", "status": "delivered" }),
    ));

    assert!(outcome.is_applied());
    assert_eq!(status_of(&sync, "c3", "m7"), DeliveryStatus::Delivered);
}

#[test]
fn presence_snapshot_replaces_online_set() {
    let mut sync = synchronizer();
    sync.dispatch_frame(&frame("presence:update", json!(["A", "B"])));
    sync.dispatch_frame(&frame("presence:update", json!(["C"])));

    assert_eq!(sync.presence().online_users(), vec!["C"]);
}

#[test]
fn self_typing_is_never_recorded() {
    let mut sync = synchronizer();

    let outcome = sync.handle(InboundEvent::Typing(TypingSignal {
        conversation_id: "c1".into(),
        user_id: "me".into(),
        is_typing: true,
    }));

    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::SelfEcho));
    assert!(sync.typing().is_empty());
}

#[test]
fn typing_from_others_expires_after_ttl() {
    let mut sync = synchronizer();
    sync.dispatch_frame(&frame(
        "typing",
        json!({ "conversationId": "c1", "userId": "bob", "isTyping": true }),
    ));

    let now = Instant::now();
    assert!(sync.typing().is_typing("c1", "bob", now));

    assert_eq!(sync.expire_typing(now + TTL + Duration::from_millis(1)), 1);
    assert!(sync.typing().is_empty());
}

#[test]
fn typing_stop_clears_indicator() {
    let mut sync = synchronizer();
    for is_typing in [true, false] {
        sync.dispatch_frame(&frame(
            "typing",
            json!({ "conversationId": "c1", "userId": "bob", "isTyping": is_typing }),
        ));
    }

    assert!(!sync.typing().is_typing("c1", "bob", Instant::now()));
}

#[test]
fn conversation_update_is_last_write_wins() {
    let mut sync = synchronizer();
    for (text, unread) in [("first", 3), ("second", 1)] {
        sync.dispatch_frame(&frame(
            "conversation:update",
            json!({
                "conversationId": "c1",
                "lastMessage": { "text": text },
                "unreadCounts": { "me": unread }
            }),
        ));
    }

    let conversation = sync.store().conversation("c1").unwrap();
    assert_eq!(
        conversation.last_message.as_ref().and_then(|m| m.text.as_deref()),
        Some("second")
    );
    assert_eq!(conversation.unread_for("me"), 1);
}

#[test]
fn switching_conversations_leaves_then_joins() {
    let mut sync = synchronizer();
    sync.set_active_conversation(Some("X".into()));
    sync.channel_mut().take_emitted();

    sync.set_active_conversation(Some("Y".into()));

    assert_eq!(
        sync.channel().emitted,
        vec![
            OutboundSignal::LeaveConversation("X".into()),
            OutboundSignal::JoinConversation("Y".into()),
        ]
    );
}

#[test]
fn first_active_conversation_only_joins() {
    let mut sync = synchronizer();

    sync.set_active_conversation(Some("Y".into()));

    assert_eq!(
        sync.channel().emitted,
        vec![OutboundSignal::JoinConversation("Y".into())]
    );
}

#[test]
fn active_conversation_chosen_before_attach_is_joined_on_attach() {
    let mut sync = PresenceSynchronizer::new(RecordingChannel::default(), TTL);
    sync.set_active_conversation(Some("c1".into()));
    assert!(sync.channel().emitted.is_empty());

    sync.attach("me");

    assert_eq!(
        sync.channel().emitted,
        vec![OutboundSignal::JoinConversation("c1".into())]
    );
    assert_eq!(sync.joined_conversation(), Some("c1"));
}

#[test]
fn detach_stops_mutations_but_keeps_data() {
    let mut sync = synchronizer();
    new_message(&mut sync, "m1", "c1");
    sync.set_active_conversation(Some("c1".into()));

    sync.detach();

    assert_eq!(sync.channel().disconnects, 1);
    assert_eq!(sync.store().messages("c1").len(), 1);

    let outcome = sync.dispatch_frame(&frame(
        "message:new",
        json!({ "_id": "m2", "conversationId": "c1", "senderId": "bob" }),
    ));
    assert_eq!(outcome, Dispatch::Ignored(IgnoreReason::Detached));
    assert_eq!(sync.store().messages("c1").len(), 1);

    sync.set_active_conversation(Some("c2".into()));
    assert_eq!(
        sync.channel().emitted,
        vec![OutboundSignal::JoinConversation("c1".into())]
    );
    assert_eq!(sync.active_conversation(), Some("c2"));
}

#[test]
fn reattach_rejoins_active_conversation_without_stale_leave() {
    let mut sync = synchronizer();
    sync.set_active_conversation(Some("c1".into()));
    sync.detach();
    sync.channel_mut().take_emitted();

    sync.attach("me");

    assert_eq!(
        sync.channel().emitted,
        vec![OutboundSignal::JoinConversation("c1".into())]
    );
}
