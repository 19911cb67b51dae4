use std::fs;
use std::path::PathBuf;

use super::Conversation;
use super::DEFAULT_OCR_QUESTION;
use crate::domain::models::Author;
use crate::domain::models::ChatReply;
use crate::domain::models::HistoryRow;
use crate::domain::models::ImageRef;
use crate::domain::models::ImagesReply;
use crate::domain::models::MessageType;
use crate::domain::models::Mode;
use crate::domain::models::Outbound;
use crate::domain::services::tables;

fn temp_image(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join("conversa-conversation-tests");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    fs::write(&path, b"not really a png").unwrap();
    return path;
}

fn chat_request(outbound: Option<Outbound>) -> crate::domain::models::ChatRequest {
    match outbound {
        Some(Outbound::Chat(req)) => return req,
        _ => panic!("expected a chat request"),
    }
}

#[test]
fn it_appends_an_optimistic_bubble_and_builds_a_chat_request() {
    let mut convo = Conversation::new(Mode::Regular);
    let req = chat_request(convo.begin_send("hello there"));

    assert_eq!(req.message, "hello there");
    assert_eq!(req.mode, Mode::Regular);
    assert_eq!(req.session_id, None);

    assert_eq!(convo.messages.len(), 1);
    assert_eq!(convo.messages[0].author, Author::User);
    assert_eq!(convo.messages[0].text, "hello there");
}

#[test]
fn it_enhances_comparative_questions_on_the_wire_only() {
    let mut convo = Conversation::new(Mode::Regular);
    let req = chat_request(convo.begin_send("tea versus coffee"));

    assert_eq!(req.message, tables::enhance("tea versus coffee"));
    assert!(req.message.ends_with(tables::TABLE_HINT));
    // The transcript shows what the user typed.
    assert_eq!(convo.messages[0].text, "tea versus coffee");
}

#[test]
fn it_drops_a_second_send_while_in_flight() {
    let mut convo = Conversation::new(Mode::Regular);
    assert!(convo.begin_send("first").is_some());

    assert!(convo.begin_send("second").is_none());
    assert_eq!(convo.messages.len(), 1);
    assert!(convo.is_in_flight());
}

#[test]
fn it_derives_idempotency_keys_from_session_and_text() {
    let mut blank = Conversation::new(Mode::Regular);
    let req = chat_request(blank.begin_send("hello"));
    assert!(req.idempotency_key.starts_with("new:hello:"));

    let mut active = Conversation::new(Mode::Regular);
    active.activate(Some("s-1".to_string()));
    let req = chat_request(active.begin_send("hello"));
    assert!(req.idempotency_key.starts_with("s-1:hello:"));
}

#[test]
fn it_ignores_blank_sends_outside_ocr_mode() {
    let mut convo = Conversation::new(Mode::Regular);
    assert!(convo.begin_send("   ").is_none());
    assert!(convo.messages.is_empty());
    assert!(!convo.is_in_flight());
}

#[test]
fn it_falls_back_to_the_default_ocr_question() {
    let mut convo = Conversation::new(Mode::Ocr);
    let outbound = convo.begin_send("");

    match outbound {
        Some(Outbound::OcrQa(req)) => {
            assert_eq!(req.question, DEFAULT_OCR_QUESTION);
        }
        _ => panic!("expected an OCR question"),
    }

    // Nothing the user typed, nothing to show.
    assert!(convo.messages.is_empty());
    assert!(convo.is_in_flight());
}

#[test]
fn it_sends_queued_images_with_local_refs() {
    let first = temp_image("first.png");
    let second = temp_image("second.png");

    let mut convo = Conversation::new(Mode::Ocr);
    convo.queue_image(first.clone()).unwrap();
    convo.queue_image(second.clone()).unwrap();

    let outbound = convo.begin_send("what are these");
    match outbound {
        Some(Outbound::Images(req)) => {
            assert_eq!(req.message, "what are these");
            assert_eq!(req.files, vec![first.clone(), second.clone()]);
        }
        _ => panic!("expected an image send"),
    }

    assert_eq!(
        convo.messages[0].images,
        vec![ImageRef::Local(first), ImageRef::Local(second)]
    );
    assert!(convo.queued_images().is_empty());
}

#[test]
fn it_rejects_a_fifth_queued_image() {
    let mut convo = Conversation::new(Mode::Ocr);
    for idx in 0..4 {
        convo.queue_image(temp_image(&format!("cap-{idx}.png"))).unwrap();
    }

    let res = convo.queue_image(temp_image("cap-4.png"));
    assert!(res.is_err());
    assert_eq!(convo.queued_images().len(), 4);

    // Dropping one frees a slot.
    convo.dequeue_image(3);
    assert!(convo.queue_image(temp_image("cap-5.png")).is_ok());
}

#[test]
fn it_rejects_unreadable_files_before_any_request() {
    let mut convo = Conversation::new(Mode::Ocr);
    let res = convo.queue_image(PathBuf::from("/definitely/not/here.png"));
    assert!(res.is_err());
    assert!(convo.queued_images().is_empty());
}

#[test]
fn it_applies_chat_replies_with_normalization_and_adoption() {
    let mut convo = Conversation::new(Mode::Regular);
    convo.begin_send("tea versus coffee");

    let adoption = convo.apply_chat_reply(ChatReply {
        session_id: "s-9".to_string(),
        title: Some("Tea talk".to_string()),
        text: "Sure!\n| A | B |\n| --- | --- |\n| 1 | 2 |\nThanks".to_string(),
    });

    let adoption = adoption.unwrap();
    assert_eq!(adoption.id, "s-9");
    assert_eq!(adoption.title, "Tea talk");
    assert_eq!(adoption.mode, Mode::Regular);

    assert_eq!(convo.session_id(), Some("s-9"));
    assert!(!convo.is_in_flight());
    assert_eq!(
        convo.messages.last().unwrap().text,
        "| A | B |\n| --- | --- |\n| 1 | 2 |"
    );
}

#[test]
fn it_skips_adoption_when_the_id_is_unchanged() {
    let mut convo = Conversation::new(Mode::Regular);
    convo.activate(Some("s-1".to_string()));
    convo.begin_send("hello");

    let adoption = convo.apply_chat_reply(ChatReply {
        session_id: "s-1".to_string(),
        title: Some("Greetings".to_string()),
        text: "hi".to_string(),
    });

    assert!(adoption.is_none());
    assert_eq!(convo.session_id(), Some("s-1"));
}

#[test]
fn it_renders_failures_as_error_bubbles() {
    let mut convo = Conversation::new(Mode::Regular);
    convo.begin_send("hello");
    convo.apply_send_failure("Server error");

    let bubble = convo.messages.last().unwrap();
    assert_eq!(bubble.author, Author::Bot);
    assert_eq!(bubble.message_type(), MessageType::Error);
    assert_eq!(bubble.text, "❌ Server error");
    assert!(!convo.is_in_flight());
}

#[test]
fn it_swaps_local_image_refs_for_server_urls() {
    let path = temp_image("swap.png");
    let mut convo = Conversation::new(Mode::Ocr);
    convo.queue_image(path).unwrap();
    convo.begin_send("read this");

    let adoption = convo.apply_images_reply(ImagesReply {
        session_id: "ocr-1".to_string(),
        title: None,
        text: "It is a receipt.".to_string(),
        attachments: vec!["http://localhost:8000/media/swap.png".to_string()],
    });

    assert_eq!(adoption.unwrap().title, "New chat");
    assert_eq!(
        convo.messages[0].images,
        vec![ImageRef::Remote("http://localhost:8000/media/swap.png".to_string())]
    );

    // Image answers skip the table heuristic.
    assert_eq!(convo.messages.last().unwrap().text, "It is a receipt.");
}

#[test]
fn it_discards_superseded_history_loads() {
    let mut convo = Conversation::new(Mode::Regular);
    convo.activate(Some("s-1".to_string()));

    let stale = convo.begin_history_load();
    convo.activate(Some("s-2".to_string()));
    let fresh = convo.begin_history_load();

    convo.apply_history(
        &stale,
        vec![HistoryRow {
            role: "user".to_string(),
            content: "old session".to_string(),
            attachments: vec![],
        }],
    );
    assert!(convo.messages.is_empty());

    convo.apply_history(
        &fresh,
        vec![HistoryRow {
            role: "user".to_string(),
            content: "new session".to_string(),
            attachments: vec![],
        }],
    );
    assert_eq!(convo.messages.len(), 1);
    assert_eq!(convo.messages[0].text, "new session");
}

#[test]
fn it_replays_history_stripping_hints_and_renormalizing() {
    let mut convo = Conversation::new(Mode::Regular);
    convo.activate(Some("s-1".to_string()));
    let token = convo.begin_history_load();

    let rows = vec![
        HistoryRow {
            role: "user".to_string(),
            content: tables::enhance("tea versus coffee"),
            attachments: vec![],
        },
        HistoryRow {
            role: "assistant".to_string(),
            content: "Gladly.\n| A | B |\n| --- | --- |\n| 1 | 2 |".to_string(),
            attachments: vec![],
        },
        HistoryRow {
            role: "user".to_string(),
            content: "thanks".to_string(),
            attachments: vec![],
        },
        HistoryRow {
            role: "assistant".to_string(),
            content: "Any time!".to_string(),
            attachments: vec![],
        },
    ];

    convo.apply_history(&token, rows);

    assert_eq!(convo.messages[0].text, "tea versus coffee");
    assert_eq!(convo.messages[1].text, "| A | B |\n| --- | --- |\n| 1 | 2 |");
    assert_eq!(convo.messages[2].text, "thanks");
    // The nearest preceding user row was not comparative.
    assert_eq!(convo.messages[3].text, "Any time!");
}

#[test]
fn it_maps_history_attachments_to_remote_refs() {
    let mut convo = Conversation::new(Mode::Ocr);
    convo.activate(Some("ocr-1".to_string()));
    let token = convo.begin_history_load();

    convo.apply_history(
        &token,
        vec![HistoryRow {
            role: "user".to_string(),
            content: "read this".to_string(),
            attachments: vec!["http://localhost:8000/media/a.png".to_string()],
        }],
    );

    assert_eq!(
        convo.messages[0].images,
        vec![ImageRef::Remote("http://localhost:8000/media/a.png".to_string())]
    );
}

#[test]
fn it_resets_on_mode_change() {
    let path = temp_image("reset.png");
    let mut convo = Conversation::new(Mode::Ocr);
    convo.queue_image(path).unwrap();
    convo.activate(Some("ocr-1".to_string()));
    convo.apply_chat_reply(ChatReply {
        session_id: "ocr-1".to_string(),
        title: None,
        text: "hello".to_string(),
    });

    convo.set_mode(Mode::Regular);

    assert!(convo.messages.is_empty());
    assert!(convo.queued_images().is_empty());
    assert_eq!(convo.mode(), Mode::Regular);
}
