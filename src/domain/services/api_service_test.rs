use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::create_session;
use super::delete_session;
use super::fetch_sessions;
use super::load_history;
use super::rename_session;
use super::send_chat;
use super::send_ocr_qa;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::Mode;
use crate::domain::models::OcrQaRequest;
use crate::infrastructure::api::ChatClient;

fn chat_request() -> ChatRequest {
    return ChatRequest {
        message: "hello".to_string(),
        mode: Mode::Regular,
        session_id: Some("s-1".to_string()),
        idempotency_key: "s-1:hello:42".to_string(),
    };
}

#[tokio::test]
async fn it_forwards_successful_chat_replies() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat/")
        .with_status(200)
        .with_body(r#"{"response": "Hi!", "session_id": "s-1"}"#)
        .expect(1)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    send_chat(&client, chat_request(), &tx).await?;

    mock.assert();
    match rx.recv().await.unwrap() {
        Event::ChatReply(reply) => assert_eq!(reply.text, "Hi!"),
        _ => bail!("expected a chat reply"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_retries_a_429_exactly_once_with_the_same_key() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat/")
        .match_header("idempotency-key", "s-1:hello:42")
        .with_status(429)
        .with_body(r#"{"error": "Rate limited", "retry_after": 0}"#)
        .expect(2)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    send_chat(&client, chat_request(), &tx).await?;

    // Exactly two requests: the original and one retry, both with the same
    // idempotency key. A second 429 falls through to the error bubble.
    mock.assert();

    match rx.recv().await.unwrap() {
        Event::WorkerNotice(notice) => assert!(notice.text.starts_with('⏳')),
        _ => bail!("expected the busy notice first"),
    }
    match rx.recv().await.unwrap() {
        Event::SendFailed(_) => {}
        _ => bail!("expected the send to fail after the retry"),
    }
    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_fails_other_statuses_without_retrying() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat/")
        .with_status(500)
        .with_body(r#"{"error": "Model exploded"}"#)
        .expect(1)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    send_chat(&client, chat_request(), &tx).await?;

    mock.assert();
    match rx.recv().await.unwrap() {
        Event::SendFailed(text) => assert_eq!(text, "Model exploded"),
        _ => bail!("expected a send failure"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_does_not_retry_ocr_questions() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/ocr-qa/")
        .with_status(429)
        .with_body(r#"{"error": "Rate limited", "retry_after": 0}"#)
        .expect(1)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    send_ocr_qa(
        &client,
        OcrQaRequest {
            question: "what is this".to_string(),
            session_id: None,
        },
        &tx,
    )
    .await?;

    mock.assert();
    match rx.recv().await.unwrap() {
        Event::SendFailed(_) => {}
        _ => bail!("expected a send failure with no retry"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_loads_history_rows() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/history/?session_id=s-1&mode=regular")
        .with_status(200)
        .with_body(r#"{"history": [{"role": "user", "content": "hello"}]}"#)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    let token = CancellationToken::new();
    load_history(&client, "s-1".to_string(), Mode::Regular, token, &tx).await?;

    mock.assert();
    match rx.recv().await.unwrap() {
        Event::HistoryLoaded { session_id, rows, .. } => {
            assert_eq!(session_id, "s-1");
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].content, "hello");
        }
        _ => bail!("expected history rows"),
    }

    return Ok(());
}

#[tokio::test]
async fn it_drops_cancelled_history_loads() -> Result<()> {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/history/?session_id=s-1&mode=regular")
        .with_status(200)
        .with_body(r#"{"history": []}"#)
        .expect(0)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());
    let token = CancellationToken::new();
    token.cancel();
    load_history(&client, "s-1".to_string(), Mode::Regular, token, &tx).await?;

    mock.assert();
    assert!(rx.try_recv().is_err());

    return Ok(());
}

#[tokio::test]
async fn it_fetches_and_manages_sessions() -> Result<()> {
    let mut server = mockito::Server::new();
    let list = server
        .mock("GET", "/api/sessions/?mode=regular")
        .with_status(200)
        .with_body(r#"[{"session_id": "s-1", "title": "First", "mode": "regular"}]"#)
        .create();
    let create = server
        .mock("POST", "/api/sessions/new/")
        .with_status(200)
        .with_body(r#"{"session_id": "s-2"}"#)
        .create();
    let rename = server
        .mock("PUT", "/api/sessions/s-2/rename/")
        .with_status(200)
        .with_body(r#"{"session_id": "s-2", "title": "Named"}"#)
        .create();
    let delete = server
        .mock("DELETE", "/api/sessions/s-2/delete/")
        .with_status(200)
        .with_body(r#"{"deleted": "s-2"}"#)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
    let client = ChatClient::with_url(server.url());

    fetch_sessions(&client, Mode::Regular, &tx).await?;
    create_session(&client, Mode::Regular, &tx).await?;
    rename_session(&client, "s-2".to_string(), "Named".to_string(), &tx).await?;
    delete_session(&client, "s-2".to_string(), &tx).await?;

    list.assert();
    create.assert();
    rename.assert();
    delete.assert();

    match rx.recv().await.unwrap() {
        Event::SessionsLoaded(sessions) => assert_eq!(sessions[0].id, "s-1"),
        _ => bail!("expected the session list"),
    }
    match rx.recv().await.unwrap() {
        Event::SessionCreated { id, mode } => {
            assert_eq!(id, "s-2");
            assert_eq!(mode, Mode::Regular);
        }
        _ => bail!("expected the created session"),
    }
    match rx.recv().await.unwrap() {
        Event::SessionRenamed { id, title } => {
            assert_eq!(id, "s-2");
            assert_eq!(title, "Named");
        }
        _ => bail!("expected the rename ack"),
    }
    match rx.recv().await.unwrap() {
        Event::SessionDeleted(id) => assert_eq!(id, "s-2"),
        _ => bail!("expected the delete ack"),
    }

    return Ok(());
}
