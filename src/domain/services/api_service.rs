#[cfg(test)]
#[path = "api_service_test.rs"]
mod tests;

use anyhow::Result;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::domain::models::Action;
use crate::domain::models::Author;
use crate::domain::models::ChatRequest;
use crate::domain::models::Event;
use crate::domain::models::ImagesRequest;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Mode;
use crate::domain::models::OcrQaRequest;
use crate::infrastructure::api::ApiError;
use crate::infrastructure::api::ChatClient;

const BUSY_NOTICE: &str = "⏳ The model is busy. Retrying once…";

fn failure_notice(context: &str, err: &ApiError) -> Message {
    return Message::new_with_type(
        Author::Bot,
        MessageType::Error,
        &format!("❌ {context}: {err}"),
    );
}

/// Chat sends get exactly one automatic retry on 429, reusing the identical
/// payload and idempotency key so the server can dedupe. Any other failure,
/// and any failure of the retry itself, lands as an error bubble.
async fn send_chat(
    client: &ChatClient,
    req: ChatRequest,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.chat(&req).await {
        Ok(reply) => {
            tx.send(Event::ChatReply(reply))?;
        }
        Err(ApiError::RateLimited { retry_after }) => {
            tracing::warn!(wait = ?retry_after, "chat rate limited, retrying once");
            tx.send(Event::WorkerNotice(Message::new(Author::Bot, BUSY_NOTICE)))?;
            tokio::time::sleep(retry_after).await;

            match client.chat(&req).await {
                Ok(reply) => {
                    tx.send(Event::ChatReply(reply))?;
                }
                Err(err) => {
                    tracing::error!(error = ?err, "chat retry failed");
                    tx.send(Event::SendFailed(err.to_string()))?;
                }
            }
        }
        Err(err) => {
            tracing::error!(error = ?err, "chat request failed");
            tx.send(Event::SendFailed(err.to_string()))?;
        }
    }

    return Ok(());
}

/// OCR questions have no retry; their rate limits surface directly.
async fn send_ocr_qa(
    client: &ChatClient,
    req: OcrQaRequest,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.ocr_qa(&req).await {
        Ok(reply) => {
            tx.send(Event::ChatReply(reply))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "ocr question failed");
            tx.send(Event::SendFailed(err.to_string()))?;
        }
    }

    return Ok(());
}

async fn send_images(
    client: &ChatClient,
    req: ImagesRequest,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.chat_with_images(&req).await {
        Ok(reply) => {
            tx.send(Event::ImagesReply(reply))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "image send failed");
            tx.send(Event::SendFailed(err.to_string()))?;
        }
    }

    return Ok(());
}

/// Loads a session's history unless the token was cancelled first. A
/// cancelled load emits nothing at all; the controller additionally checks
/// the token before applying rows, so stale results can never land.
async fn load_history(
    client: &ChatClient,
    session_id: String,
    mode: Mode,
    token: CancellationToken,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    let rows = tokio::select! {
        biased;
        _ = token.cancelled() => {
            tracing::debug!(session_id, "history load superseded");
            return Ok(());
        }
        res = client.history(&session_id, mode) => {
            match res {
                Ok(rows) => rows,
                Err(err) => {
                    tracing::error!(error = ?err, session_id, "history load failed");
                    tx.send(Event::WorkerNotice(failure_notice("Failed to load history", &err)))?;
                    return Ok(());
                }
            }
        }
    };

    tx.send(Event::HistoryLoaded {
        session_id,
        token,
        rows,
    })?;

    return Ok(());
}

async fn fetch_sessions(
    client: &ChatClient,
    mode: Mode,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.list_sessions(Some(mode)).await {
        Ok(sessions) => {
            tx.send(Event::SessionsLoaded(sessions))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "session list fetch failed");
        }
    }

    return Ok(());
}

async fn create_session(
    client: &ChatClient,
    mode: Mode,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.create_session(mode).await {
        Ok(id) => {
            tx.send(Event::SessionCreated { id, mode })?;
        }
        Err(err) => {
            tracing::error!(error = ?err, "session create failed");
            tx.send(Event::WorkerNotice(failure_notice("Failed to create a chat", &err)))?;
        }
    }

    return Ok(());
}

async fn rename_session(
    client: &ChatClient,
    id: String,
    title: String,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.rename_session(&id, &title).await {
        Ok(()) => {
            tx.send(Event::SessionRenamed { id, title })?;
        }
        Err(err) => {
            tracing::error!(error = ?err, id, "session rename failed");
            tx.send(Event::WorkerNotice(failure_notice("Failed to rename", &err)))?;
        }
    }

    return Ok(());
}

async fn delete_session(
    client: &ChatClient,
    id: String,
    tx: &mpsc::UnboundedSender<Event>,
) -> Result<()> {
    match client.delete_session(&id).await {
        Ok(()) => {
            tx.send(Event::SessionDeleted(id))?;
        }
        Err(err) => {
            tracing::error!(error = ?err, id, "session delete failed");
            tx.send(Event::WorkerNotice(failure_notice("Failed to delete", &err)))?;
        }
    }

    return Ok(());
}

pub struct ApiService {}

impl ApiService {
    /// Worker loop between the shell and the backend. Sends and history
    /// loads run on their own tasks so a slow model reply or a retry wait
    /// never blocks sidebar operations.
    pub async fn start(
        client: ChatClient,
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        loop {
            let action = rx.recv().await;
            if action.is_none() {
                return Ok(());
            }

            match action.unwrap() {
                Action::SendChat(req) => {
                    let client = client.clone();
                    let worker_tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = send_chat(&client, req, &worker_tx).await {
                            tracing::error!(error = ?err, "chat worker lost its channel");
                        }
                    });
                }
                Action::SendOcrQa(req) => {
                    let client = client.clone();
                    let worker_tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = send_ocr_qa(&client, req, &worker_tx).await {
                            tracing::error!(error = ?err, "ocr worker lost its channel");
                        }
                    });
                }
                Action::SendImages(req) => {
                    let client = client.clone();
                    let worker_tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) = send_images(&client, req, &worker_tx).await {
                            tracing::error!(error = ?err, "image worker lost its channel");
                        }
                    });
                }
                Action::LoadHistory {
                    session_id,
                    mode,
                    token,
                } => {
                    let client = client.clone();
                    let worker_tx = tx.clone();
                    tokio::spawn(async move {
                        if let Err(err) =
                            load_history(&client, session_id, mode, token, &worker_tx).await
                        {
                            tracing::error!(error = ?err, "history worker lost its channel");
                        }
                    });
                }
                Action::FetchSessions(mode) => {
                    fetch_sessions(&client, mode, &tx).await?;
                }
                Action::CreateSession(mode) => {
                    create_session(&client, mode, &tx).await?;
                }
                Action::RenameSession { id, title } => {
                    rename_session(&client, id, title, &tx).await?;
                }
                Action::DeleteSession(id) => {
                    delete_session(&client, id, &tx).await?;
                }
            }
        }
    }
}
