#[cfg(test)]
#[path = "client_test.rs"]
mod tests;

use std::path::Path;
use std::time::Duration;

use reqwest::multipart;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ApiError;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatRequest;
use crate::domain::models::HistoryRow;
use crate::domain::models::ImagesReply;
use crate::domain::models::ImagesRequest;
use crate::domain::models::Mode;
use crate::domain::models::OcrExtract;
use crate::domain::models::OcrQaRequest;
use crate::domain::models::SessionSummary;

const DEFAULT_RETRY_AFTER_SECS: f64 = 2.0;

#[derive(Serialize)]
struct ChatBody<'a> {
    message: &'a str,
    mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Serialize)]
struct OcrQaBody<'a> {
    question: &'a str,
    mode: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    session_id: Option<&'a str>,
}

#[derive(Serialize)]
struct NewSessionBody {
    mode: String,
}

#[derive(Serialize)]
struct RenameBody<'a> {
    title: &'a str,
}

#[derive(Deserialize)]
struct SessionRow {
    session_id: String,
    title: Option<String>,
    mode: Option<String>,
}

#[derive(Deserialize)]
struct CreatedBody {
    session_id: String,
}

#[derive(Deserialize)]
struct ChatResponseBody {
    response: Option<String>,
    reply: Option<String>,
    session_id: String,
    title: Option<String>,
}

#[derive(Deserialize)]
struct AttachmentRow {
    url: String,
}

#[derive(Deserialize)]
struct HistoryRowBody {
    role: String,
    content: Option<String>,
    #[serde(default)]
    attachments: Vec<AttachmentRow>,
}

#[derive(Deserialize)]
struct HistoryBody {
    #[serde(default)]
    history: Vec<HistoryRowBody>,
}

#[derive(Deserialize)]
struct ImagesBody {
    response: String,
    session_id: String,
    title: Option<String>,
    #[serde(default)]
    attachments: Vec<AttachmentRow>,
}

#[derive(Deserialize)]
struct OcrQaResponseBody {
    answer: String,
    session_id: String,
}

#[derive(Deserialize)]
struct OcrFileBody {
    text: String,
    session_id: String,
}

#[derive(Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    retry_after: Option<f64>,
}

fn mime_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| return e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => return "image/png",
        "jpg" | "jpeg" => return "image/jpeg",
        "webp" => return "image/webp",
        "pdf" => return "application/pdf",
        "txt" => return "text/plain",
        _ => return "application/octet-stream",
    }
}

/// One method per Conversa chat endpoint. Wire shapes stay private here;
/// callers get the domain reply types with attachment paths already resolved
/// against the backend base.
#[derive(Clone)]
pub struct ChatClient {
    url: String,
    client: reqwest::Client,
}

impl Default for ChatClient {
    fn default() -> ChatClient {
        return ChatClient::with_url(Config::get(ConfigKey::ApiBaseURL));
    }
}

impl ChatClient {
    pub fn with_url(url: String) -> ChatClient {
        return ChatClient {
            url: url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        };
    }

    fn absolutize(&self, url: &str) -> String {
        if url.starts_with("http") {
            return url.to_string();
        }

        return format!("{}{url}", self.url);
    }

    async fn error_for(res: reqwest::Response) -> ApiError {
        let status = res.status().as_u16();
        let body = res.json::<ErrorBody>().await.unwrap_or_default();

        if status == 429 {
            let secs = body.retry_after.unwrap_or(DEFAULT_RETRY_AFTER_SECS);
            return ApiError::RateLimited {
                retry_after: Duration::from_secs_f64(secs.max(0.0)),
            };
        }

        return ApiError::Api {
            status,
            message: body.error.unwrap_or_else(|| return "Server error".to_string()),
        };
    }

    pub async fn list_sessions(&self, mode: Option<Mode>) -> Result<Vec<SessionSummary>, ApiError> {
        let mut req = self.client.get(format!("{url}/api/sessions/", url = self.url));
        if let Some(mode) = mode {
            req = req.query(&[("mode", mode.to_string())]);
        }

        let res = req.send().await?;
        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let rows = res.json::<Vec<SessionRow>>().await?;
        let sessions = rows
            .iter()
            .map(|row| {
                return SessionSummary::new(
                    &row.session_id,
                    row.title.as_deref().unwrap_or("New chat"),
                    row.mode
                        .as_deref()
                        .and_then(Mode::parse)
                        .unwrap_or_default(),
                );
            })
            .collect();

        return Ok(sessions);
    }

    pub async fn create_session(&self, mode: Mode) -> Result<String, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/sessions/new/", url = self.url))
            .json(&NewSessionBody {
                mode: mode.to_string(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        return Ok(res.json::<CreatedBody>().await?.session_id);
    }

    pub async fn rename_session(&self, id: &str, title: &str) -> Result<(), ApiError> {
        let res = self
            .client
            .put(format!("{url}/api/sessions/{id}/rename/", url = self.url))
            .json(&RenameBody { title })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        return Ok(());
    }

    pub async fn delete_session(&self, id: &str) -> Result<(), ApiError> {
        let res = self
            .client
            .delete(format!("{url}/api/sessions/{id}/delete/", url = self.url))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        return Ok(());
    }

    pub async fn history(&self, session_id: &str, mode: Mode) -> Result<Vec<HistoryRow>, ApiError> {
        let res = self
            .client
            .get(format!("{url}/api/history/", url = self.url))
            .query(&[("session_id", session_id.to_string()), ("mode", mode.to_string())])
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let body = res.json::<HistoryBody>().await?;
        let rows = body
            .history
            .iter()
            .map(|row| {
                return HistoryRow {
                    role: row.role.to_string(),
                    content: row.content.clone().unwrap_or_default(),
                    attachments: row
                        .attachments
                        .iter()
                        .map(|e| return self.absolutize(&e.url))
                        .collect(),
                };
            })
            .collect();

        return Ok(rows);
    }

    pub async fn chat(&self, req: &ChatRequest) -> Result<ChatReply, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/chat/", url = self.url))
            .header("Idempotency-Key", &req.idempotency_key)
            .json(&ChatBody {
                message: &req.message,
                mode: req.mode.to_string(),
                session_id: req.session_id.as_deref(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let body = res.json::<ChatResponseBody>().await?;
        return Ok(ChatReply {
            session_id: body.session_id,
            title: body.title,
            text: body.reply.or(body.response).unwrap_or_default(),
        });
    }

    pub async fn ocr_qa(&self, req: &OcrQaRequest) -> Result<ChatReply, ApiError> {
        let res = self
            .client
            .post(format!("{url}/api/ocr-qa/", url = self.url))
            .json(&OcrQaBody {
                question: &req.question,
                mode: "ocr",
                session_id: req.session_id.as_deref(),
            })
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let body = res.json::<OcrQaResponseBody>().await?;
        return Ok(ChatReply {
            session_id: body.session_id,
            title: None,
            text: body.answer,
        });
    }

    pub async fn chat_with_images(&self, req: &ImagesRequest) -> Result<ImagesReply, ApiError> {
        let mut form = multipart::Form::new()
            .text("message", req.message.to_string())
            .text("mode", Mode::Ocr.to_string());
        if let Some(session_id) = &req.session_id {
            form = form.text("session_id", session_id.to_string());
        }

        for path in &req.files {
            form = form.part("images", ChatClient::file_part(path).await?);
        }

        let res = self
            .client
            .post(format!("{url}/api/gemini-with-images/", url = self.url))
            .multipart(form)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let body = res.json::<ImagesBody>().await?;
        return Ok(ImagesReply {
            session_id: body.session_id,
            title: body.title,
            text: body.response,
            attachments: body
                .attachments
                .iter()
                .map(|e| return self.absolutize(&e.url))
                .collect(),
        });
    }

    pub async fn ocr_file(
        &self,
        path: &Path,
        session_id: Option<&str>,
    ) -> Result<OcrExtract, ApiError> {
        let mut form = multipart::Form::new()
            .text("mode", Mode::Ocr.to_string())
            .part("file", ChatClient::file_part(path).await?);
        if let Some(session_id) = session_id {
            form = form.text("session_id", session_id.to_string());
        }

        let res = self
            .client
            .post(format!("{url}/api/ocr/", url = self.url))
            .multipart(form)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(ChatClient::error_for(res).await);
        }

        let body = res.json::<OcrFileBody>().await?;
        return Ok(OcrExtract {
            session_id: body.session_id,
            text: body.text,
        });
    }

    async fn file_part(path: &Path) -> Result<multipart::Part, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|e| return e.to_string_lossy().to_string())
            .unwrap_or_else(|| return "upload".to_string());

        let part = multipart::Part::bytes(bytes)
            .file_name(name)
            .mime_str(mime_for(path))
            .map_err(ApiError::Transport)?;

        return Ok(part);
    }
}
