use std::path::PathBuf;

use super::Mode;

/// Payload for `POST /api/chat/`. `message` already carries the table
/// instruction suffix when the question looked comparative; the transcript
/// shows the raw text the user typed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
    pub mode: Mode,
    pub session_id: Option<String>,
    pub idempotency_key: String,
}

/// Payload for `POST /api/ocr-qa/`, the text-only question flow in OCR mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrQaRequest {
    pub question: String,
    pub session_id: Option<String>,
}

/// Payload for the multipart `POST /api/gemini-with-images/` flow.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagesRequest {
    pub message: String,
    pub session_id: Option<String>,
    pub files: Vec<PathBuf>,
}

/// What a send turns into once the conversation controller accepted it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outbound {
    Chat(ChatRequest),
    OcrQa(OcrQaRequest),
    Images(ImagesRequest),
}
