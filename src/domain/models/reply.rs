/// Server answer for the chat and OCR question endpoints, reduced to what the
/// conversation controller needs. OCR answers carry no title.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatReply {
    pub session_id: String,
    pub title: Option<String>,
    pub text: String,
}

/// Server answer for the image send; `attachments` are absolute URLs of the
/// persisted uploads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagesReply {
    pub session_id: String,
    pub title: Option<String>,
    pub text: String,
    pub attachments: Vec<String>,
}

/// One row of `GET /api/history/`, attachment paths already resolved against
/// the backend base URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRow {
    pub role: String,
    pub content: String,
    pub attachments: Vec<String>,
}

impl HistoryRow {
    pub fn is_user(&self) -> bool {
        return self.role == "user";
    }
}

/// Result of the one-shot `POST /api/ocr/` file extraction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OcrExtract {
    pub session_id: String,
    pub text: String,
}
