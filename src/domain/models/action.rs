use tokio_util::sync::CancellationToken;

use super::ChatRequest;
use super::ImagesRequest;
use super::Mode;
use super::OcrQaRequest;

/// Work the shell hands to the API worker loop.
pub enum Action {
    SendChat(ChatRequest),
    SendOcrQa(OcrQaRequest),
    SendImages(ImagesRequest),
    LoadHistory {
        session_id: String,
        mode: Mode,
        token: CancellationToken,
    },
    FetchSessions(Mode),
    CreateSession(Mode),
    RenameSession {
        id: String,
        title: String,
    },
    DeleteSession(String),
}
