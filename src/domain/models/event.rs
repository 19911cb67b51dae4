use tokio_util::sync::CancellationToken;

use super::ChatReply;
use super::HistoryRow;
use super::ImagesReply;
use super::Message;
use super::Mode;
use super::SessionSummary;

/// Results the API worker (and the timer service) push back to the shell.
/// Session lifecycle changes always arrive here so the store, the active
/// session pointer and the persisted state update from a single place.
pub enum Event {
    ChatReply(ChatReply),
    ImagesReply(ImagesReply),
    SendFailed(String),
    WorkerNotice(Message),
    HistoryLoaded {
        session_id: String,
        token: CancellationToken,
        rows: Vec<HistoryRow>,
    },
    SessionsLoaded(Vec<SessionSummary>),
    SessionCreated {
        id: String,
        mode: Mode,
    },
    SessionRenamed {
        id: String,
        title: String,
    },
    SessionDeleted(String),
    RenameFlagExpired(String),
}
