#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use std::path::PathBuf;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tokio_util::sync::CancellationToken;

use super::tables;
use crate::domain::models::Author;
use crate::domain::models::ChatReply;
use crate::domain::models::ChatRequest;
use crate::domain::models::HistoryRow;
use crate::domain::models::ImageRef;
use crate::domain::models::ImagesReply;
use crate::domain::models::ImagesRequest;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Mode;
use crate::domain::models::OcrQaRequest;
use crate::domain::models::Outbound;

pub const DEFAULT_OCR_QUESTION: &str = "Give a concise summary and extract key values (important dates, totals, names, addresses, emails, phone numbers).";

const ERROR_GLYPH: &str = "❌";
const MAX_QUEUED_IMAGES: usize = 4;
const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Emitted when the server assigned a new session id to this conversation.
/// The shell fans this single event out to the sidebar store, the active
/// session pointer and the persisted state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionAdoption {
    pub id: String,
    pub title: String,
    pub mode: Mode,
}

fn idempotency_key(session_id: Option<&str>, text: &str) -> String {
    // Coarse ~4s bucket so a rapid double submit dedupes server-side while a
    // deliberate repeat later goes through.
    let bucket = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|e| return e.as_millis() >> 12)
        .unwrap_or(0);

    return format!("{}:{}:{bucket}", session_id.unwrap_or("new"), text);
}

/// Transcript and send state for the active session. Blank until the first
/// send or an explicit create assigns a server id; active until the id or the
/// mode changes. The HTTP legs run in the API worker; this type decides what
/// goes out and how replies land.
pub struct Conversation {
    pub messages: Vec<Message>,
    session_id: Option<String>,
    mode: Mode,
    in_flight: bool,
    last_question: String,
    queued_images: Vec<PathBuf>,
    history_token: Option<CancellationToken>,
}

impl Conversation {
    pub fn new(mode: Mode) -> Conversation {
        return Conversation {
            messages: vec![],
            session_id: None,
            mode,
            in_flight: false,
            last_question: String::new(),
            queued_images: vec![],
            history_token: None,
        };
    }

    pub fn session_id(&self) -> Option<&str> {
        return self.session_id.as_deref();
    }

    pub fn mode(&self) -> Mode {
        return self.mode;
    }

    pub fn is_in_flight(&self) -> bool {
        return self.in_flight;
    }

    pub fn queued_images(&self) -> &[PathBuf] {
        return &self.queued_images;
    }

    /// Switches the active session. Returns true when the id actually
    /// changed, in which case the transcript was reset and the shell should
    /// kick off a history load for the new id.
    pub fn activate(&mut self, session_id: Option<String>) -> bool {
        if self.session_id == session_id {
            return false;
        }

        if let Some(token) = self.history_token.take() {
            token.cancel();
        }

        self.session_id = session_id;
        self.messages.clear();
        self.last_question.clear();
        self.queued_images.clear();
        return true;
    }

    /// Accepts a send, or returns None when one is already in flight (repeat
    /// key presses while waiting must not issue a second request). The user
    /// bubble is appended optimistically before any network traffic.
    pub fn begin_send(&mut self, raw: &str) -> Option<Outbound> {
        if self.in_flight {
            return None;
        }

        let raw = raw.trim();
        if self.mode == Mode::Ocr && !self.queued_images.is_empty() {
            return self.begin_send_images(raw);
        }

        if self.mode == Mode::Ocr {
            let question = if raw.is_empty() { DEFAULT_OCR_QUESTION } else { raw };
            self.last_question = question.to_string();
            if !raw.is_empty() {
                self.messages.push(Message::new(Author::User, raw));
            }

            self.in_flight = true;
            return Some(Outbound::OcrQa(OcrQaRequest {
                question: tables::enhance(question),
                session_id: self.session_id.clone(),
            }));
        }

        if raw.is_empty() {
            return None;
        }

        self.last_question = raw.to_string();
        self.messages.push(Message::new(Author::User, raw));
        self.in_flight = true;

        return Some(Outbound::Chat(ChatRequest {
            message: tables::enhance(raw),
            mode: self.mode,
            session_id: self.session_id.clone(),
            idempotency_key: idempotency_key(self.session_id.as_deref(), raw),
        }));
    }

    fn begin_send_images(&mut self, raw: &str) -> Option<Outbound> {
        if self.in_flight || self.mode != Mode::Ocr || self.queued_images.is_empty() {
            return None;
        }

        let message = if raw.is_empty() { "Analyze these images" } else { raw };
        self.last_question = message.to_string();

        let files = std::mem::take(&mut self.queued_images);
        self.messages.push(Message::new_with_images(
            Author::User,
            message,
            files
                .iter()
                .map(|e| return ImageRef::Local(e.clone()))
                .collect(),
        ));

        self.in_flight = true;
        return Some(Outbound::Images(ImagesRequest {
            message: message.to_string(),
            session_id: self.session_id.clone(),
            files,
        }));
    }

    /// Queues an image for the next OCR send. Validation happens here so an
    /// oversized file is rejected with a message before any request exists.
    pub fn queue_image(&mut self, path: PathBuf) -> Result<(), String> {
        if self.mode != Mode::Ocr {
            return Err("Images can only be sent in OCR mode.".to_string());
        }
        if self.queued_images.len() >= MAX_QUEUED_IMAGES {
            return Err(format!("Max {MAX_QUEUED_IMAGES} images per message."));
        }

        let meta = std::fs::metadata(&path)
            .map_err(|_| return format!("Could not read {}.", path.to_string_lossy()))?;
        if meta.len() > MAX_UPLOAD_BYTES {
            return Err("That file is too large to upload (10MB max).".to_string());
        }

        self.queued_images.push(path);
        return Ok(());
    }

    pub fn dequeue_image(&mut self, index: usize) {
        if index < self.queued_images.len() {
            self.queued_images.remove(index);
        }
    }

    /// Lands a chat (or OCR question) reply: normalizes the text against the
    /// original question's comparative-ness, appends the bot bubble, and
    /// adopts a server-assigned session id.
    pub fn apply_chat_reply(&mut self, reply: ChatReply) -> Option<SessionAdoption> {
        self.in_flight = false;

        let text = tables::normalize(&reply.text, tables::looks_comparative(&self.last_question));
        self.messages.push(Message::new(Author::Bot, &text));

        return self.adopt(reply.session_id, reply.title);
    }

    /// Lands an image-send reply. The optimistic bubble's local image
    /// references are swapped for the persisted server URLs, and the answer
    /// is appended untouched: image answers skip the table heuristic.
    pub fn apply_images_reply(&mut self, reply: ImagesReply) -> Option<SessionAdoption> {
        self.in_flight = false;

        if !reply.attachments.is_empty() {
            let saved = reply
                .attachments
                .iter()
                .map(|e| return ImageRef::Remote(e.to_string()))
                .collect::<Vec<ImageRef>>();

            if let Some(bubble) = self
                .messages
                .iter_mut()
                .rev()
                .find(|e| return e.author == Author::User && !e.images.is_empty())
            {
                bubble.replace_images(saved);
            }
        }

        self.messages.push(Message::new(Author::Bot, &reply.text));
        return self.adopt(reply.session_id, reply.title);
    }

    pub fn apply_send_failure(&mut self, error: &str) {
        self.in_flight = false;
        self.push_error(error);
    }

    pub fn push_error(&mut self, error: &str) {
        self.messages.push(Message::new_with_type(
            Author::Bot,
            MessageType::Error,
            &format!("{ERROR_GLYPH} {error}"),
        ));
    }

    /// Notices from the worker, e.g. the transient busy bubble while a 429
    /// retry waits. The in-flight guard stays up for the whole retry cycle.
    pub fn push_notice(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Starts a history load, cancelling whatever load was still in flight.
    /// The returned token travels with the request and comes back with the
    /// rows; `apply_history` drops results whose token was cancelled, so a
    /// stale load can never clobber a newer session's transcript.
    pub fn begin_history_load(&mut self) -> CancellationToken {
        if let Some(previous) = self.history_token.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        self.history_token = Some(token.clone());
        return token;
    }

    pub fn apply_history(&mut self, token: &CancellationToken, rows: Vec<HistoryRow>) {
        if token.is_cancelled() {
            return;
        }

        let mut replayed: Vec<Message> = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let images = row
                .attachments
                .iter()
                .map(|e| return ImageRef::Remote(e.to_string()))
                .collect::<Vec<ImageRef>>();

            if row.is_user() {
                // The instruction suffix was appended on send; the user never
                // typed it, so it never renders.
                let text = tables::strip_hint(&row.content);
                replayed.push(Message::new_with_images(Author::User, &text, images));
                continue;
            }

            let question = rows[..idx]
                .iter()
                .rev()
                .find(|e| return e.is_user())
                .map(|e| return tables::strip_hint(&e.content))
                .unwrap_or_default();

            let text = tables::normalize(&row.content, tables::looks_comparative(&question));
            replayed.push(Message::new_with_images(Author::Bot, &text, images));
        }

        self.messages = replayed;
    }

    /// Clears everything tied to the previous mode: transcript, queued
    /// images, and the comparative memo. The shell decides where to navigate.
    pub fn set_mode(&mut self, mode: Mode) {
        if self.mode == mode {
            return;
        }

        if let Some(token) = self.history_token.take() {
            token.cancel();
        }

        self.mode = mode;
        self.messages.clear();
        self.last_question.clear();
        self.queued_images.clear();
    }

    fn adopt(&mut self, id: String, title: Option<String>) -> Option<SessionAdoption> {
        if self.session_id.as_deref() == Some(id.as_str()) {
            return None;
        }

        self.session_id = Some(id.to_string());
        return Some(SessionAdoption {
            id,
            title: title.unwrap_or_else(|| return "New chat".to_string()),
            mode: self.mode,
        });
    }
}
