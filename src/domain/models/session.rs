use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Mode;

/// A sidebar row. `just_renamed` drives the title typing animation and is
/// never persisted; the rename-expiry timer clears it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
    pub mode: Mode,
    #[serde(skip)]
    pub just_renamed: bool,
}

impl SessionSummary {
    pub fn new(id: &str, title: &str, mode: Mode) -> SessionSummary {
        return SessionSummary {
            id: id.to_string(),
            title: title.to_string(),
            mode,
            just_renamed: false,
        };
    }
}

/// A shallow-merge patch for the store. Fields left as `None` keep whatever
/// the existing entry holds.
#[derive(Clone, Debug)]
pub struct SessionPatch {
    pub id: String,
    pub title: Option<String>,
    pub mode: Option<Mode>,
}

impl SessionPatch {
    pub fn new(id: &str, title: Option<&str>, mode: Option<Mode>) -> SessionPatch {
        return SessionPatch {
            id: id.to_string(),
            title: title.map(|e| return e.to_string()),
            mode,
        };
    }
}
