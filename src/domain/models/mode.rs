#[cfg(test)]
#[path = "mode_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;

/// Operating profile of the backend. Each session is tagged with the mode it
/// was created under, and the sidebar only shows sessions for the current
/// mode.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, EnumIter, EnumVariantNames, strum::Display,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Regular,
    Uncensored,
    Ocr,
}

impl Mode {
    pub fn parse(text: &str) -> Option<Mode> {
        match text.trim().to_lowercase().as_str() {
            "regular" => return Some(Mode::Regular),
            "uncensored" => return Some(Mode::Uncensored),
            "ocr" => return Some(Mode::Ocr),
            _ => return None,
        }
    }

    /// The next mode in the cycle order used by the mode hotkey.
    pub fn next(self) -> Mode {
        match self {
            Mode::Regular => return Mode::Uncensored,
            Mode::Uncensored => return Mode::Ocr,
            Mode::Ocr => return Mode::Regular,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::Regular => return "🤖 Regular",
            Mode::Uncensored => return "🔥 Uncensored",
            Mode::Ocr => return "📄 OCR + Ask",
        }
    }
}
