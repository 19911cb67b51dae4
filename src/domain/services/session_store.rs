#[cfg(test)]
#[path = "session_store_test.rs"]
mod tests;

use crate::domain::models::Mode;
use crate::domain::models::SessionPatch;
use crate::domain::models::SessionSummary;

const TITLE_MAX_CHARS: usize = 60;

fn clamp_title(title: &str) -> String {
    let title = title.trim();
    if title.is_empty() {
        return "New chat".to_string();
    }

    if title.chars().count() <= TITLE_MAX_CHARS {
        return title.to_string();
    }

    let mut clamped = title
        .chars()
        .take(TITLE_MAX_CHARS - 1)
        .collect::<String>();
    clamped.push('…');
    return clamped;
}

/// Ordered collection of session summaries backing the sidebar. Upserts keep
/// an entry's position; unknown ids are prepended. Invariant: at most one
/// entry per id.
#[derive(Default)]
pub struct SessionStore {
    entries: Vec<SessionSummary>,
}

impl SessionStore {
    pub fn upsert(&mut self, patch: SessionPatch) {
        if let Some(existing) = self.entries.iter_mut().find(|e| return e.id == patch.id) {
            if let Some(title) = patch.title {
                existing.title = clamp_title(&title);
            }
            if let Some(mode) = patch.mode {
                existing.mode = mode;
            }
            return;
        }

        let title = clamp_title(patch.title.as_deref().unwrap_or("New chat"));
        self.entries.insert(
            0,
            SessionSummary::new(&patch.id, &title, patch.mode.unwrap_or_default()),
        );
    }

    /// Applies a new display title and raises the typing-animation flag.
    /// Returns false without touching any state when the clamped title equals
    /// the current one, so repeat renames never retrigger the animation.
    pub fn rename(&mut self, id: &str, title: &str) -> bool {
        let Some(existing) = self.entries.iter_mut().find(|e| return e.id == id) else {
            return false;
        };

        let title = clamp_title(title);
        if existing.title == title {
            return false;
        }

        existing.title = title;
        existing.just_renamed = true;
        return true;
    }

    pub fn clear_just_renamed(&mut self, id: &str) {
        if let Some(existing) = self.entries.iter_mut().find(|e| return e.id == id) {
            existing.just_renamed = false;
        }
    }

    pub fn remove(&mut self, id: &str) {
        self.entries.retain(|e| return e.id != id);
    }

    /// Wholesale refresh from the server list. Transient flags on surviving
    /// entries are carried over so an in-progress typing animation is not cut
    /// short by a background fetch.
    pub fn replace(&mut self, entries: Vec<SessionSummary>) {
        let renamed = self
            .entries
            .iter()
            .filter(|e| return e.just_renamed)
            .map(|e| return e.id.to_string())
            .collect::<Vec<String>>();

        self.entries = entries;
        for id in renamed {
            if let Some(existing) = self.entries.iter_mut().find(|e| return e.id == id) {
                existing.just_renamed = true;
            }
        }
    }

    pub fn list_by_mode(&self, mode: Mode) -> Vec<&SessionSummary> {
        return self.entries.iter().filter(|e| return e.mode == mode).collect();
    }

    pub fn get(&self, id: &str) -> Option<&SessionSummary> {
        return self.entries.iter().find(|e| return e.id == id);
    }

    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }
}
