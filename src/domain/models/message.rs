#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
use std::path::PathBuf;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Author;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    Normal,
    Error,
}

/// A picture attached to a message. Local files are what the user queued
/// before sending; once the server persists them the message swaps over to
/// the returned URLs and the local references are released.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageRef {
    Local(PathBuf),
    Remote(String),
}

impl ImageRef {
    pub fn label(&self) -> String {
        match self {
            ImageRef::Local(path) => {
                return path
                    .file_name()
                    .map(|e| return e.to_string_lossy().to_string())
                    .unwrap_or_else(|| return path.to_string_lossy().to_string());
            }
            ImageRef::Remote(url) => {
                return url
                    .split('/')
                    .last()
                    .unwrap_or(url)
                    .split('?')
                    .next()
                    .unwrap_or(url)
                    .to_string();
            }
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Message {
    pub author: Author,
    pub text: String,
    pub images: Vec<ImageRef>,
    mtype: MessageType,
}

impl Message {
    pub fn new(author: Author, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string().replace('\t', "  "),
            images: vec![],
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(author: Author, mtype: MessageType, text: &str) -> Message {
        return Message {
            author,
            text: text.to_string().replace('\t', "  "),
            images: vec![],
            mtype,
        };
    }

    pub fn new_with_images(author: Author, text: &str, images: Vec<ImageRef>) -> Message {
        return Message {
            author,
            text: text.to_string().replace('\t', "  "),
            images,
            mtype: MessageType::Normal,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn replace_images(&mut self, images: Vec<ImageRef>) {
        self.images = images;
    }

    pub fn as_string_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for full_line in self.text.split('\n') {
            if full_line.trim().is_empty() {
                lines.push(" ".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_lines: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                if word.len() + char_count + 1 > line_max_width {
                    lines.push(current_lines.join(" ").trim_end().to_string());
                    current_lines = vec![word];
                    char_count = word.len() + 1;
                } else {
                    current_lines.push(word);
                    char_count += word.len() + 1;
                }
            }
            if !current_lines.is_empty() {
                lines.push(current_lines.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}
