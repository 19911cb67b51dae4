#[cfg(test)]
#[path = "bubble_list_test.rs"]
mod tests;

use ratatui::prelude::Backend;
use ratatui::prelude::Line;
use ratatui::prelude::Rect;
use ratatui::prelude::Span;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::domain::models::Author;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Theme;

/// Caches the transcript as styled lines so scrolling and redraws never
/// re-wrap. Rebuilt whenever the messages or the pane width change.
pub struct BubbleList {
    lines: Vec<Line<'static>>,
    theme: Theme,
}

impl BubbleList {
    pub fn new(theme: Theme) -> BubbleList {
        return BubbleList {
            lines: vec![],
            theme,
        };
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn set_messages(&mut self, messages: &[Message], width: u16) {
        let wrap_width = width.saturating_sub(4).max(16) as usize;
        let mut lines: Vec<Line<'static>> = vec![];

        for message in messages {
            let mut name = message.author.to_string();
            if name.is_empty() {
                name = "You".to_string();
            }

            let name_style = match message.author {
                Author::User => self.theme.user_style(),
                Author::Bot => self.theme.accent_style(),
            };
            lines.push(Line::from(Span::styled(format!("{name}:"), name_style)));

            for image in &message.images {
                lines.push(Line::from(Span::styled(
                    format!("  📎 {}", image.label()),
                    self.theme.user_style(),
                )));
            }

            let body_style = if message.message_type() == MessageType::Error {
                self.theme.error_style()
            } else {
                self.theme.bot_style()
            };
            for text in message.as_string_lines(wrap_width) {
                lines.push(Line::from(Span::styled(format!("  {text}"), body_style)));
            }

            lines.push(Line::from(""));
        }

        self.lines = lines;
    }

    pub fn len(&self) -> usize {
        return self.lines.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.lines.is_empty();
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, position: u16) {
        frame.render_widget(
            Paragraph::new(self.lines.clone()).scroll((position, 0)),
            rect,
        );
    }
}
