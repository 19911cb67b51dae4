use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;

/// Light/dark display preference, persisted with the client state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn parse(text: &str) -> Option<Theme> {
        match text.trim().to_lowercase().as_str() {
            "light" => return Some(Theme::Light),
            "dark" => return Some(Theme::Dark),
            _ => return None,
        }
    }

    pub fn toggle(self) -> Theme {
        match self {
            Theme::Light => return Theme::Dark,
            Theme::Dark => return Theme::Light,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => return "light",
            Theme::Dark => return "dark",
        }
    }

    pub fn user_style(self) -> Style {
        match self {
            Theme::Light => return Style::default().fg(Color::Blue),
            Theme::Dark => return Style::default().fg(Color::Cyan),
        }
    }

    pub fn bot_style(self) -> Style {
        match self {
            Theme::Light => return Style::default().fg(Color::Black),
            Theme::Dark => return Style::default().fg(Color::White),
        }
    }

    pub fn error_style(self) -> Style {
        return Style::default().fg(Color::Red);
    }

    pub fn accent_style(self) -> Style {
        match self {
            Theme::Light => {
                return Style::default()
                    .fg(Color::Magenta)
                    .add_modifier(Modifier::BOLD);
            }
            Theme::Dark => {
                return Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD);
            }
        }
    }
}
