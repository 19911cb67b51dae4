use ratatui::widgets::ScrollbarState;

const PAGE_STEP: u16 = 10;

/// Scroll position over the rendered transcript lines. `position` is the
/// first visible line; sticking to `last()` keeps the newest bubble on
/// screen while a reply streams in.
#[derive(Default)]
pub struct Scroll {
    list_length: u16,
    viewport_length: u16,
    pub position: u16,
    pub scrollbar_state: ScrollbarState,
}

impl Scroll {
    fn max_position(&self) -> u16 {
        if self.list_length <= self.viewport_length {
            return 0;
        }

        return self.list_length - self.viewport_length;
    }

    pub fn up(&mut self) {
        self.position = self.position.saturating_sub(1);
        self.scrollbar_state.prev();
    }

    pub fn up_page(&mut self) {
        for _ in 0..PAGE_STEP {
            self.up();
        }
    }

    pub fn down(&mut self) {
        if self.position < self.max_position() {
            self.position += 1;
        }
        self.scrollbar_state.next();
    }

    pub fn down_page(&mut self) {
        for _ in 0..PAGE_STEP {
            self.down();
        }
    }

    pub fn last(&mut self) {
        self.position = self.max_position();
        self.scrollbar_state.last();
    }

    pub fn set_state(&mut self, list_length: u16, viewport_length: u16) {
        self.list_length = list_length;
        self.viewport_length = viewport_length;
        self.position = self.position.min(self.max_position());
        self.scrollbar_state = self
            .scrollbar_state
            .content_length(list_length)
            .viewport_content_length(viewport_length);
    }
}
