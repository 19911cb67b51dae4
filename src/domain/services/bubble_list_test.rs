use std::path::PathBuf;

use super::BubbleList;
use crate::domain::models::Author;
use crate::domain::models::ImageRef;
use crate::domain::models::Message;
use crate::domain::models::Theme;

#[test]
fn it_builds_a_header_body_and_spacer_per_message() {
    let mut list = BubbleList::new(Theme::Light);
    list.set_messages(&[Message::new(Author::Bot, "hello")], 80);

    // Name line, one body line, one spacer.
    assert_eq!(list.len(), 3);
}

#[test]
fn it_adds_attachment_lines_for_images() {
    let mut list = BubbleList::new(Theme::Dark);
    list.set_messages(
        &[Message::new_with_images(
            Author::User,
            "look",
            vec![
                ImageRef::Local(PathBuf::from("/tmp/a.png")),
                ImageRef::Remote("http://localhost:8000/media/b.png".to_string()),
            ],
        )],
        80,
    );

    // Name, two attachments, body, spacer.
    assert_eq!(list.len(), 5);
}

#[test]
fn it_wraps_against_the_pane_width() {
    let mut list = BubbleList::new(Theme::Light);
    let narrow_width = 20;
    list.set_messages(
        &[Message::new(Author::Bot, "a line that is far too long to fit")],
        narrow_width,
    );

    let mut wide = BubbleList::new(Theme::Light);
    wide.set_messages(
        &[Message::new(Author::Bot, "a line that is far too long to fit")],
        120,
    );

    assert!(list.len() > wide.len());
}
