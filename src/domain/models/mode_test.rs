use super::Mode;

#[test]
fn it_parses_known_modes() {
    assert_eq!(Mode::parse("regular"), Some(Mode::Regular));
    assert_eq!(Mode::parse("Uncensored"), Some(Mode::Uncensored));
    assert_eq!(Mode::parse(" ocr "), Some(Mode::Ocr));
    assert_eq!(Mode::parse("turbo"), None);
}

#[test]
fn it_round_trips_through_display() {
    assert_eq!(Mode::Ocr.to_string(), "ocr");
    assert_eq!(Mode::parse(&Mode::Uncensored.to_string()), Some(Mode::Uncensored));
}

#[test]
fn it_cycles_through_every_mode() {
    assert_eq!(Mode::Regular.next(), Mode::Uncensored);
    assert_eq!(Mode::Uncensored.next(), Mode::Ocr);
    assert_eq!(Mode::Ocr.next(), Mode::Regular);
}
