use reading_plan_bot::bot::commands::Command;

#[test]
fn test_known_commands_parse() {
    assert_eq!(Command::parse("/start"), Some(Command::Start));
    assert_eq!(Command::parse("/start_john"), Some(Command::StartJohn));
    assert_eq!(Command::parse("/next"), Some(Command::Next));
    assert_eq!(Command::parse("/status"), Some(Command::Status));
    assert_eq!(Command::parse("/repeat"), Some(Command::Repeat));
    assert_eq!(Command::parse("/today_group"), Some(Command::TodayGroup));
    assert_eq!(Command::parse("/reload"), Some(Command::Reload));
    assert_eq!(
        Command::parse("/register_group"),
        Some(Command::RegisterGroup)
    );
}

#[test]
fn test_trailing_arguments_are_ignored() {
    assert_eq!(Command::parse("/next please"), Some(Command::Next));
    assert_eq!(
        Command::parse("/status and some more words"),
        Some(Command::Status)
    );
}

#[test]
fn test_bot_mention_suffix_is_stripped() {
    assert_eq!(
        Command::parse("/next@reading_plan_bot"),
        Some(Command::Next)
    );
    assert_eq!(
        Command::parse("/register_group@reading_plan_bot in here"),
        Some(Command::RegisterGroup)
    );
}

#[test]
fn test_surrounding_whitespace_is_tolerated() {
    assert_eq!(Command::parse("  /next  "), Some(Command::Next));
}

#[test]
fn test_unknown_commands_parse_to_nothing() {
    assert_eq!(Command::parse("/frobnicate"), None);
    assert_eq!(Command::parse("/nextstep"), None);
    assert_eq!(Command::parse("/"), None);
}

#[test]
fn test_plain_text_is_not_a_command() {
    assert_eq!(Command::parse("hello there"), None);
    assert_eq!(Command::parse("next"), None);
    assert_eq!(Command::parse(""), None);
    // Command must be the first token, not embedded later.
    assert_eq!(Command::parse("say /next"), None);
}

#[test]
fn test_log_form_round_trips() {
    assert_eq!(Command::parse(Command::Next.as_str()), Some(Command::Next));
    assert_eq!(
        Command::parse(Command::RegisterGroup.as_str()),
        Some(Command::RegisterGroup)
    );
}
