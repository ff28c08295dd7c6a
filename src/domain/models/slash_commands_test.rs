use super::SlashCommand;

#[test]
fn it_parse_empty_string() {
    let text = "";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_space_only() {
    let text = " ";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_single_slash() {
    let text = "/";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_invalid_prefix() {
    let text = "!q";
    assert!(SlashCommand::parse(text).is_none());
}
#[test]
fn it_parse_valid_prefix() {
    let text = "/q";
    let cmd = SlashCommand::parse(text);
    assert!(cmd.is_some());
    assert_eq!(cmd.unwrap().command, "/q");
}
#[test]
fn it_parse_plain_chat_text() {
    assert!(SlashCommand::parse("We bake sourdough bread").is_none());
}

#[test]
fn it_is_short_quit() {
    let cmd = SlashCommand::parse("/q").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_quit() {
    let cmd = SlashCommand::parse("/quit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_exit() {
    let cmd = SlashCommand::parse("/exit").unwrap();
    assert!(cmd.is_quit());
}
#[test]
fn it_is_not_is_quit() {
    let cmd = SlashCommand::parse("/reset").unwrap();
    assert!(!cmd.is_quit());
}

#[test]
fn it_is_reset() {
    let cmd = SlashCommand::parse("/reset").unwrap();
    assert!(cmd.is_reset());
}
#[test]
fn it_is_not_reset_short() {
    assert!(SlashCommand::parse("/r").is_none());
}

#[test]
fn it_is_short_save() {
    let cmd = SlashCommand::parse("/s").unwrap();
    assert!(cmd.is_save());
}
#[test]
fn it_is_save() {
    let cmd = SlashCommand::parse(" /save ").unwrap();
    assert!(cmd.is_save());
}

#[test]
fn it_is_short_plan() {
    let cmd = SlashCommand::parse("/p").unwrap();
    assert!(cmd.is_plan());
}
#[test]
fn it_is_plan() {
    let cmd = SlashCommand::parse("/plan").unwrap();
    assert!(cmd.is_plan());
}

#[test]
fn it_is_short_help() {
    let cmd = SlashCommand::parse("/h").unwrap();
    assert!(cmd.is_help());
}
#[test]
fn it_is_help() {
    let cmd = SlashCommand::parse("/help").unwrap();
    assert!(cmd.is_help());
}
#[test]
fn it_ignores_trailing_words() {
    let cmd = SlashCommand::parse("/help me please").unwrap();
    assert!(cmd.is_help());
    assert_eq!(cmd.command, "/help");
}
