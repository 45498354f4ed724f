//! Mapping incoming chat text to bot commands.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Add,
    List,
    Remove,
    Clear,
    Toss,
}

impl Command {
    /// Commands advertised in the chat client's command menu, in display order.
    pub const MENU: [Self; 7] = [
        Self::Start,
        Self::Help,
        Self::Add,
        Self::List,
        Self::Remove,
        Self::Clear,
        Self::Toss,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Help => "help",
            Self::Add => "add",
            Self::List => "list",
            Self::Remove => "remove",
            Self::Clear => "clear",
            Self::Toss => "toss",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::Start => "Say hello",
            Self::Help => "Show how to use the bot",
            Self::Add => "Add names: /add Name1, Name2",
            Self::List => "Show the current names",
            Self::Remove => "Remove names: /remove Name1",
            Self::Clear => "Empty the list",
            Self::Toss => "Pick who pays",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let name = name.to_ascii_lowercase();
        let command = match name.as_str() {
            "start" => Self::Start,
            "help" => Self::Help,
            "add" => Self::Add,
            "list" | "names" => Self::List,
            "remove" => Self::Remove,
            "clear" => Self::Clear,
            "toss" => Self::Toss,
            _ => return None,
        };
        Some(command)
    }
}

/// Parse the leading `/command` (optionally `/command@BotName`) of a message.
///
/// Returns `None` for plain text, unknown commands, and commands addressed to
/// a different bot. With no `bot_username`, any `@` suffix is accepted.
pub fn route_message(text: &str, bot_username: Option<&str>) -> Option<Command> {
    let head = text.split_whitespace().next()?;
    let head = head.strip_prefix('/')?;

    let (name, mention) = match head.split_once('@') {
        Some((name, mention)) => (name, Some(mention)),
        None => (head, None),
    };

    if let (Some(mention), Some(username)) = (mention, bot_username) {
        if !mention.eq_ignore_ascii_case(username) {
            return None;
        }
    }

    Command::from_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_each_command() {
        assert_eq!(route_message("/start", None), Some(Command::Start));
        assert_eq!(route_message("/help", None), Some(Command::Help));
        assert_eq!(route_message("/add Ann", None), Some(Command::Add));
        assert_eq!(route_message("/list", None), Some(Command::List));
        assert_eq!(route_message("/remove Ann", None), Some(Command::Remove));
        assert_eq!(route_message("/clear", None), Some(Command::Clear));
        assert_eq!(route_message("/toss", None), Some(Command::Toss));
    }

    #[test]
    fn route_names_alias() {
        assert_eq!(route_message("/names", None), Some(Command::List));
    }

    #[test]
    fn route_is_case_insensitive() {
        assert_eq!(route_message("/TOSS", None), Some(Command::Toss));
        assert_eq!(route_message("  /Add Ann", None), Some(Command::Add));
    }

    #[test]
    fn route_plain_text_is_ignored() {
        assert_eq!(route_message("who pays tonight?", None), None);
        assert_eq!(route_message("", None), None);
        assert_eq!(route_message("   ", None), None);
    }

    #[test]
    fn route_unknown_command_is_ignored() {
        assert_eq!(route_message("/pay", None), None);
        // word boundary: /tossup is not /toss
        assert_eq!(route_message("/tossup", None), None);
    }

    #[test]
    fn route_mention_for_this_bot() {
        assert_eq!(
            route_message("/add@TabToss_Bot Ann", Some("TabToss_Bot")),
            Some(Command::Add)
        );
        assert_eq!(
            route_message("/toss@tabtoss_bot", Some("TabToss_Bot")),
            Some(Command::Toss)
        );
    }

    #[test]
    fn route_mention_for_other_bot_is_ignored() {
        assert_eq!(route_message("/toss@OtherBot", Some("TabToss_Bot")), None);
    }

    #[test]
    fn route_mention_without_configured_username() {
        assert_eq!(route_message("/toss@AnyBot", None), Some(Command::Toss));
    }

    #[test]
    fn menu_names_route_back() {
        for command in Command::MENU {
            assert_eq!(route_message(&format!("/{}", command.name()), None), Some(command));
        }
    }
}
