//! Operator command parsing.

/// Help text, one line per entry.
pub const HELP: &[&str] = &[
    "Usage:",
    "/quit                             Exit program",
    "/help                             Print this message",
    "/server <name>                    Switch to server, e.g.: /server libera",
    "/channel <name>                   Switch to channel, e.g.: /channel #hackers",
    "/info                             Display the current server and channel",
    "/interactive                      Turn interactive mode on or off",
    "/admin reminders list             List all active reminders",
    "/admin reminders delete <id>      Delete a reminder by ID",
    "/admin reminders purge            Delete all reminders",
];

/// Reminder administration subcommands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReminderCommand {
    List,
    Delete(u64),
    Purge,
}

/// One parsed control line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlCommand {
    Quit,
    Help,
    Server(String),
    Channel(String),
    Info,
    Interactive,
    Reminders(ReminderCommand),
    /// Free text for the selected target.
    Say(String),
    /// A malformed command, with the usage message to show.
    Usage(&'static str),
    Unknown(String),
}

impl ControlCommand {
    /// Parse one line. Commands are case-insensitive; free text is kept
    /// verbatim.
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Self::Say(trimmed.to_string());
        }

        let mut parts = trimmed.split_whitespace();
        let command = parts.next().unwrap_or("").to_ascii_lowercase();
        match command.as_str() {
            "/quit" => Self::Quit,
            "/help" => Self::Help,
            "/info" => Self::Info,
            "/interactive" => Self::Interactive,
            "/server" => match parts.next() {
                Some(name) => Self::Server(name.to_string()),
                None => Self::Usage("Usage: /server <name>"),
            },
            "/channel" => match parts.next() {
                Some(name) => Self::Channel(name.to_string()),
                None => Self::Usage("Usage: /channel <name>"),
            },
            "/admin" => Self::parse_admin(parts),
            _ => Self::Unknown(trimmed.to_string()),
        }
    }

    fn parse_admin<'a>(mut parts: impl Iterator<Item = &'a str>) -> Self {
        match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("reminders") => {}
            Some(_) => return Self::Unknown("/admin".to_string()),
            None => return Self::Usage("Usage: /admin <command>"),
        }
        match parts.next().map(str::to_ascii_lowercase).as_deref() {
            Some("list") => Self::Reminders(ReminderCommand::List),
            Some("purge") => Self::Reminders(ReminderCommand::Purge),
            Some("delete") => match parts.next().map(str::parse::<u64>) {
                Some(Ok(id)) => Self::Reminders(ReminderCommand::Delete(id)),
                Some(Err(_)) => Self::Usage("Invalid reminder ID."),
                None => Self::Usage("Usage: /admin reminders delete <id>"),
            },
            _ => Self::Usage("Usage: /admin reminders <list|delete|purge>"),
        }
    }
}
