//! Command parsing — the `/`-prefixed surface the audience channel speaks.

/// A parsed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/add <event-url>` — track a new competition from the catalog.
    Add { url: String },
    /// `/agenda` — list tracked competitions.
    Agenda,
    /// `/details <name>` — everything we know about one competition.
    Details { name: String },
    /// `/remove <name>` — stop tracking one competition.
    Remove { name: String },
    /// `/clear` — drop everything, after a reaction confirm.
    Clear,
    /// `/upcoming` — preview the catalog's next events (nothing stored).
    Upcoming,
    /// `/help` — command list.
    Help,
    /// A `/something` we don't know.
    Unknown(String),
    /// A known command missing its argument.
    Invalid { usage: &'static str },
}

impl Command {
    /// Parse a raw message. `None` if it isn't a command at all (no `/`
    /// prefix) — ordinary chatter is ignored, not answered.
    pub fn parse(content: &str) -> Option<Command> {
        let trimmed = content.trim();
        let rest = trimmed.strip_prefix('/')?;
        let mut words = rest.split_whitespace();
        let name = words.next()?.to_lowercase();
        let arg = words.next();

        let command = match name.as_str() {
            "add" => match arg {
                Some(url) => Command::Add { url: url.to_string() },
                None => Command::Invalid {
                    usage: "/add <event-url>",
                },
            },
            "agenda" => Command::Agenda,
            "details" => match arg {
                Some(name) => Command::Details {
                    name: name.to_string(),
                },
                None => Command::Invalid {
                    usage: "/details <event-name>",
                },
            },
            "remove" => match arg {
                Some(name) => Command::Remove {
                    name: name.to_string(),
                },
                None => Command::Invalid {
                    usage: "/remove <event-name>",
                },
            },
            "clear" => Command::Clear,
            "upcoming" => Command::Upcoming,
            "help" => Command::Help,
            other => Command::Unknown(other.to_string()),
        };
        Some(command)
    }
}
