//! Command handling: runs a routed command against a conversation and
//! phrases the outcome as reply text.

use rand::Rng;

use crate::names::parse_args;
use crate::roster::{AddReport, ClearOutcome, Listing, RemoveOutcome};
use crate::router::{Command, route_message};
use crate::store::{ConversationId, Conversations, StateStore};
use crate::template::ReplyBook;
use crate::toss::{TossError, toss};

pub const GREETING: &str = "Hello! Ready to pay the bill? (hopefully it's not you this time!)\n\
Use /help if you're unsure how to toss.";

pub const HELP: &str = "TabToss Commands:\n\
• /add Name1, Name2, Name3 - Add names into the list (commas support multi-word).\n\
• /list - View current names saved.\n\
• /remove Name1 - remove selected name (case-insensitive).\n\
• /clear - Empties current list.\n\
• /toss - Begin tossing and see who pays from the current list.";

pub const ADD_USAGE: &str = "Usage: /add Name1, Name2, Name3 - Tip: use commas for multi-word";
pub const LIST_EMPTY: &str = "The list is empty. Add some with the command /add ....";
pub const REMOVE_EMPTY: &str = "Nothing to remove - current list is empty";
pub const REMOVE_USAGE: &str =
    "Usage: /remove Name1 - pass one or more names (comma or space separated).";
pub const REMOVE_NONE_FOUND: &str = "No matching names were found.";
pub const CLEAR_EMPTY: &str = "The list is already empty.";
pub const TOSS_EMPTY: &str =
    "You don't have any names yet! Add some with the /add command (/add Name1, Name2 ...)";
pub const STORAGE_FAILED: &str =
    "Sorry, I couldn't access this chat's list right now. Please try again.";

/// The bot: conversation state, reply templates and a random source.
pub struct Bot<S, R> {
    conversations: Conversations<S>,
    replies: ReplyBook,
    rng: R,
    username: Option<String>,
}

impl<S: StateStore, R: Rng> Bot<S, R> {
    pub fn new(store: S, replies: ReplyBook, rng: R) -> Self {
        Self {
            conversations: Conversations::new(store),
            replies,
            rng,
            username: None,
        }
    }

    /// Only accept `/cmd@name` mentions addressed to this username.
    #[must_use]
    pub fn with_username(mut self, username: Option<&str>) -> Self {
        self.username = username.map(ToString::to_string);
        self
    }

    pub fn conversations(&mut self) -> &mut Conversations<S> {
        &mut self.conversations
    }

    /// Handle one incoming message. Returns the reply, or `None` when the
    /// message is not a command for this bot.
    pub fn handle(&mut self, chat: ConversationId, text: &str) -> Option<String> {
        let command = route_message(text, self.username.as_deref())?;
        let _span = tracing::info_span!("command", %chat, name = command.name()).entered();

        match self.execute(chat, command, text) {
            Ok(reply) => {
                tracing::debug!("handled");
                Some(reply)
            }
            Err(e) => {
                tracing::error!("command failed: {e:#}");
                Some(STORAGE_FAILED.to_string())
            }
        }
    }

    fn execute(
        &mut self,
        chat: ConversationId,
        command: Command,
        text: &str,
    ) -> anyhow::Result<String> {
        match command {
            Command::Start => Ok(GREETING.to_string()),
            Command::Help => Ok(HELP.to_string()),
            Command::Add => {
                let tokens = parse_args(text);
                if tokens.is_empty() {
                    return Ok(ADD_USAGE.to_string());
                }
                let report = self
                    .conversations
                    .update(chat, |state| state.names.add(&tokens))?;
                tracing::info!(
                    added = report.added.len(),
                    skipped = report.skipped.len(),
                    total = report.total,
                    "names added"
                );
                Ok(render_add(&report))
            }
            Command::List => {
                let state = self.conversations.get(chat)?;
                Ok(render_listing(&state.names.listing()))
            }
            Command::Remove => {
                let tokens = parse_args(text);
                let outcome = self
                    .conversations
                    .update(chat, |state| state.names.remove(&tokens))?;
                if let RemoveOutcome::Removed(report) = &outcome {
                    tracing::info!(
                        removed = report.removed.len(),
                        missing = report.missing.len(),
                        total = report.total,
                        "names removed"
                    );
                }
                Ok(render_remove(&outcome))
            }
            Command::Clear => {
                let outcome = self.conversations.update(chat, |state| state.names.clear())?;
                if let ClearOutcome::Cleared(count) = outcome {
                    tracing::info!(count, "list cleared");
                }
                Ok(render_clear(outcome))
            }
            Command::Toss => {
                let state = self.conversations.get(chat)?;
                match toss(state.names.as_slice(), &self.replies, &mut self.rng) {
                    Ok(reply) => Ok(reply),
                    Err(TossError::EmptyList) => Ok(TOSS_EMPTY.to_string()),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

pub fn render_add(report: &AddReport) -> String {
    let mut lines = Vec::new();
    if !report.added.is_empty() {
        lines.push(format!("Added: {}", report.added.join(", ")));
    }
    if !report.skipped.is_empty() {
        lines.push(format!("Skipped (already present): {}", report.skipped.join(", ")));
    }
    lines.push(format!("Total names: {}. Use /list to view", report.total));
    lines.join("\n")
}

pub fn render_listing(listing: &Listing<'_>) -> String {
    match listing {
        Listing::Empty => LIST_EMPTY.to_string(),
        Listing::Names(entries) => {
            let lines: Vec<String> = entries
                .iter()
                .map(|(i, name)| format!("{i}. {name}"))
                .collect();
            format!("Current list:\n{}", lines.join("\n"))
        }
    }
}

pub fn render_remove(outcome: &RemoveOutcome) -> String {
    match outcome {
        RemoveOutcome::ListEmpty => REMOVE_EMPTY.to_string(),
        RemoveOutcome::NoNames => REMOVE_USAGE.to_string(),
        RemoveOutcome::Removed(report) if report.removed.is_empty() => {
            REMOVE_NONE_FOUND.to_string()
        }
        RemoveOutcome::Removed(report) => {
            let mut lines = vec![
                format!("Removed: {}", report.removed.join(", ")),
                format!("Total names now: {}.", report.total),
            ];
            if !report.missing.is_empty() {
                lines.push(format!("Not found: {}", report.missing.join(", ")));
            }
            lines.join("\n")
        }
    }
}

pub fn render_clear(outcome: ClearOutcome) -> String {
    match outcome {
        ClearOutcome::AlreadyEmpty => CLEAR_EMPTY.to_string(),
        ClearOutcome::Cleared(count) => format!("Cleared {count} name(s). The list is now empty."),
    }
}
