use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::bot::Bot;
use crate::config::Config;
use crate::store::{ConversationId, FileStore, MemoryStore, StateStore};

/// Chat with the bot from the terminal: one message per line on stdin,
/// replies on stdout.
#[derive(Debug, Args)]
pub struct ConsoleArgs {
    /// Config file (default: tabtoss.toml or tabtoss.json in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Conversation id to act as
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub chat: i64,
    /// Override the configured state directory
    #[arg(long, conflicts_with = "memory")]
    pub state_dir: Option<PathBuf>,
    /// Keep state in memory only
    #[arg(long)]
    pub memory: bool,
    /// Seed the random source for repeatable tosses
    #[arg(long)]
    pub seed: Option<u64>,
}

impl ConsoleArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let config = Config::discover(self.config.as_deref(), &cwd)?;
        let replies = config.replies()?;
        let rng = self
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let chat = ConversationId(self.chat);

        if self.memory {
            let bot = Bot::new(MemoryStore::new(), replies, rng);
            return converse(bot, chat, config.username());
        }

        let state_dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => config.state_dir()?,
        };
        let store = FileStore::open(&state_dir)?;
        tracing::debug!(state_dir = %store.dir().display(), %chat, "console session");
        let bot = Bot::new(store, replies, rng);
        converse(bot, chat, config.username())
    }
}

fn converse<S: StateStore>(
    bot: Bot<S, StdRng>,
    chat: ConversationId,
    username: Option<&str>,
) -> anyhow::Result<()> {
    let mut bot = bot.with_username(username);
    let stdin = std::io::stdin();
    let interactive = stdin.is_terminal();
    let mut stdout = std::io::stdout().lock();

    if interactive {
        eprintln!("tabtoss console (chat {chat}). Type /help, Ctrl-D to quit.");
    }

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        match bot.handle(chat, &line) {
            Some(reply) => writeln!(stdout, "{reply}")?,
            None if interactive && !line.trim().is_empty() => {
                eprintln!("(not a command; try /help)");
            }
            None => {}
        }
        stdout.flush()?;
    }
    Ok(())
}
