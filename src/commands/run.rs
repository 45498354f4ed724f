use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use rand::Rng;

use crate::bot::Bot;
use crate::config::Config;
use crate::store::{ConversationId, FileStore, StateStore};
use crate::telegram::TelegramClient;

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Args)]
pub struct RunArgs {
    /// Config file (default: tabtoss.toml or tabtoss.json in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl RunArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let config = Config::discover(self.config.as_deref(), &cwd)?;

        // Without a token nothing can be handled; bail before touching state.
        let token = config.bot_token()?;
        let replies = config.replies()?;
        let state_dir = config.state_dir()?;
        let store = FileStore::open(&state_dir)?;

        let poll_timeout = Duration::from_secs(config.telegram.poll_timeout);
        let client = TelegramClient::new(&token, poll_timeout);
        let me = client.get_me().context("checking bot token")?;
        let username = config
            .username()
            .map(ToString::to_string)
            .or(me.username);
        tracing::info!(
            bot = username.as_deref().unwrap_or("?"),
            state_dir = %state_dir.display(),
            replies = replies.len(),
            "starting bot"
        );

        if config.telegram.register_commands {
            if let Err(e) = client.set_my_commands() {
                tracing::warn!("could not register command menu: {e:#}");
            }
        }

        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
            .context("installing Ctrl-C handler")?;

        let bot = Bot::new(store, replies, rand::rng()).with_username(username.as_deref());
        let mut poller = Poller {
            client,
            bot,
            poll_interval: Duration::from_secs(config.telegram.poll_interval),
            poll_timeout,
            stop,
        };
        poller.run();
        tracing::info!("stopped");
        Ok(())
    }
}

/// Long-polling loop: fetch updates, handle each in order, reply.
struct Poller<S, R> {
    client: TelegramClient,
    bot: Bot<S, R>,
    poll_interval: Duration,
    poll_timeout: Duration,
    stop: Arc<AtomicBool>,
}

impl<S: StateStore, R: Rng> Poller<S, R> {
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    fn run(&mut self) {
        let mut offset = 0;
        let mut backoff = INITIAL_BACKOFF;

        while !self.stopped() {
            match self.client.get_updates(offset, self.poll_timeout) {
                Ok(updates) => {
                    backoff = INITIAL_BACKOFF;
                    for update in updates {
                        offset = offset.max(update.update_id + 1);
                        let Some(message) = update.message else { continue };
                        let Some(text) = message.text.as_deref() else { continue };
                        self.dispatch(message.chat.id, text);
                    }
                    self.sleep(self.poll_interval);
                }
                Err(e) => {
                    tracing::warn!(retry_in = ?backoff, "polling failed: {e:#}");
                    self.sleep(backoff);
                    backoff = (backoff * 2).min(MAX_BACKOFF);
                }
            }
        }
    }

    fn dispatch(&mut self, chat_id: i64, text: &str) {
        let Some(reply) = self.bot.handle(ConversationId(chat_id), text) else {
            return;
        };
        if let Err(e) = self.client.send_message(chat_id, &reply) {
            tracing::warn!(chat = chat_id, "sending reply failed: {e:#}");
        }
    }

    /// Sleep in short steps so Ctrl-C is noticed promptly.
    fn sleep(&self, duration: Duration) {
        let step = Duration::from_millis(100);
        let mut slept = Duration::ZERO;
        while slept < duration && !self.stopped() {
            std::thread::sleep(step);
            slept += step;
        }
    }
}
