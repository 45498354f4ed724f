use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::{CONFIG_TOML, Config, LEGACY_TOKEN_ENV};
use crate::error::ExitError;
use crate::template::BUILTIN_REPLIES;

const REPLIES_FILE: &str = "replies.json";

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Directory to write tabtoss.toml into
    #[arg(long)]
    pub dir: Option<PathBuf>,
    /// Bot username (without @)
    #[arg(long)]
    pub username: Option<String>,
    /// Also write the built-in replies to replies.json for editing
    #[arg(long)]
    pub with_replies: bool,
    /// Overwrite existing files
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn execute(&self) -> Result<()> {
        let dir = match self.dir.clone() {
            Some(d) => d,
            None => std::env::current_dir().context("could not determine current directory")?,
        };
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let config_path = dir.join(CONFIG_TOML);
        let replies_path = dir.join(REPLIES_FILE);
        let targets =
            std::iter::once(&config_path).chain(self.with_replies.then_some(&replies_path));
        for path in targets {
            if path.exists() && !self.force {
                return Err(ExitError::Config(format!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ))
                .into());
            }
        }

        let mut config = Config::default();
        config.telegram.username = self.username.clone();
        config.storage.state_dir = Some(PathBuf::from("state"));
        if self.with_replies {
            config.replies.path = Some(PathBuf::from(REPLIES_FILE));
            fs::write(&replies_path, BUILTIN_REPLIES)
                .with_context(|| format!("writing {}", replies_path.display()))?;
            println!("wrote {}", replies_path.display());
        }

        fs::write(&config_path, config.to_toml()?)
            .with_context(|| format!("writing {}", config_path.display()))?;
        println!("wrote {}", config_path.display());
        println!(
            "set {} (or add it to .env; the older {LEGACY_TOKEN_ENV} name also works) \
             and run `tabtoss run`",
            config.telegram.token_env
        );
        Ok(())
    }
}
