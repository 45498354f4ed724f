use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::config::{Config, find_config};
use crate::error::ExitError;
use crate::store::FileStore;

#[derive(Debug, Args)]
pub struct DoctorArgs {
    /// Config file (default: tabtoss.toml or tabtoss.json in the current directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Output format
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    Pretty,
    Text,
    Json,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DoctorReport {
    pub config: ConfigStatus,
    pub token: TokenStatus,
    pub replies: RepliesStatus,
    pub storage: StorageStatus,
    pub issues: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigStatus {
    /// None when running on defaults.
    pub path: Option<String>,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenStatus {
    pub env: String,
    pub present: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RepliesStatus {
    pub source: String,
    pub count: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StorageStatus {
    pub state_dir: Option<String>,
    pub conversations: Option<usize>,
}

impl DoctorArgs {
    pub fn execute(&self) -> anyhow::Result<()> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let config_path = self.config.clone().or_else(|| find_config(&cwd));
        let config = Config::discover(config_path.as_deref(), &cwd)?;

        let format = self.format.unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                OutputFormat::Pretty
            } else {
                OutputFormat::Text
            }
        });

        let report = build_report(&config, config_path.map(|p| p.display().to_string()));
        let issue_count = report.issues.len();

        match format {
            OutputFormat::Pretty => print_pretty(&report),
            OutputFormat::Text => print_text(&report),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        }

        if issue_count > 0 {
            return Err(ExitError::new(
                u8::try_from(issue_count.min(125)).unwrap_or(125),
                format!("{issue_count} issue(s) found"),
            )
            .into());
        }
        Ok(())
    }
}

pub fn build_report(config: &Config, config_path: Option<String>) -> DoctorReport {
    let mut issues = Vec::new();

    let present = config.bot_token().is_ok();
    if !present {
        issues.push(format!("bot token not set (env {})", config.telegram.token_env));
    }
    let token = TokenStatus {
        env: config.telegram.token_env.clone(),
        present,
    };

    let source = config
        .replies
        .path
        .as_ref()
        .map_or_else(|| "built-in".to_string(), |p| p.display().to_string());
    let count = match config.replies() {
        Ok(book) => Some(book.len()),
        Err(e) => {
            issues.push(format!("replies: {e:#}"));
            None
        }
    };
    let replies = RepliesStatus { source, count };

    let storage = match config.state_dir() {
        Ok(dir) => {
            let conversations = match FileStore::open(&dir) {
                Ok(_) => count_records(&dir),
                Err(e) => {
                    issues.push(format!("state dir: {e:#}"));
                    None
                }
            };
            StorageStatus {
                state_dir: Some(dir.display().to_string()),
                conversations,
            }
        }
        Err(e) => {
            issues.push(format!("state dir: {e:#}"));
            StorageStatus {
                state_dir: None,
                conversations: None,
            }
        }
    };

    DoctorReport {
        config: ConfigStatus {
            path: config_path,
            version: config.version.clone(),
        },
        token,
        replies,
        storage,
        issues,
    }
}

fn count_records(dir: &std::path::Path) -> Option<usize> {
    let entries = std::fs::read_dir(dir).ok()?;
    Some(
        entries
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "json"))
            .count(),
    )
}

fn print_pretty(report: &DoctorReport) {
    println!("=== tabtoss doctor ===\n");
    println!("Config:  {}", report.config.path.as_deref().unwrap_or("(defaults)"));
    println!("Version: {}", report.config.version);
    println!();

    if report.token.present {
        println!("  ✓ token: {} is set", report.token.env);
    } else {
        println!("  ✗ token: {} is NOT set", report.token.env);
    }
    match report.replies.count {
        Some(n) => println!("  ✓ replies: {n} template(s) from {}", report.replies.source),
        None => println!("  ✗ replies: {} failed to load", report.replies.source),
    }
    match (&report.storage.state_dir, report.storage.conversations) {
        (Some(dir), Some(n)) => println!("  ✓ state: {dir} ({n} conversation(s))"),
        (Some(dir), None) => println!("  ✗ state: {dir} is not usable"),
        (None, _) => println!("  ✗ state: no state directory"),
    }

    if report.issues.is_empty() {
        println!("\n✓ No issues found");
    } else {
        println!("\nIssues ({}):", report.issues.len());
        for issue in &report.issues {
            println!("  • {issue}");
        }
    }
}

fn print_text(report: &DoctorReport) {
    println!(
        "tabtoss-doctor  config={}  version={}",
        report.config.path.as_deref().unwrap_or("-"),
        report.config.version
    );
    println!(
        "token  {}  {}",
        report.token.env,
        if report.token.present { "ok" } else { "missing" }
    );
    match report.replies.count {
        Some(n) => println!("replies  {}  ok  count={n}", report.replies.source),
        None => println!("replies  {}  invalid", report.replies.source),
    }
    println!(
        "state  {}  {}",
        report.storage.state_dir.as_deref().unwrap_or("-"),
        report
            .storage
            .conversations
            .map_or_else(|| "unusable".to_string(), |n| format!("ok  conversations={n}"))
    );

    if !report.issues.is_empty() {
        println!("issues  count={}", report.issues.len());
        for issue in &report.issues {
            println!("issue  {issue}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_in(dir: &std::path::Path, extra: &str) -> Config {
        let toml = format!(
            "[telegram]\ntoken_env = \"TABTOSS_DOCTOR_TEST_UNSET_TOKEN\"\n[storage]\nstate_dir = \"state\"\n{extra}"
        );
        std::fs::write(dir.join("tabtoss.toml"), toml).unwrap();
        Config::discover(None, dir).unwrap()
    }

    #[test]
    fn reports_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let report = build_report(&config_in(dir.path(), ""), None);
        assert!(!report.token.present);
        assert_eq!(report.issues.len(), 1);
        assert!(report.issues[0].contains("TABTOSS_DOCTOR_TEST_UNSET_TOKEN"));
        assert_eq!(report.storage.conversations, Some(0));
        assert_eq!(report.replies.source, "built-in");
    }

    #[test]
    fn reports_broken_replies() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bad.json"), r#"["no placeholder here"]"#).unwrap();
        let report = build_report(&config_in(dir.path(), "[replies]\npath = \"bad.json\"\n"), None);
        assert!(report.replies.count.is_none());
        assert!(report.issues.iter().any(|i| i.starts_with("replies:")));
    }

    #[test]
    fn counts_stored_conversations() {
        let dir = tempfile::tempdir().unwrap();
        let state = dir.path().join("state");
        std::fs::create_dir_all(&state).unwrap();
        std::fs::write(state.join("1.json"), "{}").unwrap();
        std::fs::write(state.join("-2.json"), "{}").unwrap();
        let report = build_report(&config_in(dir.path(), ""), None);
        assert_eq!(report.storage.conversations, Some(2));
    }
}
