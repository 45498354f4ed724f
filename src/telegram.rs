//! Minimal blocking client for the Telegram Bot HTTP API.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ExitError;
use crate::router::Command;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct BotCommand {
    command: &'static str,
    description: &'static str,
}

#[derive(Debug, Serialize)]
struct SetMyCommands {
    commands: Vec<BotCommand>,
}

pub struct TelegramClient {
    agent: ureq::Agent,
    base: String,
}

impl TelegramClient {
    /// `poll_timeout` is the long-poll window; requests get a little longer
    /// than that before the HTTP layer gives up.
    pub fn new(token: &str, poll_timeout: Duration) -> Self {
        Self::with_base(API_BASE, token, poll_timeout)
    }

    pub fn with_base(api_base: &str, token: &str, poll_timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(poll_timeout + Duration::from_secs(10)))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            base: format!("{}/bot{token}", api_base.trim_end_matches('/')),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    fn unwrap_response<T>(method: &str, response: ApiResponse<T>) -> anyhow::Result<T> {
        if !response.ok {
            return Err(ExitError::Transport {
                method: method.to_string(),
                message: response.description.unwrap_or_else(|| "request rejected".into()),
            }
            .into());
        }
        response.result.ok_or_else(|| {
            ExitError::Transport {
                method: method.to_string(),
                message: "response had no result".into(),
            }
            .into()
        })
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> anyhow::Result<T> {
        let response: ApiResponse<T> = self
            .agent
            .post(&self.url(method))
            .send_json(body)
            .map_err(|e| transport_error(method, &e))?
            .into_body()
            .read_json()
            .map_err(|e| transport_error(method, &e))?;
        Self::unwrap_response(method, response)
    }

    /// Identity of the bot owning the token. Fails fast on a bad token.
    pub fn get_me(&self) -> anyhow::Result<User> {
        let response: ApiResponse<User> = self
            .agent
            .get(&self.url("getMe"))
            .call()
            .map_err(|e| transport_error("getMe", &e))?
            .into_body()
            .read_json()
            .map_err(|e| transport_error("getMe", &e))?;
        Self::unwrap_response("getMe", response)
    }

    /// Long-poll for updates after `offset`.
    pub fn get_updates(&self, offset: i64, timeout: Duration) -> anyhow::Result<Vec<Update>> {
        let response: ApiResponse<Vec<Update>> = self
            .agent
            .get(&self.url("getUpdates"))
            .query("offset", offset.to_string())
            .query("timeout", timeout.as_secs().to_string())
            .query("allowed_updates", r#"["message"]"#)
            .call()
            .map_err(|e| transport_error("getUpdates", &e))?
            .into_body()
            .read_json()
            .map_err(|e| transport_error("getUpdates", &e))?;
        Self::unwrap_response("getUpdates", response)
    }

    pub fn send_message(&self, chat_id: i64, text: &str) -> anyhow::Result<()> {
        let _: Message = self.post("sendMessage", &SendMessage { chat_id, text })?;
        Ok(())
    }

    /// Publish the command menu shown by chat clients.
    pub fn set_my_commands(&self) -> anyhow::Result<()> {
        let _: bool = self.post("setMyCommands", &menu())?;
        Ok(())
    }
}

fn menu() -> SetMyCommands {
    SetMyCommands {
        commands: Command::MENU
            .iter()
            .map(|c| BotCommand {
                command: c.name(),
                description: c.description(),
            })
            .collect(),
    }
}

fn transport_error(method: &str, err: &ureq::Error) -> anyhow::Error {
    ExitError::Transport {
        method: method.to_string(),
        message: err.to_string(),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_updates() {
        let json = r#"{
            "ok": true,
            "result": [
                {"update_id": 10, "message": {"message_id": 1, "chat": {"id": -100, "type": "group"}, "text": "/toss"}},
                {"update_id": 11, "edited_message": {"message_id": 1, "chat": {"id": 5}}},
                {"update_id": 12, "message": {"message_id": 2, "chat": {"id": 5, "type": "private"}, "photo": []}}
            ]
        }"#;
        let response: ApiResponse<Vec<Update>> = serde_json::from_str(json).unwrap();
        let updates = TelegramClient::unwrap_response("getUpdates", response).unwrap();
        assert_eq!(updates.len(), 3);
        let first = updates[0].message.as_ref().unwrap();
        assert_eq!(first.chat.id, -100);
        assert_eq!(first.text.as_deref(), Some("/toss"));
        assert!(updates[1].message.is_none());
        assert!(updates[2].message.as_ref().unwrap().text.is_none());
    }

    #[test]
    fn parses_bot_identity() {
        let json =
            r#"{"ok": true, "result": {"id": 42, "is_bot": true, "username": "TabToss_Bot"}}"#;
        let response: ApiResponse<User> = serde_json::from_str(json).unwrap();
        let me = TelegramClient::unwrap_response("getMe", response).unwrap();
        assert_eq!(me.id, 42);
        assert_eq!(me.username.as_deref(), Some("TabToss_Bot"));
    }

    #[test]
    fn ok_response_without_result_is_an_error() {
        let response: ApiResponse<User> = serde_json::from_str(r#"{"ok": true}"#).unwrap();
        let err = TelegramClient::unwrap_response("getMe", response).unwrap_err();
        assert_eq!(err.to_string(), "telegram getMe failed: response had no result");
    }

    #[test]
    fn api_error_becomes_transport_error() {
        let json = r#"{"ok": false, "error_code": 401, "description": "Unauthorized"}"#;
        let response: ApiResponse<User> = serde_json::from_str(json).unwrap();
        let err = TelegramClient::unwrap_response("getMe", response).unwrap_err();
        assert_eq!(err.to_string(), "telegram getMe failed: Unauthorized");
    }

    #[test]
    fn menu_lists_every_command() {
        let menu = serde_json::to_value(menu()).unwrap();
        let commands = menu["commands"].as_array().unwrap();
        assert_eq!(commands.len(), Command::MENU.len());
        assert_eq!(commands[0]["command"], "start");
        assert!(commands.iter().all(|c| c["description"].as_str().is_some_and(|d| !d.is_empty())));
    }

    #[test]
    fn url_embeds_token() {
        let client =
            TelegramClient::with_base("http://localhost:8081/", "123:abc", Duration::from_secs(1));
        assert_eq!(client.url("getMe"), "http://localhost:8081/bot123:abc/getMe");
    }
}
