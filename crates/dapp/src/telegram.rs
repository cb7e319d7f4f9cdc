use anyhow::{anyhow, Result};
use log::{error, info};
use serde::Serialize;

const TELEGRAM_API_BASE_URL: &str = "https://api.telegram.org";

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Delivery outcome written to the task result. A failed delivery is
/// reported, not fatal, so the task output stays deterministic either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub(crate) struct DeliveryReport {
    pub(crate) delivered: bool,
    pub(crate) detail: String,
}

pub(crate) struct TelegramService {
    client: reqwest::Client,
    base_url: String,
    bot_token: String,
}

impl TelegramService {
    pub(crate) fn new(bot_token: String) -> Self {
        Self::with_base_url(TELEGRAM_API_BASE_URL.to_string(), bot_token)
    }

    pub(crate) fn with_base_url(base_url: String, bot_token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            bot_token,
        }
    }

    /// Sends `text` to `chat_id` through the bot API. The bot token only
    /// appears in the request URL, never in logs or reports.
    pub(crate) async fn send_message(&self, chat_id: &str, text: &str) -> DeliveryReport {
        match self.try_send(chat_id, text).await {
            Ok(()) => {
                info!("message delivered to telegram");
                DeliveryReport {
                    delivered: true,
                    detail: "message delivered".to_string(),
                }
            }
            Err(e) => {
                error!("failed to deliver telegram message: {e:#}");
                DeliveryReport {
                    delivered: false,
                    detail: format!("{e:#}"),
                }
            }
        }
    }

    async fn try_send(&self, chat_id: &str, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base_url, self.bot_token);
        let response = self
            .client
            .post(url)
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            .map_err(|e| anyhow!("telegram request failed: {}", e.without_url()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("telegram api returned status {status}"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_message_reports_success() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/bot12345:secret-token/sendMessage")
            .with_status(200)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let service =
            TelegramService::with_base_url(server.url(), "12345:secret-token".to_string());
        let report = service.send_message("123456789", "hello").await;

        assert!(report.delivered);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_reports_failure_without_leaking_token() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/bot12345:secret-token/sendMessage")
            .with_status(403)
            .create_async()
            .await;

        let service =
            TelegramService::with_base_url(server.url(), "12345:secret-token".to_string());
        let report = service.send_message("123456789", "hello").await;

        assert!(!report.delivered);
        assert!(report.detail.contains("403"));
        assert!(!report.detail.contains("secret-token"));
    }
}
