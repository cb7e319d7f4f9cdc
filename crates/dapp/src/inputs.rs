use anyhow::{Context, Result};
use serde::Deserialize;
use shared::models::RequesterSecretPayload;
use shared::validation::{self, FieldChecks};

const DEVELOPER_SECRET_VAR: &str = "IEXEC_APP_DEVELOPER_SECRET";
const REQUESTER_SECRET_VAR: &str = "IEXEC_REQUESTER_SECRET_1";
const OUTPUT_DIR_VAR: &str = "IEXEC_OUT";

#[derive(Debug, Deserialize)]
struct DeveloperSecret {
    #[serde(rename = "TELEGRAM_BOT_TOKEN")]
    telegram_bot_token: String,
}

/// Validated task inputs assembled from the confidential runtime's
/// environment contract.
#[derive(Debug, Clone)]
pub(crate) struct TaskInputs {
    pub(crate) iexec_out: String,
    pub(crate) chat_id: String,
    pub(crate) telegram_content: String,
    #[allow(dead_code)]
    pub(crate) encryption_key: Option<String>,
    pub(crate) bot_token: String,
}

impl TaskInputs {
    pub(crate) fn from_env() -> Result<Self> {
        let developer_secret: DeveloperSecret =
            serde_json::from_str(&std::env::var(DEVELOPER_SECRET_VAR).unwrap_or_default())
                .context("failed to parse the developer secret")?;
        let requester_secret: RequesterSecretPayload = match std::env::var(REQUESTER_SECRET_VAR) {
            Ok(raw) => {
                serde_json::from_str(&raw).context("failed to parse the requester secret")?
            }
            Err(_) => RequesterSecretPayload::default(),
        };
        let iexec_out = std::env::var(OUTPUT_DIR_VAR).unwrap_or_default();

        Self::validate(
            iexec_out,
            requester_secret.chat_id.unwrap_or_default(),
            requester_secret.message.unwrap_or_default(),
            requester_secret.telegram_content_encryption_key,
            developer_secret.telegram_bot_token,
        )
    }

    /// Checks every field and reports all failures at once.
    fn validate(
        iexec_out: String,
        chat_id: String,
        telegram_content: String,
        encryption_key: Option<String>,
        bot_token: String,
    ) -> Result<Self> {
        let mut checks = FieldChecks::new();
        let iexec_out = checks.check(validation::checked_non_empty("iexecOut", &iexec_out));
        let chat_id = checks.check(validation::checked_non_empty("chatId", &chat_id));
        let telegram_content = checks.check(validation::checked_telegram_content(
            "telegramContent",
            &telegram_content,
        ));
        let encryption_key = match encryption_key {
            Some(key) => checks
                .check(validation::checked_base64(
                    "telegramContentEncryptionKey",
                    &key,
                ))
                .map(Some),
            None => Some(None),
        };
        let bot_token = checks.check(validation::checked_non_empty("botToken", &bot_token));
        checks.finish()?;

        let (Some(iexec_out), Some(chat_id), Some(telegram_content), Some(encryption_key), Some(bot_token)) =
            (iexec_out, chat_id, telegram_content, encryption_key, bot_token)
        else {
            unreachable!("all checks passed");
        };
        Ok(Self {
            iexec_out,
            chat_id,
            telegram_content,
            encryption_key,
            bot_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_accepts_complete_inputs() {
        let inputs = TaskInputs::validate(
            "/iexec_out".to_string(),
            "123456789".to_string(),
            "hello".to_string(),
            Some("aGVsbG8=".to_string()),
            "12345:token".to_string(),
        )
        .unwrap();
        assert_eq!(inputs.chat_id, "123456789");
        assert_eq!(inputs.encryption_key.as_deref(), Some("aGVsbG8="));
    }

    #[test]
    fn test_validate_allows_missing_encryption_key() {
        let inputs = TaskInputs::validate(
            "/iexec_out".to_string(),
            "123456789".to_string(),
            "hello".to_string(),
            None,
            "12345:token".to_string(),
        )
        .unwrap();
        assert!(inputs.encryption_key.is_none());
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let err = TaskInputs::validate(
            String::new(),
            String::new(),
            String::new(),
            Some("%%%".to_string()),
            String::new(),
        )
        .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.contains("iexecOut"));
        assert!(rendered.contains("chatId"));
        assert!(rendered.contains("telegramContent"));
        assert!(rendered.contains("telegramContentEncryptionKey"));
        assert!(rendered.contains("botToken"));
    }

    #[test]
    fn test_developer_secret_parses_bot_token() {
        let secret: DeveloperSecret =
            serde_json::from_str(r#"{"TELEGRAM_BOT_TOKEN":"12345:token"}"#).unwrap();
        assert_eq!(secret.telegram_bot_token, "12345:token");
    }
}
