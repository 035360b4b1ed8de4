// src/scheduler/dispatch.rs — Push-notification collaborator
//
// The engine only states intent. Delivery belongs to whatever implements
// `Dispatcher`; a failure there never undoes the recorded reminder.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use crate::core::types::Tier;
use crate::infra::config::DispatchConfig;

/// What the push collaborator is asked to deliver.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchIntent {
    pub reminder_id: String,
    pub user_id: String,
    pub goal_id: String,
    pub goal_title: String,
    pub tier: Tier,
    pub local_date: NaiveDate,
    /// `HH:MM` in the user's timezone when the decision was made.
    pub local_time: String,
    pub timezone: String,
    pub social_context: Option<String>,
    pub copy: String,
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(&self, intent: &DispatchIntent) -> anyhow::Result<()>;
}

/// Records intents in the log only. Used when no push endpoint is set.
pub struct LogDispatcher;

#[async_trait]
impl Dispatcher for LogDispatcher {
    async fn dispatch(&self, intent: &DispatchIntent) -> anyhow::Result<()> {
        tracing::info!(
            user_id = %intent.user_id,
            goal_id = %intent.goal_id,
            tier = intent.tier.as_str(),
            local_time = %intent.local_time,
            "Reminder: {}",
            intent.copy
        );
        Ok(())
    }
}

/// POSTs each intent as JSON to a push service. Non-2xx is a failure.
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url: String,
}

impl WebhookDispatcher {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    event: &'static str,
    timestamp: String,
    data: &'a DispatchIntent,
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    async fn dispatch(&self, intent: &DispatchIntent) -> anyhow::Result<()> {
        let payload = WebhookPayload {
            event: "reminder.dispatch",
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: intent,
        };
        self.client
            .post(&self.url)
            .json(&payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// Webhook dispatcher when a URL is configured, otherwise log-only.
pub fn from_config(config: &DispatchConfig) -> anyhow::Result<Box<dyn Dispatcher>> {
    match config.webhook_url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(Box::new(WebhookDispatcher::new(
            url.trim(),
            Duration::from_secs(config.timeout_secs),
        )?)),
        _ => Ok(Box::new(LogDispatcher)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intent() -> DispatchIntent {
        DispatchIntent {
            reminder_id: "r-1".into(),
            user_id: "u-1".into(),
            goal_id: "g-1".into(),
            goal_title: "Stretch".into(),
            tier: Tier::LastChance,
            local_date: NaiveDate::from_ymd_opt(2025, 5, 1).unwrap(),
            local_time: "21:00".into(),
            timezone: "Europe/Paris".into(),
            social_context: None,
            copy: "Last call".into(),
        }
    }

    #[test]
    fn test_intent_serializes_tier_snake_case() {
        let json = serde_json::to_value(intent()).unwrap();
        assert_eq!(json["tier"], "last_chance");
        assert_eq!(json["local_date"], "2025-05-01");
    }

    #[tokio::test]
    async fn test_log_dispatcher_succeeds() {
        assert!(LogDispatcher.dispatch(&intent()).await.is_ok());
    }

    #[tokio::test]
    async fn test_webhook_unreachable_is_error() {
        let dispatcher =
            WebhookDispatcher::new("http://127.0.0.1:9/push", Duration::from_millis(200)).unwrap();
        assert!(dispatcher.dispatch(&intent()).await.is_err());
    }

    #[test]
    fn test_from_config_without_url() {
        assert!(from_config(&DispatchConfig::default()).is_ok());
    }
}
