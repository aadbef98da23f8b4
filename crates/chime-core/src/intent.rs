//! Intent endpoint client.
//!
//! The assistant backend turns a free-text utterance into an answer and,
//! for "remind me ..." requests, a `reminder_data` object. The client only
//! extracts that object; storing it is up to the caller.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::error::CoreError;
use crate::reminder::Reminder;
use crate::storage::IntentConfig;

const REMINDER_KIND: &str = "reminder";

/// Response body of `POST {base_url}/intent`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct IntentReply {
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub reminder_data: Option<Reminder>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

impl IntentReply {
    /// The reminder to store, if this reply created one.
    pub fn reminder(&self) -> Option<&Reminder> {
        match self.kind.as_deref() {
            Some(REMINDER_KIND) => self.reminder_data.as_ref(),
            _ => None,
        }
    }
}

/// Extract the reminder from a raw intent response body.
///
/// Returns `Ok(None)` for valid replies that are not reminder creations.
pub fn parse_reminder_response(body: &str) -> Result<Option<Reminder>, CoreError> {
    let reply: IntentReply = serde_json::from_str(body)?;
    Ok(reply.reminder().cloned())
}

pub struct IntentClient {
    endpoint: Url,
    client: Client,
    timeout: Duration,
}

impl IntentClient {
    pub fn new(config: &IntentConfig) -> Result<Self, CoreError> {
        let raw = format!("{}/intent", config.base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw)
            .map_err(|e| CoreError::Intent(format!("invalid intent url '{raw}': {e}")))?;
        Ok(Self {
            endpoint,
            client: Client::new(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Send one utterance. Non-2xx statuses are errors.
    pub async fn ask(&self, text: &str) -> Result<IntentReply, CoreError> {
        let request = self
            .client
            .post(self.endpoint.clone())
            .json(&json!({ "text": text }))
            .send();
        let resp = tokio::time::timeout(self.timeout, request).await??;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(CoreError::Intent(format!("HTTP {status}: {body}")));
        }
        let body = resp.text().await?;
        let reply: IntentReply = serde_json::from_str(&body)?;
        Ok(IntentReply {
            // Same fallback a chat client shows: the raw reply when there is no answer.
            answer: reply.answer.clone().or(Some(body)),
            ..reply
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[test]
    fn parses_reminder_reply() {
        let body = r#"{
            "answer": "Reminder/Alarm added: Call mom on 2030-05-01 at 18:00",
            "type": "reminder",
            "reminder_data": {"text": "Call mom", "datetime": "2030-05-01 18:00"}
        }"#;
        let reminder = parse_reminder_response(body).unwrap().unwrap();
        assert_eq!(reminder, Reminder::new("Call mom", "2030-05-01 18:00"));
    }

    #[test]
    fn other_intents_carry_no_reminder() {
        let body = r#"{"answer": "Opening: https://example.com", "redirect_url": "https://example.com"}"#;
        assert_eq!(parse_reminder_response(body).unwrap(), None);

        // reminder_data without the reminder type is not a reminder creation
        let body = r#"{"answer": "x", "reminder_data": {"text": "a", "datetime": "b"}}"#;
        assert_eq!(parse_reminder_response(body).unwrap(), None);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(matches!(
            parse_reminder_response("not json"),
            Err(CoreError::Json(_))
        ));
    }

    #[test]
    fn rejects_invalid_base_url() {
        let config = IntentConfig {
            base_url: "not a url".into(),
            ..IntentConfig::default()
        };
        assert!(IntentClient::new(&config).is_err());
    }

    #[test]
    fn endpoint_appends_intent_path() {
        let config = IntentConfig {
            base_url: "http://localhost:8000/mcp/".into(),
            ..IntentConfig::default()
        };
        let client = IntentClient::new(&config).unwrap();
        assert_eq!(client.endpoint().as_str(), "http://localhost:8000/mcp/intent");
    }

    #[tokio::test]
    async fn ask_posts_text_and_reads_reminder() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/mcp/intent")
            .match_body(Matcher::Json(json!({"text": "remind me to stretch at 5pm"})))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"answer":"added","type":"reminder",
                    "reminder_data":{"text":"stretch","datetime":"2030-01-01 17:00"}}"#,
            )
            .create_async()
            .await;

        let config = IntentConfig {
            base_url: format!("{}/mcp", server.url()),
            ..IntentConfig::default()
        };
        let client = IntentClient::new(&config).unwrap();
        let reply = client.ask("remind me to stretch at 5pm").await.unwrap();

        mock.assert_async().await;
        assert_eq!(reply.answer.as_deref(), Some("added"));
        assert_eq!(
            reply.reminder(),
            Some(&Reminder::new("stretch", "2030-01-01 17:00"))
        );
    }

    #[tokio::test]
    async fn ask_surfaces_http_errors() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/intent")
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let config = IntentConfig {
            base_url: server.url(),
            ..IntentConfig::default()
        };
        let err = IntentClient::new(&config)
            .unwrap()
            .ask("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Intent(msg) if msg.contains("500")));
    }

    #[tokio::test]
    async fn missing_answer_falls_back_to_raw_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/intent")
            .with_status(200)
            .with_body(r#"{"action":"unknown"}"#)
            .create_async()
            .await;

        let config = IntentConfig {
            base_url: server.url(),
            ..IntentConfig::default()
        };
        let reply = IntentClient::new(&config).unwrap().ask("hm").await.unwrap();
        assert_eq!(reply.answer.as_deref(), Some(r#"{"action":"unknown"}"#));
        assert_eq!(reply.reminder(), None);
    }
}
