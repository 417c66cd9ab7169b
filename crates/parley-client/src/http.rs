//! HTTP implementation of the conversation backend seam.

use crate::config::ApiConfig;
use crate::wire::{ChatRequest, ChatResponse, WireDetail, WireSummary};
use async_trait::async_trait;
use parley_core::api::{ChatReply, ConversationApi, OutboundMessage};
use parley_core::conversation::{ConversationDetail, ConversationSummary};
use parley_core::error::{ChatError, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde_json::Value;

/// Stateless request/response wrapper around the backend's conversation
/// and chat endpoints. Performs no retries; every transport outcome is
/// translated into a [`ChatError`].
pub struct HttpConversationClient {
    client: Client,
    config: ApiConfig,
}

impl HttpConversationClient {
    /// Creates a client with the given resolved configuration.
    pub fn new(config: ApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Creates a client reusing an existing reqwest instance.
    pub fn with_client(client: Client, config: ApiConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// URL of a single conversation resource. The id is pushed as a path
    /// segment so it gets percent-encoded.
    fn conversation_url(&self, id: &str) -> Result<Url> {
        let mut url = Url::parse(&self.config.conversations_endpoint())
            .map_err(|err| ChatError::Protocol(format!("invalid base url: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ChatError::Protocol("base url cannot carry path segments".into()))?
            .push(id);
        Ok(url)
    }

    /// Turns a non-success response into the typed error. `not_found_id`
    /// enables the NotFound mapping for resource-scoped requests.
    async fn error_for(&self, response: Response, not_found_id: Option<&str>) -> ChatError {
        let status = response.status();
        if let Some(id) = not_found_id {
            if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
                return ChatError::not_found(id);
            }
        }
        let body = response.text().await.unwrap_or_default();
        ChatError::api(status.as_u16(), extract_error_message(status, &body))
    }
}

#[async_trait]
impl ConversationApi for HttpConversationClient {
    async fn send_message(
        &self,
        history: &[OutboundMessage],
        context: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Result<ChatReply> {
        if history.is_empty() {
            return Err(ChatError::EmptyHistory);
        }
        let body = ChatRequest::build(history, context, conversation_id);
        let endpoint = self.config.chat_endpoint();
        tracing::debug!(endpoint = %endpoint, messages = history.len(), "sending chat request");

        let response = self
            .client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.error_for(response, None).await);
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|err| ChatError::Protocol(format!("failed to parse chat response: {err}")))?;
        parsed.into_reply()
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>> {
        let response = self
            .client
            .get(self.config.conversations_endpoint())
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.error_for(response, None).await);
        }

        let summaries: Vec<WireSummary> = response.json().await.map_err(|err| {
            ChatError::Protocol(format!("failed to parse conversation list: {err}"))
        })?;
        Ok(summaries.into_iter().map(Into::into).collect())
    }

    async fn get_conversation(&self, id: &str) -> Result<ConversationDetail> {
        let response = self
            .client
            .get(self.conversation_url(id)?)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.error_for(response, Some(id)).await);
        }

        let detail: WireDetail = response.json().await.map_err(|err| {
            ChatError::Protocol(format!("failed to parse conversation detail: {err}"))
        })?;
        Ok(detail.into())
    }

    async fn delete_conversation(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.conversation_url(id)?)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            return Err(self.error_for(response, Some(id)).await);
        }
        Ok(())
    }
}

fn transport_error(err: reqwest::Error) -> ChatError {
    ChatError::Transport(err.to_string())
}

/// Extracts a human-readable message from an error body.
///
/// Lookup order mirrors the backend's conventions: `detail` as a string,
/// `detail` as a list of sub-errors joined into one multi-line message,
/// a `message` field, a bare string body, then a generic status-coded
/// fallback.
fn extract_error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(detail) = value.get("detail") {
            if let Some(text) = detail.as_str() {
                return text.to_string();
            }
            if let Some(items) = detail.as_array() {
                let parts: Vec<String> = items.iter().map(sub_error_text).collect();
                if !parts.is_empty() {
                    return parts.join("\n");
                }
            }
        }
        if let Some(message) = value.get("message").and_then(Value::as_str) {
            return message.to_string();
        }
        if let Some(text) = value.as_str() {
            return text.to_string();
        }
    }
    format!("request failed with status {}", status.as_u16())
}

fn sub_error_text(item: &Value) -> String {
    if let Some(text) = item.as_str() {
        return text.to_string();
    }
    if let Some(msg) = item.get("msg").and_then(Value::as_str) {
        return msg.to_string();
    }
    if let Some(detail) = item.get("detail").and_then(Value::as_str) {
        return detail.to_string();
    }
    item.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_wins() {
        let message = extract_error_message(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"detail": "boom"}"#,
        );
        assert_eq!(message, "boom");
    }

    #[test]
    fn detail_list_joins_sub_errors() {
        let message = extract_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": ["first", {"msg": "second"}, {"detail": "third"}]}"#,
        );
        assert_eq!(message, "first\nsecond\nthird");
    }

    #[test]
    fn opaque_sub_errors_are_reserialized() {
        let message = extract_error_message(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"detail": [{"loc": ["body"]}]}"#,
        );
        assert_eq!(message, r#"{"loc":["body"]}"#);
    }

    #[test]
    fn message_field_is_the_fallback() {
        let message =
            extract_error_message(StatusCode::BAD_GATEWAY, r#"{"message": "upstream died"}"#);
        assert_eq!(message, "upstream died");
    }

    #[test]
    fn bare_string_body_is_used() {
        let message = extract_error_message(StatusCode::BAD_REQUEST, r#""nope""#);
        assert_eq!(message, "nope");
    }

    #[test]
    fn unparsable_body_yields_generic_message() {
        let message = extract_error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(message, "request failed with status 500");
    }

    #[test]
    fn conversation_url_percent_encodes_the_id() {
        let client = HttpConversationClient::new(ApiConfig::default());
        let url = client.conversation_url("weird id/with slash").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:8000/v1/conversas/weird%20id%2Fwith%20slash"
        );
    }
}
