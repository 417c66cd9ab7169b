//! Serde shapes for the backend's wire contract.
//!
//! The backend speaks Portuguese field names; everything internal stays
//! English, so the translation is confined to this module.

use parley_core::api::{ChatReply, OutboundMessage};
use parley_core::conversation::{
    ConversationDetail, ConversationSummary, PersistedMessage, PersistedRole,
};
use parley_core::error::{ChatError, Result};
use parley_core::session::MessageRole;
use serde::{Deserialize, Serialize};

/// Role values as the backend spells them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    Usuario,
    Agente,
    Sistema,
}

impl From<MessageRole> for WireRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::User => WireRole::Usuario,
            MessageRole::Assistant => WireRole::Agente,
        }
    }
}

impl From<WireRole> for PersistedRole {
    fn from(role: WireRole) -> Self {
        match role {
            WireRole::Usuario => PersistedRole::User,
            WireRole::Agente => PersistedRole::Assistant,
            WireRole::Sistema => PersistedRole::System,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatRequest {
    pub mensagens: Vec<ChatRequestMessage>,
    pub contexto: Option<String>,
    pub conversa_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatRequestMessage {
    pub papel: WireRole,
    pub conteudo: String,
}

impl ChatRequest {
    /// Builds the request body from the outbound history. Context and
    /// conversation id are trimmed; empty-after-trim becomes null.
    pub fn build(
        history: &[OutboundMessage],
        context: Option<&str>,
        conversation_id: Option<&str>,
    ) -> Self {
        Self {
            mensagens: history
                .iter()
                .map(|message| ChatRequestMessage {
                    papel: message.role.into(),
                    conteudo: message.content.clone(),
                })
                .collect(),
            contexto: non_empty(context),
            conversa_id: non_empty(conversation_id),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub resposta: Option<String>,
    pub conversa_id: Option<String>,
    pub arquivo: Option<String>,
    pub contexto: Option<String>,
}

impl ChatResponse {
    /// Validates the structural requirements of a successful chat
    /// response. Missing reply content or conversation id is a protocol
    /// violation, not a transport failure.
    pub fn into_reply(self) -> Result<ChatReply> {
        let reply = self
            .resposta
            .filter(|r| !r.is_empty())
            .ok_or_else(|| ChatError::Protocol("chat response is missing the reply content".into()))?;
        let conversation_id = self
            .conversa_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ChatError::Protocol("chat response is missing the conversation id".into()))?;
        Ok(ChatReply {
            reply,
            conversation_id,
            storage_locator: self.arquivo,
            context: self.contexto,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireSummary {
    pub id: String,
    pub titulo: String,
    #[serde(default)]
    pub contexto: Option<String>,
    pub arquivo: String,
    pub criado_em: String,
    pub atualizado_em: String,
}

impl From<WireSummary> for ConversationSummary {
    fn from(wire: WireSummary) -> Self {
        Self {
            id: wire.id,
            title: wire.titulo,
            context: wire.contexto,
            storage_locator: wire.arquivo,
            created_at: wire.criado_em,
            updated_at: wire.atualizado_em,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireDetail {
    #[serde(flatten)]
    pub summary: WireSummary,
    #[serde(default)]
    pub mensagens: Vec<WireDetailMessage>,
}

#[derive(Debug, Deserialize)]
pub struct WireDetailMessage {
    pub papel: WireRole,
    pub conteudo: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl From<WireDetail> for ConversationDetail {
    fn from(wire: WireDetail) -> Self {
        Self {
            summary: wire.summary.into(),
            messages: wire
                .mensagens
                .into_iter()
                .map(|message| PersistedMessage {
                    role: message.papel.into(),
                    content: message.conteudo,
                    timestamp: message.timestamp,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_to_server_spelling() {
        assert_eq!(
            serde_json::to_string(&WireRole::Usuario).unwrap(),
            "\"usuario\""
        );
        assert_eq!(
            serde_json::to_string(&WireRole::Agente).unwrap(),
            "\"agente\""
        );
        assert_eq!(
            serde_json::to_string(&WireRole::Sistema).unwrap(),
            "\"sistema\""
        );
    }

    #[test]
    fn chat_request_trims_context_and_id() {
        let history = vec![OutboundMessage {
            role: MessageRole::User,
            content: "hi".to_string(),
        }];
        let request = ChatRequest::build(&history, Some("  bakery  "), Some("   "));
        assert_eq!(request.contexto.as_deref(), Some("bakery"));
        assert_eq!(request.conversa_id, None);
        assert_eq!(request.mensagens[0].papel, WireRole::Usuario);
    }

    #[test]
    fn valid_chat_response_converts() {
        let response = ChatResponse {
            resposta: Some("ok".to_string()),
            conversa_id: Some("abc".to_string()),
            arquivo: Some("abc.json".to_string()),
            contexto: None,
        };
        let reply = response.into_reply().unwrap();
        assert_eq!(reply.reply, "ok");
        assert_eq!(reply.conversation_id, "abc");
        assert_eq!(reply.storage_locator.as_deref(), Some("abc.json"));
    }

    #[test]
    fn missing_reply_content_is_a_protocol_error() {
        let response = ChatResponse {
            resposta: None,
            conversa_id: Some("abc".to_string()),
            arquivo: None,
            contexto: None,
        };
        assert!(matches!(
            response.into_reply().unwrap_err(),
            ChatError::Protocol(_)
        ));
    }

    #[test]
    fn missing_conversation_id_is_a_protocol_error() {
        let response = ChatResponse {
            resposta: Some("ok".to_string()),
            conversa_id: None,
            arquivo: None,
            contexto: None,
        };
        assert!(matches!(
            response.into_reply().unwrap_err(),
            ChatError::Protocol(_)
        ));
    }

    #[test]
    fn detail_parses_with_flattened_summary() {
        let body = r#"{
            "id": "abc",
            "titulo": "Bakery",
            "contexto": "bakery site",
            "arquivo": "abc.json",
            "criado_em": "2024-01-01T00:00:00Z",
            "atualizado_em": "2024-01-02T00:00:00Z",
            "mensagens": [
                {"papel": "usuario", "conteudo": "hi"},
                {"papel": "agente", "conteudo": "hello", "timestamp": "2024-01-01T00:00:01Z"},
                {"papel": "sistema", "conteudo": "note"}
            ]
        }"#;
        let detail: ConversationDetail =
            serde_json::from_str::<WireDetail>(body).unwrap().into();
        assert_eq!(detail.summary.id, "abc");
        assert_eq!(detail.summary.title, "Bakery");
        assert_eq!(detail.messages.len(), 3);
        assert_eq!(detail.messages[0].role, PersistedRole::User);
        assert_eq!(detail.messages[2].role, PersistedRole::System);
        assert_eq!(detail.messages[1].timestamp.as_deref(), Some("2024-01-01T00:00:01Z"));
    }
}
