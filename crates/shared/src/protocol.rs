use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

/// Name of the single reply contract this workspace speaks: the `response` field of the
/// envelope carries a serialized [`EmbeddedRecordPayload`].
pub const EMBEDDED_RECORD_CONTRACT: &str = "embedded-record/v2";

pub const DEFAULT_CONTENT_FIELD: &str = "content";
pub const LEGACY_CONTENT_FIELD: &str = "human_say";

/// Outbound chat request. The message travels under a configurable key because deployed
/// backends disagree on its name (`content` vs `human_say`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub content_field: String,
    pub message: String,
}

impl ChatRequest {
    pub fn new(content_field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            content_field: content_field.into(),
            message: message.into(),
        }
    }
}

impl Serialize for ChatRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.content_field, &self.message)?;
        map.end()
    }
}

/// Inbound view of a chat request on the backend side; accepts either field name.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundChatMessage {
    #[serde(alias = "human_say")]
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatEnvelope {
    pub response: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageIdValue {
    Text(String),
    Number(serde_json::Number),
}

impl StageIdValue {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

/// Wire shape of the reasoning payload embedded in [`ChatEnvelope::response`].
///
/// Every field is optional here; presence of the required ones is checked by the parser so
/// that an absent field and a malformed document stay distinguishable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbeddedRecordPayload {
    #[serde(
        default,
        alias = "current_conversation_stage_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_stage_id: Option<StageIdValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_conversation_stage: Option<String>,
    #[serde(
        default,
        alias = "customer_information_summary",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer_information: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_inputs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_thought: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_response: Option<String>,
}
