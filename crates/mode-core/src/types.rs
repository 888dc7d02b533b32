//! Chat transcript types as delivered by the host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mode::Mode;

/// Message role.
///
/// Roles other than `user` and `assistant` survive a round trip but are treated
/// as unrecognised by the transform engine. A missing role reads as an empty
/// `Other` and is not written back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    Other(String),
}

impl Role {
    /// Whether this role is one the transform engine understands.
    #[must_use]
    pub const fn is_recognized(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }

    /// Whether the host sent no role at all.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Other(role) if role.is_empty())
    }
}

impl Default for Role {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.as_str() {
            "user" => Self::User,
            "assistant" => Self::Assistant,
            _ => Self::Other(value),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::User => "user".to_string(),
            Role::Assistant => "assistant".to_string(),
            Role::Other(other) => other,
        }
    }
}

/// Kind of a message part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PartKind {
    Text,
    Image,
    Code,
    /// Host part kinds this crate does not interpret (tool calls, reasoning, ...).
    Other(String),
}

impl PartKind {
    /// Whether the host sent no part type at all.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Other(kind) if kind.is_empty())
    }
}

impl Default for PartKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for PartKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "text" => Self::Text,
            "image" => Self::Image,
            "code" => Self::Code,
            _ => Self::Other(value),
        }
    }
}

impl From<PartKind> for String {
    fn from(kind: PartKind) -> Self {
        match kind {
            PartKind::Text => "text".to_string(),
            PartKind::Image => "image".to_string(),
            PartKind::Code => "code".to_string(),
            PartKind::Other(other) => other,
        }
    }
}

/// One part of a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePart {
    /// Part kind.
    #[serde(rename = "type", default, skip_serializing_if = "PartKind::is_missing")]
    pub kind: PartKind,

    /// Text payload (only meaningful for text parts).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Whether this part was generated by the plugin rather than a participant.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub synthetic: bool,

    /// Host fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessagePart {
    /// Create a text part.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: PartKind::Text,
            text: Some(text.into()),
            synthetic: false,
            extra: Map::new(),
        }
    }

    /// Create a synthetic text part.
    #[must_use]
    pub fn synthetic_text(text: impl Into<String>) -> Self {
        let mut part = Self::text(text);
        part.synthetic = true;
        part
    }

    /// Create a part of any kind without a payload.
    #[must_use]
    pub fn of_kind(kind: PartKind) -> Self {
        Self {
            kind,
            text: None,
            synthetic: false,
            extra: Map::new(),
        }
    }

    /// Check if this is a text part.
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.kind == PartKind::Text
    }

    /// Text payload of a text part, if any.
    #[must_use]
    pub fn text_payload(&self) -> Option<&str> {
        if self.is_text() {
            self.text.as_deref()
        } else {
            None
        }
    }
}

/// Message metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageInfo {
    /// Author role.
    #[serde(default, skip_serializing_if = "Role::is_missing")]
    pub role: Role,

    /// Agent (mode-tag) that produced the message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,

    /// Host fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A message in the host transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Message metadata.
    pub info: MessageInfo,

    /// Ordered message parts.
    pub parts: Vec<MessagePart>,

    /// Host fields this crate does not interpret.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    /// Create a message from parts.
    #[must_use]
    pub fn new(role: Role, agent: Option<&str>, parts: Vec<MessagePart>) -> Self {
        Self {
            info: MessageInfo {
                role,
                agent: agent.map(ToString::to_string),
                extra: Map::new(),
            },
            parts,
            extra: Map::new(),
        }
    }

    /// Create a message holding a single text part.
    #[must_use]
    pub fn with_text(role: Role, agent: Option<&str>, text: impl Into<String>) -> Self {
        Self::new(role, agent, vec![MessagePart::text(text)])
    }

    /// Operating mode this message was produced in.
    #[must_use]
    pub fn mode(&self) -> Option<Mode> {
        self.info.agent.as_deref().and_then(Mode::from_tag)
    }

    /// Check if this is an assistant message.
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.info.role == Role::Assistant
    }

    /// Check if any text part contains `needle`.
    #[must_use]
    pub fn contains_text(&self, needle: &str) -> bool {
        self.parts
            .iter()
            .filter_map(MessagePart::text_payload)
            .any(|text| text.contains(needle))
    }

    /// Index of the last text part.
    #[must_use]
    pub fn last_text_part(&self) -> Option<usize> {
        self.parts.iter().rposition(MessagePart::is_text)
    }

    /// Non-empty text payloads joined with a blank line.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.parts
            .iter()
            .filter_map(MessagePart::text_payload)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Output object handed to the messages-transform hook.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    /// Transcript, oldest message first.
    pub messages: Vec<ChatMessage>,
}

impl TransformOutput {
    /// Interpret an arbitrary hook payload as a transcript.
    ///
    /// Returns `None` when the payload lacks a `messages` array of `{info, parts}`
    /// objects. Entries with a missing role or part type are kept as they are.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let messages = value.get("messages")?.as_array()?;
        let well_formed = messages.iter().all(|message| {
            message.get("info").is_some_and(Value::is_object)
                && message.get("parts").is_some_and(Value::is_array)
        });
        if !well_formed {
            return None;
        }
        serde_json::from_value(value.clone()).ok()
    }
}
