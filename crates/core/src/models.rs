//! Shared Data Models
//!
//! Conversation messages, the closed set of agent kinds a request can be
//! routed to, routing decisions, and the retrieval/citation types produced
//! by the RAG pipeline. Everything here is plain data: construction happens
//! in the router and pipeline crates, persistence (if any) happens in
//! external collaborators.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Agent kinds
// ---------------------------------------------------------------------------

/// The closed set of specialized task handlers a request can be routed to.
///
/// The set is fixed at compile time; there are no dynamic categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// File and folder operations
    File,
    /// Email operations
    Mail,
    /// API key and credential management
    Credential,
    /// Workflow automation and triggers
    Workflow,
    /// Permission and access control
    Security,
    /// General conversation and Q&A
    Chat,
    /// Code generation, review, and debugging
    Code,
    /// Document search and information retrieval
    Search,
}

impl AgentKind {
    /// All agent kinds, in declaration order.
    pub fn all() -> &'static [AgentKind] {
        &[
            Self::File,
            Self::Mail,
            Self::Credential,
            Self::Workflow,
            Self::Security,
            Self::Chat,
            Self::Code,
            Self::Search,
        ]
    }

    /// Canonical lowercase name, matching the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Mail => "mail",
            Self::Credential => "credential",
            Self::Workflow => "workflow",
            Self::Security => "security",
            Self::Chat => "chat",
            Self::Code => "code",
            Self::Search => "search",
        }
    }

    /// One-line capability description, used by the fallback classifier
    /// prompt to enumerate the available handlers.
    pub fn description(&self) -> &'static str {
        match self {
            Self::File => "File and folder operations (read, write, create, delete, list files)",
            Self::Mail => "Email operations (send, compose, manage inbox)",
            Self::Credential => "API key and credential management (generate, rotate, revoke)",
            Self::Workflow => "Workflow automation and pipeline triggers",
            Self::Security => "Permission and access control",
            Self::Chat => "General conversation and Q&A",
            Self::Code => "Code generation, review, and debugging",
            Self::Search => "Document search and information retrieval",
        }
    }

    /// Parse a normalized (lowercase, punctuation-free) name into a kind.
    ///
    /// Tolerates the aliases a language model is likely to reply with
    /// ("email" for mail, "key" for credential). Unknown names yield `None`,
    /// never an error.
    pub fn parse(name: &str) -> Option<AgentKind> {
        match name {
            "file" | "files" => Some(Self::File),
            "mail" | "email" => Some(Self::Mail),
            "credential" | "credentials" | "key" => Some(Self::Credential),
            "workflow" => Some(Self::Workflow),
            "security" => Some(Self::Security),
            "chat" => Some(Self::Chat),
            "code" => Some(Self::Code),
            "search" => Some(Self::Search),
            _ => None,
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Conversation messages
// ---------------------------------------------------------------------------

/// Role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
    Tool,
}

impl MessageRole {
    /// Wire-level role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
            Self::Tool => "tool",
        }
    }
}

/// A single message in a conversation.
///
/// Conversation history is owned and persisted by an external collaborator;
/// the core treats it as a caller-supplied, read-then-append sequence and
/// performs no locking over it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Message {
    /// Create a new message with a fresh id and the current timestamp.
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Shorthand for a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Shorthand for an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }
}

// ---------------------------------------------------------------------------
// Routing decisions
// ---------------------------------------------------------------------------

/// How the router arrived at its decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteMethod {
    /// The caller forced a specific handler.
    Forced,
    /// Pattern scoring produced an unambiguous winner.
    Pattern,
    /// The fallback classifier named the handler.
    Llm,
    /// Nothing matched and classification failed; the chat handler is used.
    Default,
    /// Multiple close matches were resolved by static priority weights.
    PriorityWeighted,
}

impl RouteMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Forced => "forced",
            Self::Pattern => "pattern",
            Self::Llm => "llm",
            Self::Default => "default",
            Self::PriorityWeighted => "priority_weighted",
        }
    }
}

/// The outcome of routing one request.
///
/// Produced fresh per request, never persisted, read-only once produced.
/// `confidence` is a heuristic in [0, 1], not a calibrated probability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub agent: AgentKind,
    pub method: RouteMethod,
    pub confidence: f64,
    /// Raw pattern hit counts, attached when pattern scoring ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scores: Option<HashMap<AgentKind, u32>>,
}

// ---------------------------------------------------------------------------
// Retrieval results and citations
// ---------------------------------------------------------------------------

/// A document chunk returned by a similarity search.
///
/// Ephemeral, produced per search call. `metadata` carries the stored
/// payload minus the chunk text itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, Value>,
    pub score: f32,
}

/// A reference back to a retrieved chunk that grounded a generated answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    /// 1-based ordinal, matching the source labels in the context block.
    pub index: usize,
    /// Owning document id of the cited chunk.
    pub source: String,
    /// Truncated text preview, at most 200 characters.
    pub excerpt: String,
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // AgentKind tests
    // =========================================================================

    #[test]
    fn agent_kind_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&AgentKind::Credential).unwrap(),
            "\"credential\""
        );
        let kind: AgentKind = serde_json::from_str("\"file\"").unwrap();
        assert_eq!(kind, AgentKind::File);
    }

    #[test]
    fn agent_kind_all_returns_eight_variants() {
        assert_eq!(AgentKind::all().len(), 8);
    }

    #[test]
    fn agent_kind_parse_canonical_names() {
        for kind in AgentKind::all() {
            assert_eq!(AgentKind::parse(kind.as_str()), Some(*kind));
        }
    }

    #[test]
    fn agent_kind_parse_aliases() {
        assert_eq!(AgentKind::parse("email"), Some(AgentKind::Mail));
        assert_eq!(AgentKind::parse("key"), Some(AgentKind::Credential));
    }

    #[test]
    fn agent_kind_parse_unknown_is_none() {
        assert_eq!(AgentKind::parse("quantum"), None);
        assert_eq!(AgentKind::parse(""), None);
    }

    #[test]
    fn agent_kind_display_matches_as_str() {
        assert_eq!(AgentKind::Workflow.to_string(), "workflow");
    }

    // =========================================================================
    // Message tests
    // =========================================================================

    #[test]
    fn message_new_assigns_identity() {
        let a = Message::user("hello");
        let b = Message::user("hello");
        assert_ne!(a.id, b.id);
        assert_eq!(a.role, MessageRole::User);
        assert_eq!(a.content, "hello");
    }

    #[test]
    fn message_serde_roundtrip() {
        let msg = Message::assistant("done");
        let json = serde_json::to_string(&msg).unwrap();
        let back: Message = serde_json::from_str(&json).unwrap();
        assert_eq!(back.id, msg.id);
        assert_eq!(back.role, MessageRole::Assistant);
        assert_eq!(back.content, "done");
    }

    // =========================================================================
    // RoutingDecision tests
    // =========================================================================

    #[test]
    fn route_method_wire_names() {
        assert_eq!(RouteMethod::PriorityWeighted.as_str(), "priority_weighted");
        assert_eq!(
            serde_json::to_string(&RouteMethod::Llm).unwrap(),
            "\"llm\""
        );
    }

    #[test]
    fn routing_decision_skips_absent_scores() {
        let decision = RoutingDecision {
            agent: AgentKind::Chat,
            method: RouteMethod::Default,
            confidence: 0.5,
            scores: None,
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(!json.contains("scores"));
    }

    #[test]
    fn routing_decision_serializes_score_map() {
        let mut scores = HashMap::new();
        scores.insert(AgentKind::File, 3u32);
        let decision = RoutingDecision {
            agent: AgentKind::File,
            method: RouteMethod::Pattern,
            confidence: 0.9,
            scores: Some(scores),
        };
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["scores"]["file"], 3);
    }
}
