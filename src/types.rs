//! Memory records and the links between them

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for memories
pub type MemoryId = String;

/// A unit of recorded knowledge
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Memory {
    /// Unique identifier
    pub id: MemoryId,
    /// The memory content
    pub content: String,
    /// Free-form category tag (e.g. "emotional", "architectural", "learnings")
    pub kind: String,
    /// Display-only severity tag; never used for ranking
    pub impact: ImpactLevel,
    /// Present only once an embedding has been computed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    /// When the memory was created
    pub created_at: DateTime<Utc>,
    /// When the memory was last updated
    pub updated_at: DateTime<Utc>,
    /// Set when a newer memory replaces this one
    pub superseded_by: Option<MemoryId>,
    /// Additional metadata (flexible key-value storage)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Memory {
    /// Create a new memory with a fresh id
    pub fn new(content: impl Into<String>, kind: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            kind: kind.into(),
            impact: ImpactLevel::Medium,
            embedding: None,
            created_at: now,
            updated_at: now,
            superseded_by: None,
            metadata: None,
        }
    }

    /// Set the impact tag
    pub fn with_impact(mut self, impact: ImpactLevel) -> Self {
        self.impact = impact;
        self
    }

    /// Attach a precomputed embedding
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Set metadata
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Whether this memory can participate in similarity scoring
    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    /// Whether a newer memory has replaced this one
    pub fn is_superseded(&self) -> bool {
        self.superseded_by.is_some()
    }
}

/// Display-only impact levels
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImpactLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImpactLevel::Low => write!(f, "low"),
            ImpactLevel::Medium => write!(f, "medium"),
            ImpactLevel::High => write!(f, "high"),
            ImpactLevel::Critical => write!(f, "critical"),
        }
    }
}

/// A directed relation between two memories (graph edge)
///
/// The pair (source_id, target_id) is unique per direction; writing the
/// same pair again overwrites the stored row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemoryLink {
    /// Source memory ID
    pub source_id: MemoryId,
    /// Target memory ID
    pub target_id: MemoryId,
    /// Type of relationship
    pub link_type: LinkType,
    /// The similarity score that justified the link
    pub similarity: f32,
    /// When the link was created
    pub created_at: DateTime<Utc>,
}

impl MemoryLink {
    /// Create a new link
    pub fn new(
        source_id: impl Into<MemoryId>,
        target_id: impl Into<MemoryId>,
        link_type: LinkType,
        similarity: f32,
    ) -> Self {
        Self {
            source_id: source_id.into(),
            target_id: target_id.into(),
            link_type,
            similarity,
            created_at: Utc::now(),
        }
    }

    /// Create a relates-to link, the kind the auto-linker produces
    pub fn relates_to(
        source_id: impl Into<MemoryId>,
        target_id: impl Into<MemoryId>,
        similarity: f32,
    ) -> Self {
        Self::new(source_id, target_id, LinkType::RelatesTo, similarity)
    }
}

/// Types of relationships between memories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    /// General semantic similarity
    RelatesTo,
    /// This memory extends another
    BuildsOn,
    /// Conflicting information
    Contradicts,
    /// Newer version of an older memory
    Supersedes,
}

impl std::fmt::Display for LinkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkType::RelatesTo => write!(f, "relates_to"),
            LinkType::BuildsOn => write!(f, "builds_on"),
            LinkType::Contradicts => write!(f, "contradicts"),
            LinkType::Supersedes => write!(f, "supersedes"),
        }
    }
}
