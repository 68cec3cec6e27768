//! Social cue detection for conversational recall
//!
//! Social cues are phrasings where the user references shared context
//! rather than time: past discussions, prior agent statements, decisions
//! made together. Examples:
//!
//! - "remember when we discussed caching?"
//! - "you mentioned something about API design"
//! - "as we agreed, the auth should use JWT"
//!
//! A detected cue carries an extracted topic that can drive semantic
//! search over stored memories.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Kinds of social cues that reference shared context
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// "we discussed", "we talked about"
    SharedDiscussion,
    /// "you mentioned", "you said"
    AgentStatement,
    /// "we agreed", "we decided"
    SharedDecision,
    /// "we built", "we implemented"
    CollaborativeWork,
    /// "we know that", "as we understand"
    SharedKnowledge,
    /// "remember when", "do you recall"
    ExplicitRecall,
}

impl std::fmt::Display for CueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CueKind::SharedDiscussion => write!(f, "shared_discussion"),
            CueKind::AgentStatement => write!(f, "agent_statement"),
            CueKind::SharedDecision => write!(f, "shared_decision"),
            CueKind::CollaborativeWork => write!(f, "collaborative_work"),
            CueKind::SharedKnowledge => write!(f, "shared_knowledge"),
            CueKind::ExplicitRecall => write!(f, "explicit_recall"),
        }
    }
}

/// A detected reference to shared context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SocialCue {
    /// What kind of shared context the message references
    pub kind: CueKind,
    /// The exact substring of the lower-cased input that fired
    pub matched_text: String,
    /// Normalized subject, usable as a semantic search query
    pub topic: Option<String>,
    /// True when the original (not lower-cased) input contains `?`
    pub is_question: bool,
}

/// One row of the cue decision table
struct CueRule {
    pattern: Regex,
    kind: CueKind,
    /// Whether group 1 of the pattern captures a topic
    captures_topic: bool,
}

/// Ordered decision table. Position is priority: `detect_social_cue`
/// returns the first row whose pattern fires, so specific phrasings must
/// sit above general ones.
static CUE_RULES: Lazy<Vec<CueRule>> = Lazy::new(|| {
    let rule = |pattern: &str, kind: CueKind| CueRule {
        pattern: Regex::new(pattern).expect("valid cue pattern"),
        kind,
        captures_topic: true,
    };

    vec![
        // Shared discussion
        rule(
            r"as\s+we\s+discussed\s*,\s*(.+?)(?:\.|$)",
            CueKind::SharedDiscussion,
        ),
        rule(
            r"we\s+(?:discussed|talked\s+about|mentioned)\s+(\w+(?:\s+\w+){0,4})",
            CueKind::SharedDiscussion,
        ),
        rule(
            r"(?:when|where)\s+we\s+(?:discussed|talked\s+about)\s+(\w+(?:\s+\w+){0,4})",
            CueKind::SharedDiscussion,
        ),
        // Agent statements (user refers to what the agent said)
        rule(
            r"you\s+(?:mentioned|said|suggested|recommended|noted)\s+(?:that\s+)?(.+?)(?:\.|,|$)",
            CueKind::AgentStatement,
        ),
        rule(
            r"(?:like|as)\s+you\s+(?:said|mentioned|suggested)\s*(?:,\s*)?(.+?)(?:\.|$)",
            CueKind::AgentStatement,
        ),
        rule(
            r"what\s+(?:did\s+)?you\s+(?:say|mention|suggest)\s+about\s+(.+?)(?:\?|$)",
            CueKind::AgentStatement,
        ),
        // Shared decisions
        rule(
            r"we\s+(?:agreed|decided|determined)\s+(?:that\s+)?(.+?)(?:\.|,|$)",
            CueKind::SharedDecision,
        ),
        rule(
            r"(?:our|the)\s+(?:decision|agreement)\s+(?:about|on|regarding)\s+(.+?)(?:\.|,|$)",
            CueKind::SharedDecision,
        ),
        // Collaborative work
        rule(
            r"we\s+(?:built|implemented|created|designed|fixed)\s+(.+?)(?:\.|,|$)",
            CueKind::CollaborativeWork,
        ),
        rule(
            r"(?:when|where)\s+we\s+(?:built|implemented|worked\s+on)\s+(.+?)(?:\?|$)",
            CueKind::CollaborativeWork,
        ),
        // Shared knowledge
        rule(
            r"(?:as\s+)?we\s+(?:know|understand)\s+(?:that\s+)?(.+?)(?:\.|,|$)",
            CueKind::SharedKnowledge,
        ),
        // Explicit recall requests
        rule(
            r"(?:do\s+you\s+)?remember\s+(?:when\s+we\s+)?(.+?)(?:\?|$)",
            CueKind::ExplicitRecall,
        ),
        rule(r"do\s+you\s+recall\s+(.+?)(?:\?|$)", CueKind::ExplicitRecall),
        rule(
            r"can\s+you\s+remind\s+me\s+(?:about\s+)?(.+?)(?:\?|$)",
            CueKind::ExplicitRecall,
        ),
    ]
});

/// Trigger phrases checked by [`requires_recall`]. Every rule's core
/// trigger words appear here, so a message that fails this check cannot
/// match any rule. Over-triggering is fine; the full table decides.
const RECALL_KEYWORDS: &[&str] = &[
    "we discussed",
    "we talked",
    "we mentioned",
    "you mentioned",
    "you mention",
    "you said",
    "you say",
    "you suggest",
    "you recommend",
    "you noted",
    "like you",
    "as you",
    "we agreed",
    "we decided",
    "we determined",
    "decision",
    "agreement",
    "we built",
    "we implemented",
    "we created",
    "we designed",
    "we fixed",
    "we worked",
    "we know",
    "we understand",
    "remember",
    "recall",
    "remind me",
    "as we",
];

/// Detect the first social cue in a message.
///
/// Matching runs over the lower-cased, trimmed input. Rule order decides
/// between overlapping patterns, so repeated calls return the same cue
/// for the same text.
pub fn detect_social_cue(text: &str) -> Option<SocialCue> {
    let lowered = text.trim().to_lowercase();
    let is_question = text.contains('?');

    CUE_RULES.iter().find_map(|rule| {
        rule.pattern
            .captures(&lowered)
            .map(|caps| build_cue(rule, &caps, is_question))
    })
}

/// Detect every social cue in a message.
///
/// Reports each occurrence of each rule independently, in table order:
/// a rule that fires twice contributes two cues.
pub fn detect_all_social_cues(text: &str) -> Vec<SocialCue> {
    let lowered = text.trim().to_lowercase();
    let is_question = text.contains('?');

    let mut cues = Vec::new();
    for rule in CUE_RULES.iter() {
        for caps in rule.pattern.captures_iter(&lowered) {
            cues.push(build_cue(rule, &caps, is_question));
        }
    }
    cues
}

fn build_cue(rule: &CueRule, caps: &regex::Captures<'_>, is_question: bool) -> SocialCue {
    let topic = if rule.captures_topic {
        caps.get(1)
            .map(|m| normalize_topic(m.as_str()))
            .filter(|t| !t.is_empty())
    } else {
        None
    };

    SocialCue {
        kind: rule.kind,
        matched_text: caps[0].to_string(),
        topic,
        is_question,
    }
}

const TRAILING_PUNCT: &[char] = &['.', ',', ';', ':', '!', '?'];

const FILLER_WORDS: &[&str] = &["the", "a", "an", "that", "this", "some", "about"];

/// Canonicalize a raw captured topic.
///
/// Strips trailing punctuation, then leading filler words until the first
/// remaining word is meaningful. The result can be empty; callers treat
/// empty as no topic. Idempotent.
pub fn normalize_topic(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches(TRAILING_PUNCT);
    let words: Vec<&str> = trimmed.split_whitespace().collect();
    let keep = words
        .iter()
        .position(|w| !FILLER_WORDS.contains(&w.to_lowercase().as_str()))
        .unwrap_or(words.len());
    words[keep..].join(" ")
}

/// Build a semantic search query from a detected cue.
///
/// Returns the cue's topic verbatim. A cue without a topic yields `None`;
/// callers treat that as "nothing actionable", not an error.
pub fn extract_recall_query(cue: &SocialCue) -> Option<String> {
    cue.topic.clone()
}

/// Cheap pre-filter: does this message even look like it references
/// shared context? False positives are acceptable and resolved by
/// [`detect_social_cue`]; a `false` here means no rule can match.
pub fn requires_recall(text: &str) -> bool {
    let lowered = text.to_lowercase();
    RECALL_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}
