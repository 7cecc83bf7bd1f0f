//! Intent Router
//!
//! Routes a natural-language request to one of the fixed task handlers.
//! The common case is pure offline pattern scoring; a network-bound
//! fallback classifier runs only for zero-signal input, and the router
//! always produces a usable decision even when classification fails.
//!
//! Escalation order:
//! 1. caller-forced handler
//! 2. pattern scoring (single match, or a clear multi-match winner)
//! 3. static priority weights for near-ties
//! 4. LLM fallback classification for zero-signal input
//! 5. the chat handler as the final default

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use switchboard_core::{AgentKind, Message, RouteMethod, RouterConfig, RoutingDecision};
use switchboard_llm::{GenerationOptions, TextGenerator};

/// How many trailing conversation turns the fallback classifier sees.
const CLASSIFIER_HISTORY_TURNS: usize = 4;

fn intent_re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("intent pattern must compile")
}

/// Intent detectors per handler, in priority order (highest first).
///
/// Each entry's score is the sum of all its detectors' match counts, so a
/// request can accumulate several hits for the same handler. The fixed
/// order of this table is also the tie-break order everywhere scores are
/// compared.
static INTENT_PATTERNS: Lazy<Vec<(AgentKind, Vec<Regex>)>> = Lazy::new(|| {
    vec![
        (
            AgentKind::Code,
            vec![
                intent_re(r"(?i)\b(code|program|function|class|method)\b"),
                intent_re(r"(?i)\b(python|javascript|typescript|rust|go|java)\b"),
                intent_re(r"(?i)\b(debug|fix|refactor|optimize|review)\s+code\b"),
                // Fenced code blocks
                intent_re(r"```[\s\S]*```"),
            ],
        ),
        (
            AgentKind::File,
            vec![
                intent_re(r"(?i)\b(file|folder|directory|read|write|create|delete|move|copy|list)\b"),
                intent_re(r"(?i)\b(upload|download|save|open)\b"),
                // Common document extensions
                intent_re(r"(?i)\.(txt|pdf|doc|json|csv|xml|yaml|md)\b"),
            ],
        ),
        (
            AgentKind::Mail,
            vec![
                intent_re(r"(?i)\b(email|mail|send|inbox|compose|draft|reply)\b"),
                intent_re(r"(?i)\b(newsletter|notification|message)\b"),
                // Email address shape
                intent_re(r"(?i)@[a-z0-9.-]+\.[a-z]{2,}"),
            ],
        ),
        (
            AgentKind::Credential,
            vec![
                intent_re(r"(?i)\b(api.?key|secret|token|credential|password)\b"),
                intent_re(r"(?i)\b(generate|create|rotate|revoke)\s+(key|token|secret)\b"),
                intent_re(r"(?i)\b(authentication|authorization|auth)\b"),
            ],
        ),
        (
            AgentKind::Workflow,
            vec![
                intent_re(r"(?i)\b(workflow|automation|n8n|trigger|pipeline)\b"),
                intent_re(r"(?i)\b(schedule|cron|job|task)\b"),
                intent_re(r"(?i)\b(webhook|integrate|connect)\b"),
            ],
        ),
        (
            AgentKind::Security,
            vec![
                intent_re(r"(?i)\b(permission|access|role|privilege)\b"),
                intent_re(r"(?i)\b(security|firewall|encrypt|decrypt)\b"),
                intent_re(r"(?i)\b(audit|log|monitor|alert)\b"),
            ],
        ),
        (
            AgentKind::Search,
            vec![
                intent_re(r"(?i)\b(search|find|look\s+for|query)\b"),
                intent_re(r"(?i)\b(document|docs|knowledge|information)\b"),
                // Trailing question mark
                intent_re(r"\?\s*$"),
            ],
        ),
        (
            AgentKind::Chat,
            vec![
                intent_re(r"(?i)\b(hello|hi|hey|how\s+are\s+you|thanks|bye)\b"),
                intent_re(r"(?i)\b(explain|tell\s+me|what\s+is|help)\b"),
            ],
        ),
    ]
});

/// Static priority weight per handler, used to resolve near-ties.
fn priority(kind: AgentKind) -> u32 {
    match kind {
        AgentKind::Code => 10,
        AgentKind::File => 9,
        AgentKind::Mail | AgentKind::Credential => 8,
        AgentKind::Workflow | AgentKind::Security => 7,
        AgentKind::Search => 5,
        AgentKind::Chat => 1,
    }
}

/// Score `text` against every handler's detectors.
///
/// Returns (handler, hit count) pairs in priority-table order; handlers
/// with zero hits are omitted. Pure and deterministic.
pub fn pattern_scores(text: &str) -> Vec<(AgentKind, u32)> {
    INTENT_PATTERNS
        .iter()
        .filter_map(|(kind, patterns)| {
            let hits: u32 = patterns
                .iter()
                .map(|p| p.find_iter(text).count() as u32)
                .sum();
            (hits > 0).then_some((*kind, hits))
        })
        .collect()
}

/// Pick the handler with the highest priority-weighted score.
///
/// Ties are broken by the fixed priority-table order of the input (the
/// order `pattern_scores` emits), never by map iteration order. An empty
/// slice falls back to the chat handler.
pub fn resolve_by_priority(scores: &[(AgentKind, u32)]) -> AgentKind {
    let mut best = AgentKind::Chat;
    let mut best_weighted = 0u32;
    for (kind, hits) in scores {
        let weighted = hits * priority(*kind);
        if weighted > best_weighted {
            best = *kind;
            best_weighted = weighted;
        }
    }
    best
}

/// Routes requests to task handlers via layered escalation.
pub struct Router {
    generator: Arc<dyn TextGenerator>,
    config: RouterConfig,
}

impl Router {
    pub fn new(generator: Arc<dyn TextGenerator>, config: RouterConfig) -> Self {
        Self { generator, config }
    }

    /// Decide which handler should answer `text`.
    ///
    /// `history` is the caller-supplied conversation so far; it only
    /// influences the fallback classifier. `forced` bypasses scoring
    /// entirely.
    pub async fn route(
        &self,
        text: &str,
        history: Option<&[Message]>,
        forced: Option<AgentKind>,
    ) -> RoutingDecision {
        if let Some(agent) = forced {
            return RoutingDecision {
                agent,
                method: RouteMethod::Forced,
                confidence: self.config.forced_confidence,
                scores: None,
            };
        }

        let scores = pattern_scores(text);
        tracing::debug!("pattern match scores: {:?}", scores);

        if scores.is_empty() {
            if let Some(agent) = self.classify_with_llm(text, history).await {
                return RoutingDecision {
                    agent,
                    method: RouteMethod::Llm,
                    confidence: self.config.llm_confidence,
                    scores: None,
                };
            }
            return RoutingDecision {
                agent: AgentKind::Chat,
                method: RouteMethod::Default,
                confidence: self.config.default_confidence,
                scores: None,
            };
        }

        let score_map: HashMap<AgentKind, u32> = scores.iter().copied().collect();

        if scores.len() == 1 {
            let (agent, hits) = scores[0];
            let confidence = (f64::from(hits) * self.config.per_hit_confidence)
                .min(self.config.confidence_cap);
            return RoutingDecision {
                agent,
                method: RouteMethod::Pattern,
                confidence,
                scores: Some(score_map),
            };
        }

        // Multiple candidates: a clear winner takes it outright, anything
        // closer goes through the priority weights. The sort is stable, so
        // equal raw scores keep their priority-table order.
        let mut ranked = scores.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        let (top_agent, top_hits) = ranked[0];
        let (_, second_hits) = ranked[1];

        if f64::from(top_hits) > f64::from(second_hits) * self.config.clear_winner_margin {
            return RoutingDecision {
                agent: top_agent,
                method: RouteMethod::Pattern,
                confidence: self.config.clear_winner_confidence,
                scores: Some(score_map),
            };
        }

        RoutingDecision {
            agent: resolve_by_priority(&scores),
            method: RouteMethod::PriorityWeighted,
            confidence: self.config.weighted_confidence,
            scores: Some(score_map),
        }
    }

    /// Ask the generation backend to classify zero-signal input.
    ///
    /// Any transport failure or unusable reply yields `None`; this path
    /// never errors.
    async fn classify_with_llm(
        &self,
        text: &str,
        history: Option<&[Message]>,
    ) -> Option<AgentKind> {
        let prompt = build_classifier_prompt(text, history);
        match self
            .generator
            .generate(&prompt, None, &GenerationOptions::deterministic(20))
            .await
        {
            Ok(reply) => {
                let parsed = parse_classifier_reply(&reply);
                if parsed.is_none() {
                    tracing::warn!("classifier returned an unknown handler: {:?}", reply.trim());
                }
                parsed
            }
            Err(err) => {
                tracing::warn!("intent classification failed: {}", err);
                None
            }
        }
    }
}

fn build_classifier_prompt(text: &str, history: Option<&[Message]>) -> String {
    let mut prompt = String::from(
        "Classify the following user request into one of the available agents.\n\
         Reply with ONLY the agent name (lowercase, one word).\n\nAvailable agents:\n",
    );
    for kind in AgentKind::all() {
        prompt.push_str(&format!("- {}: {}\n", kind.as_str(), kind.description()));
    }
    if let Some(history) = history.filter(|h| !h.is_empty()) {
        prompt.push_str("\nRecent conversation:\n");
        let skip = history.len().saturating_sub(CLASSIFIER_HISTORY_TURNS);
        for message in &history[skip..] {
            prompt.push_str(&format!("{}: {}\n", message.role.as_str(), message.content));
        }
    }
    prompt.push_str(&format!("\nUser request: {}\n\nAgent:", text));
    prompt
}

/// Normalize a classifier reply (trim, lowercase, strip punctuation) and
/// map it to a handler.
fn parse_classifier_reply(reply: &str) -> Option<AgentKind> {
    let normalized: String = reply
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect();
    AgentKind::parse(&normalized)
}
