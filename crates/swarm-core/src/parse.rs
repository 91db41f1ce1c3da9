//! Parsing of reasoning-backend replies into typed value objects.
//!
//! The backend is asked for a single JSON object but is not trusted to
//! produce one: replies may be fenced in markdown, truncated, or empty.
//! Parsing therefore always yields a usable object, degrading confidence
//! when the reply was unusable.

use chrono::Utc;
use serde_json::Value;

use swarm_types::{AgentId, CollectiveReport, Thought, ThoughtId};

/// Confidence assigned when the backend returned nothing at all.
const EMPTY_CONFIDENCE: f64 = 0.25;

/// Confidence assigned when the reply was non-empty but not JSON.
const UNPARSED_CONFIDENCE: f64 = 0.4;

/// Build a [`Thought`] from a backend reply.
///
/// Field fallbacks keep the pipeline moving: an empty reply produces a
/// low-confidence placeholder, a non-JSON reply becomes the conclusion
/// verbatim at modest confidence.
pub fn parse_thought(content: &str, producer_id: AgentId, trigger: &str) -> Thought {
    let stripped = strip_fences(content);

    if stripped.is_empty() {
        return Thought {
            id: ThoughtId::new(),
            producer_id,
            trigger: trigger.to_owned(),
            observation: trigger.to_owned(),
            reasoning: String::from("reasoning backend unavailable"),
            conclusion: String::from("no conclusion reached"),
            suggested_actions: Vec::new(),
            confidence: EMPTY_CONFIDENCE,
            timestamp: Utc::now(),
        };
    }

    let Ok(json) = serde_json::from_str::<Value>(stripped) else {
        return Thought {
            id: ThoughtId::new(),
            producer_id,
            trigger: trigger.to_owned(),
            observation: trigger.to_owned(),
            reasoning: String::from("unstructured reply"),
            conclusion: truncated(stripped, 400),
            suggested_actions: Vec::new(),
            confidence: UNPARSED_CONFIDENCE,
            timestamp: Utc::now(),
        };
    };

    Thought {
        id: ThoughtId::new(),
        producer_id,
        trigger: trigger.to_owned(),
        observation: str_field(&json, "observation", trigger),
        reasoning: str_field(&json, "reasoning", ""),
        conclusion: str_field(&json, "conclusion", &truncated(stripped, 400)),
        suggested_actions: str_array(&json, "suggestedActions"),
        confidence: f64_field(&json, "confidence", 0.5).clamp(0.0, 1.0),
        timestamp: Utc::now(),
    }
}

/// Parse a structured [`CollectiveReport`], or `None` when the reply does
/// not carry one.
pub fn parse_report(content: &str) -> Option<CollectiveReport> {
    let stripped = strip_fences(content);
    if stripped.is_empty() {
        return None;
    }
    let json = serde_json::from_str::<Value>(stripped).ok()?;
    let overview = json.get("overview").and_then(Value::as_str)?;
    Some(CollectiveReport {
        overview: overview.to_owned(),
        key_findings: str_array(&json, "keyFindings"),
        opinions: str_field(&json, "opinions", ""),
        improvements: str_array(&json, "improvements"),
        verdict: str_field(&json, "verdict", "inconclusive"),
    })
}

/// Remove a surrounding markdown code fence, if present.
fn strip_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn str_field(json: &Value, key: &str, default: &str) -> String {
    json.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_owned()
}

fn str_array(json: &Value, key: &str) -> Vec<String> {
    json.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

fn f64_field(json: &Value, key: &str, default: f64) -> f64 {
    json.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn truncated(text: &str, max: usize) -> String {
    if text.len() <= max {
        text.to_owned()
    } else {
        let mut cut: String = text.chars().take(max).collect();
        cut.push_str("...");
        cut
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn producer() -> AgentId {
        AgentId::new("agent-0")
    }

    #[test]
    fn well_formed_reply_parses_fully() {
        let content = r#"{"observation": "o", "reasoning": "r", "conclusion": "c",
            "suggestedActions": ["analyze mars weather"], "confidence": 0.8}"#;
        let thought = parse_thought(content, producer(), "trigger");
        assert_eq!(thought.observation, "o");
        assert_eq!(thought.conclusion, "c");
        assert_eq!(thought.suggested_actions.len(), 1);
        assert!((thought.confidence - 0.8).abs() < 1e-12);
    }

    #[test]
    fn fenced_reply_is_unwrapped() {
        let content = "```json\n{\"conclusion\": \"fenced\", \"confidence\": 0.6}\n```";
        let thought = parse_thought(content, producer(), "t");
        assert_eq!(thought.conclusion, "fenced");
    }

    #[test]
    fn empty_reply_degrades() {
        let thought = parse_thought("", producer(), "dataset analysis");
        assert!((thought.confidence - 0.25).abs() < 1e-12);
        assert!(thought.suggested_actions.is_empty());
        assert_eq!(thought.observation, "dataset analysis");
    }

    #[test]
    fn non_json_reply_becomes_conclusion() {
        let thought = parse_thought("flares are increasing", producer(), "t");
        assert_eq!(thought.conclusion, "flares are increasing");
        assert!((thought.confidence - 0.4).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_confidence_is_clamped() {
        let thought = parse_thought(r#"{"conclusion": "c", "confidence": 3.5}"#, producer(), "t");
        assert!((thought.confidence - 1.0).abs() < 1e-12);
    }

    #[test]
    fn report_requires_overview() {
        assert!(parse_report(r#"{"keyFindings": []}"#).is_none());
        assert!(parse_report("").is_none());
        let report = parse_report(
            r#"{"overview": "ov", "keyFindings": ["a", "b"], "opinions": "op",
                "improvements": ["i"], "verdict": "solid"}"#,
        );
        let report = report.unwrap();
        assert_eq!(report.key_findings.len(), 2);
        assert_eq!(report.verdict, "solid");
    }
}
