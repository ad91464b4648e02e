//! Token usage extraction from agent stdout.
//!
//! Agents report usage in their own structured-output conventions. Anything
//! that does not match the expected shape counts as zero usage.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Token usage of one agent invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Input/prompt tokens.
    pub input_tokens: u64,
    /// Output/completion tokens.
    pub output_tokens: u64,
}

impl TokenUsage {
    /// Creates new token usage stats.
    pub fn new(input: u64, output: u64) -> Self {
        Self {
            input_tokens: input,
            output_tokens: output,
        }
    }

    /// Returns total tokens used.
    pub fn total(&self) -> u64 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    fn from_usage_object(usage: Option<&Value>) -> Self {
        let count = |key: &str| {
            usage
                .and_then(|u| u.get(key))
                .and_then(Value::as_u64)
                .unwrap_or(0)
        };
        Self::new(count("input_tokens"), count("output_tokens"))
    }
}

impl std::ops::AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: Self) {
        self.input_tokens = self.input_tokens.saturating_add(rhs.input_tokens);
        self.output_tokens = self.output_tokens.saturating_add(rhs.output_tokens);
    }
}

/// Where an agent puts its usage numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageFormat {
    /// One JSON document with a top-level `usage` object.
    JsonDocument,
    /// JSON lines; `usage` of every event with the given `type` is summed.
    JsonEvents {
        /// Event type carrying usage.
        event_type: &'static str,
    },
    /// The agent reports no usage.
    None,
}

impl UsageFormat {
    /// Extracts usage from `stdout`; malformed or empty output yields zero.
    pub fn parse(&self, stdout: &str) -> TokenUsage {
        let stdout = stdout.trim();
        if stdout.is_empty() {
            return TokenUsage::default();
        }

        match self {
            UsageFormat::JsonDocument => serde_json::from_str::<Value>(stdout)
                .map(|doc| TokenUsage::from_usage_object(doc.get("usage")))
                .unwrap_or_default(),
            UsageFormat::JsonEvents { event_type } => {
                let mut total = TokenUsage::default();
                for line in stdout.lines() {
                    let Ok(event) = serde_json::from_str::<Value>(line) else {
                        continue;
                    };
                    if event.get("type").and_then(Value::as_str) == Some(*event_type) {
                        total += TokenUsage::from_usage_object(event.get("usage"));
                    }
                }
                total
            }
            UsageFormat::None => TokenUsage::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_document() {
        let output = json!({
            "result": "Done",
            "usage": {"input_tokens": 1000, "output_tokens": 500},
            "session_id": "abc123"
        })
        .to_string();
        assert_eq!(
            UsageFormat::JsonDocument.parse(&output),
            TokenUsage::new(1000, 500)
        );
    }

    #[test]
    fn test_json_document_without_usage() {
        let output = json!({"result": "Done"}).to_string();
        assert_eq!(UsageFormat::JsonDocument.parse(&output), TokenUsage::default());
    }

    #[test]
    fn test_json_document_malformed() {
        assert_eq!(
            UsageFormat::JsonDocument.parse("Working...\nnot json"),
            TokenUsage::default()
        );
    }

    #[test]
    fn test_json_events_sums_matching_events() {
        let output = [
            json!({"type": "turn.completed", "usage": {"input_tokens": 2000, "output_tokens": 800}}),
            json!({"type": "item.completed", "item": {"type": "agent_message", "text": "Done"}}),
            json!({"type": "turn.completed", "usage": {"input_tokens": 500, "output_tokens": 100}}),
        ]
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("\n");

        let format = UsageFormat::JsonEvents {
            event_type: "turn.completed",
        };
        assert_eq!(format.parse(&output), TokenUsage::new(2500, 900));
    }

    #[test]
    fn test_json_events_skips_garbage_lines() {
        let output = format!(
            "warning: something\n{}\n{{broken\n",
            json!({"type": "turn.completed", "usage": {"input_tokens": 7, "output_tokens": 3}})
        );
        let format = UsageFormat::JsonEvents {
            event_type: "turn.completed",
        };
        assert_eq!(format.parse(&output), TokenUsage::new(7, 3));
    }

    #[test]
    fn test_empty_output_is_zero() {
        assert_eq!(UsageFormat::JsonDocument.parse("  \n"), TokenUsage::default());
        let format = UsageFormat::JsonEvents {
            event_type: "turn.completed",
        };
        assert_eq!(format.parse(""), TokenUsage::default());
    }

    #[test]
    fn test_none_ignores_output() {
        let output = json!({"usage": {"input_tokens": 1, "output_tokens": 1}}).to_string();
        assert_eq!(UsageFormat::None.parse(&output), TokenUsage::default());
    }

    #[test]
    fn test_token_usage_total() {
        assert_eq!(TokenUsage::new(1000, 500).total(), 1500);
        assert_eq!(TokenUsage::new(u64::MAX, 1).total(), u64::MAX);
    }

    #[test]
    fn test_json_events_saturate_on_overflow() {
        let event = json!({"type": "turn.completed", "usage": {"input_tokens": u64::MAX, "output_tokens": 1}});
        let output = format!("{event}\n{event}");
        let format = UsageFormat::JsonEvents {
            event_type: "turn.completed",
        };
        assert_eq!(format.parse(&output), TokenUsage::new(u64::MAX, 2));
    }
}
