//! JSON extraction from free-form model output.
//!
//! Strategies are tried in [`STRATEGIES`] order. The first one that applies
//! decides the outcome, so a malformed fenced block is never retried as a
//! whole-body parse.

use reelrank_core::LlmError;
use serde_json::Value;
use std::fmt;
use tracing::debug;

const JSON_FENCE: &str = "```json";
const CLOSING_FENCE: &str = "```";
const PREVIEW_CHARS: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    FencedBlock,
    UnclosedFence,
    WholeBody,
}

pub const STRATEGIES: [StrategyKind; 3] = [
    StrategyKind::FencedBlock,
    StrategyKind::UnclosedFence,
    StrategyKind::WholeBody,
];

#[derive(Debug)]
pub enum StrategyOutcome {
    NotApplicable,
    Parsed(Value),
    Failed(serde_json::Error),
}

fn parse(candidate: &str) -> StrategyOutcome {
    match serde_json::from_str(candidate.trim()) {
        Ok(value) => StrategyOutcome::Parsed(value),
        Err(e) => StrategyOutcome::Failed(e),
    }
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::FencedBlock => "fenced block",
            StrategyKind::UnclosedFence => "unclosed fence",
            StrategyKind::WholeBody => "whole body",
        }
    }

    pub fn apply(self, raw: &str) -> StrategyOutcome {
        let after_marker = raw
            .find(JSON_FENCE)
            .map(|start| &raw[start + JSON_FENCE.len()..]);

        match (self, after_marker) {
            (StrategyKind::FencedBlock, Some(rest)) => match rest.find(CLOSING_FENCE) {
                Some(end) => parse(&rest[..end]),
                None => StrategyOutcome::NotApplicable,
            },
            (StrategyKind::UnclosedFence, Some(rest)) if !rest.contains(CLOSING_FENCE) => {
                parse(rest)
            }
            (StrategyKind::WholeBody, None) => parse(raw),
            _ => StrategyOutcome::NotApplicable,
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First `PREVIEW_CHARS` characters of a response, for diagnostics.
pub fn response_preview(raw: &str) -> String {
    raw.chars().take(PREVIEW_CHARS).collect()
}

pub fn extract_ranking(raw: &str) -> Result<(StrategyKind, Value), LlmError> {
    for strategy in STRATEGIES {
        match strategy.apply(raw) {
            StrategyOutcome::NotApplicable => continue,
            StrategyOutcome::Parsed(value) => {
                debug!("Extracted JSON via {}", strategy);
                return Ok((strategy, value));
            }
            StrategyOutcome::Failed(e) => {
                return Err(LlmError::ParseFailure {
                    strategy: strategy.to_string(),
                    reason: e.to_string(),
                    preview: response_preview(raw),
                })
            }
        }
    }

    Err(LlmError::ParseFailure {
        strategy: "none".to_string(),
        reason: "no extraction strategy applied".to_string(),
        preview: response_preview(raw),
    })
}
