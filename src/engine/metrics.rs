//! Detection run metrics.
//!
//! Collected on every detection run (they are cheap: a few counters per rule)
//! and surfaced through [`crate::detect_fields_verbose`] and the CLI report.

use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Default, Clone, Serialize)]
pub struct DetectionMetrics {
    /// Total elapsed time for walking and detection.
    pub total: Duration,
    /// Blocks produced by the walker (empty ones included).
    pub blocks: usize,
    /// Blocks that live inside a table cell, at any depth.
    pub table_blocks: usize,
    /// Raw strings emitted by rules, before dedup and the length filter.
    pub emitted: usize,
    /// Distinct strings dropped by the length filter.
    pub rejected_by_length: usize,
    /// Per-rule activity, in rule order.
    pub rules: Vec<RuleMetrics>,
}

/// Activity of one rule over a run.
#[derive(Debug, Default, Clone, Serialize)]
pub struct RuleMetrics {
    pub name: &'static str,
    /// Blocks the rule actually ran on (trigger-gated).
    pub evaluations: usize,
    /// Blocks skipped because their buckets ruled the rule out.
    pub skipped: usize,
    /// Strings the rule emitted.
    pub hits: usize,
}
