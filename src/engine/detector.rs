//! Candidate field detection.
//!
//! Every rule runs on every block it is admitted to (see `trigger.rs`), and
//! every string a rule emits is a candidate. Rules are independent: the same
//! block can feed several rules, and identical strings from different rules
//! or blocks merge into one [`Candidate`] whose `rules` mask records who
//! found it.
//!
//! ```text
//! blocks[i] ──┬─ keyword_containment ─┐
//!   + next    ├─ separator_run        ├─▶ union by string ─▶ length filter ─▶ sorted
//!             ├─ trailing_colon       │
//!             └─ adjacent_blank ──────┘
//! ```
//!
//! Block text is trimmed before the rules see it, and so is the next block's
//! text used by the adjacent-blank rule.

use super::metrics::{DetectionMetrics, RuleMetrics};
use super::trigger::TriggerInfo;
use super::walker::TextBlock;
use crate::document::BlockPath;
use crate::{BlockView, Rule, RuleMask};
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Instant;

/// A detected field name and where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Candidate {
    pub name: String,
    /// Rules that emitted `name`.
    pub rules: RuleMask,
    /// Blocks `name` was emitted from, in document order, without repeats.
    pub blocks: Vec<BlockPath>,
}

/// Applies a rule set to a sequence of blocks.
#[derive(Debug)]
pub struct Detector<'a> {
    rules: &'a [Rule],
    keywords: &'a [String],
    /// Exclusive lower bound on candidate length, in chars.
    min_len: usize,
    /// Exclusive upper bound on candidate length, in chars.
    max_len: usize,
    blank_len: usize,
}

impl<'a> Detector<'a> {
    pub(crate) fn new(
        rules: &'a [Rule],
        keywords: &'a [String],
        min_len: usize,
        max_len: usize,
        blank_len: usize,
    ) -> Self {
        Detector { rules, keywords, min_len, max_len, blank_len }
    }

    /// Run all rules over `blocks` and return the surviving candidates,
    /// sorted by name, along with run metrics.
    pub fn detect(&self, blocks: &[TextBlock]) -> (Vec<Candidate>, DetectionMetrics) {
        let start = Instant::now();
        let mut metrics = DetectionMetrics {
            blocks: blocks.len(),
            table_blocks: blocks.iter().filter(|b| b.path.table_depth() > 0).count(),
            rules: self.rules.iter().map(|r| RuleMetrics { name: r.name, ..RuleMetrics::default() }).collect(),
            ..DetectionMetrics::default()
        };

        let trimmed: Vec<&str> = blocks.iter().map(|b| b.text.trim()).collect();
        let mut found: BTreeMap<String, Candidate> = BTreeMap::new();

        for (i, block) in blocks.iter().enumerate() {
            let view = BlockView {
                text: trimmed[i],
                next: trimmed.get(i + 1).copied(),
                keywords: self.keywords,
                blank_len: self.blank_len,
            };
            let trigger = TriggerInfo::scan(view.text);

            for (rule, rule_metrics) in self.rules.iter().zip(metrics.rules.iter_mut()) {
                if !trigger.admits(rule.buckets) {
                    rule_metrics.skipped += 1;
                    continue;
                }
                rule_metrics.evaluations += 1;

                let emitted = (rule.production)(&view);
                if !emitted.is_empty() {
                    tracing::debug!(rule = rule.name, block = %block.path, ?emitted, "rule fired");
                }
                rule_metrics.hits += emitted.len();
                metrics.emitted += emitted.len();

                for name in emitted {
                    let candidate = found.entry(name).or_insert_with_key(|name| Candidate {
                        name: name.clone(),
                        rules: RuleMask::empty(),
                        blocks: Vec::new(),
                    });
                    candidate.rules |= rule.kind;
                    if candidate.blocks.last() != Some(&block.path) {
                        candidate.blocks.push(block.path.clone());
                    }
                }
            }
        }

        let before = found.len();
        let candidates: Vec<Candidate> = found
            .into_values()
            .filter(|c| {
                let len = c.name.chars().count();
                self.min_len < len && len < self.max_len
            })
            .collect();
        metrics.rejected_by_length = before - candidates.len();
        metrics.total = start.elapsed();

        tracing::debug!(
            blocks = metrics.blocks,
            candidates = candidates.len(),
            rejected = metrics.rejected_by_length,
            "detection finished"
        );

        (candidates, metrics)
    }
}
