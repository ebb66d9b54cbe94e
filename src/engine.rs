//! Detection, resolution and fill engine.
//!
//! The engine has two independent workflows that share the block walker and
//! the document model:
//!
//! ```text
//! detection / enrichment
//!
//!   Document ── walker::blocks ──▶ [TextBlock]           (walker.rs)
//!                                     │
//!                                     │ TriggerInfo::scan  (trigger.rs)
//!                                     │  - cheap per-block buckets
//!                                     v
//!                           Detector::detect              (detector.rs)
//!                             - rules A..D per block
//!                             - union, length filter, sort
//!                                     │
//!                                     v
//!                              [Candidate] ──▶ SynonymResolver::resolve
//!                                                 (resolve.rs, against Dictionary)
//!
//! fill
//!
//!   Document ── walker::for_each_paragraph_mut ──▶ Placeholders::fill_paragraph
//!                                                 (substitute.rs, one DataRow)
//! ```
//!
//! ## Responsibilities by module
//!
//! - `walker.rs`: flattens paragraphs and (nested) table cells into ordered
//!   blocks, read-only or with in-place mutation.
//! - `trigger.rs`: coarse per-block features used to skip rules that cannot
//!   fire.
//! - `detector.rs`: applies the detection rules and merges their output.
//! - `resolve.rs`: best canonical field for a raw candidate.
//! - `substitute.rs`: `{{field}}` replacement in paragraph text.
//! - `metrics.rs`: counts and timings for verbose detection.
//!
//! ## Debugging
//!
//! Everything here logs through `tracing` at `debug` level; the CLI turns it
//! on with `FORMWRIGHT_LOG=formwright=debug`.

#[path = "engine/detector.rs"]
mod detector;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/resolve.rs"]
mod resolve;
#[path = "engine/substitute.rs"]
mod substitute;
#[path = "engine/trigger.rs"]
mod trigger;
#[path = "engine/walker.rs"]
mod walker;

pub use detector::{Candidate, Detector};
pub use metrics::{DetectionMetrics, RuleMetrics};
pub use resolve::{Resolution, Scored, SynonymResolver};
pub use substitute::{Placeholders, remaining_placeholders};
pub use trigger::BucketMask;
pub use walker::{TextBlock, blocks, for_each_paragraph_mut};
