//! Trigger scanning (block pre-classification).
//!
//! Before the detection rules run on a block, the block's trimmed text is
//! scanned once for a few cheap features. Rules declare the buckets they need
//! and the detector skips rules whose buckets are absent, so the separator
//! regex never runs on a block without dots, underscores or a wide gap.
//!
//! The scan is a superset test: a bucket being set does not mean a rule will
//! produce anything, only that it might.

bitflags::bitflags! {
    /// Coarse features of one block's text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BucketMask: u32 {
        /// Five or more consecutive periods.
        const DOT_RUN        = 1 << 0;
        /// At least one underscore.
        const UNDERSCORE     = 1 << 1;
        /// Eight or more consecutive whitespace characters.
        const WIDE_GAP       = 1 << 2;
        /// Text ends with `:`.
        const TRAILING_COLON = 1 << 3;

        const SEPARATOR = Self::DOT_RUN.bits() | Self::UNDERSCORE.bits() | Self::WIDE_GAP.bits();
    }
}

/// Block characteristics detected from its trimmed text.
#[derive(Debug, Clone, Copy)]
pub struct TriggerInfo {
    pub buckets: BucketMask,
}

impl TriggerInfo {
    pub fn scan(text: &str) -> Self {
        let mut buckets = BucketMask::empty();

        if text.contains('_') {
            buckets |= BucketMask::UNDERSCORE;
        }
        if text.ends_with(':') {
            buckets |= BucketMask::TRAILING_COLON;
        }

        let mut dots = 0usize;
        let mut spaces = 0usize;
        for ch in text.chars() {
            dots = if ch == '.' { dots + 1 } else { 0 };
            spaces = if ch.is_whitespace() { spaces + 1 } else { 0 };
            if dots >= 5 {
                buckets |= BucketMask::DOT_RUN;
            }
            if spaces >= 8 {
                buckets |= BucketMask::WIDE_GAP;
            }
        }

        TriggerInfo { buckets }
    }

    /// Whether a rule requiring `required` may fire on this block.
    ///
    /// Rules without requirements always may; otherwise any shared bucket is
    /// enough.
    pub fn admits(&self, required: BucketMask) -> bool {
        required.is_empty() || self.buckets.intersects(required)
    }
}
