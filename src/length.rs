//! Length policy: maps a verbosity label to summarizer bounds.
//!
//! | tier | min | max |
//! |------|-----|-----|
//! | short | 30 | 80 |
//! | medium | 60 | 150 |
//! | detailed | 100 | 250 |
//!
//! Unknown labels resolve to `medium`; resolution never fails.

use crate::models::{LengthBounds, LengthTier};

impl LengthTier {
    /// Parse a caller-supplied label. Case and surrounding whitespace are
    /// ignored; anything unrecognized becomes [`LengthTier::Medium`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "short" => LengthTier::Short,
            "detailed" => LengthTier::Detailed,
            _ => LengthTier::Medium,
        }
    }

    pub fn bounds(self) -> LengthBounds {
        match self {
            LengthTier::Short => LengthBounds { min: 30, max: 80 },
            LengthTier::Medium => LengthBounds { min: 60, max: 150 },
            LengthTier::Detailed => LengthBounds { min: 100, max: 250 },
        }
    }
}

/// Resolve a tier label straight to its bounds.
pub fn resolve(label: &str) -> LengthBounds {
    LengthTier::from_label(label).bounds()
}
