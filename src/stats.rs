//! Word counts and reduction percentages.

use thiserror::Error;

use crate::models::SummaryStats;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StatsError {
    /// The reference text has no words, so a reduction ratio is undefined.
    #[error("document contains no extractable words; reduction percentage is undefined")]
    DivisionUndefined,
}

/// Number of whitespace-delimited tokens.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// `round((1 - to / from) * 100, 1)`, half away from zero.
pub fn reduction_percentage(from_words: usize, to_words: usize) -> Result<f64, StatsError> {
    if from_words == 0 {
        return Err(StatsError::DivisionUndefined);
    }
    let pct = (1.0 - to_words as f64 / from_words as f64) * 100.0;
    Ok((pct * 10.0).round() / 10.0)
}

/// Statistics for a summary of `original`.
///
/// The excerpt fields are filled as if the model had seen the whole original;
/// use [`with_excerpt`] when the input was truncated.
pub fn compute(original: &str, summary: &str) -> Result<SummaryStats, StatsError> {
    let original_words = word_count(original);
    let summary_words = word_count(summary);
    let reduction = reduction_percentage(original_words, summary_words)?;
    Ok(SummaryStats {
        original_words,
        summary_words,
        reduction_percentage: reduction,
        processed_words: original_words,
        excerpt_reduction_percentage: reduction,
    })
}

/// Record the size of the excerpt actually summarized.
pub fn with_excerpt(stats: SummaryStats, excerpt: &str) -> Result<SummaryStats, StatsError> {
    let processed_words = word_count(excerpt);
    Ok(SummaryStats {
        processed_words,
        excerpt_reduction_percentage: reduction_percentage(processed_words, stats.summary_words)?,
        ..stats
    })
}
