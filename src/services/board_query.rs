// src/services/board_query.rs - region + date-range filter behind map and list views
use chrono::NaiveDate;
use thiserror::Error;

use crate::models::geo::{DateRange, Region};
use crate::models::post::Post;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// The range is malformed (unparsable bound, or start after end).
    /// Distinct from an empty result on purpose: the board shows a
    /// different message for each.
    #[error("invalid date range")]
    InvalidRange,
}

/// Parse the two inclusive bounds from `YYYY-MM-DD` form input.
pub fn parse_range(start: &str, end: &str) -> Result<DateRange, QueryError> {
    let start =
        NaiveDate::parse_from_str(start, "%Y-%m-%d").map_err(|_| QueryError::InvalidRange)?;
    let end = NaiveDate::parse_from_str(end, "%Y-%m-%d").map_err(|_| QueryError::InvalidRange)?;
    Ok(DateRange { start, end })
}

/// Pure filter over the owner's posts. Region first (sentinel passes all),
/// then creation date — not capture date — against the inclusive range.
/// Input order is preserved; callers sort if they want sorted output.
pub fn query(posts: &[Post], region: &Region, range: &DateRange) -> Result<Vec<Post>, QueryError> {
    if !range.is_valid() {
        return Err(QueryError::InvalidRange);
    }

    Ok(posts
        .iter()
        .filter(|post| region.contains(&post.record.location()))
        .filter(|post| match post.record.created_date() {
            Some(date) => range.contains(date),
            None => false,
        })
        .cloned()
        .collect())
}
