//! History ranking function.
//!
//! A command's score compounds over the scan: every occurrence adds a
//! recency term (`round(10 * ln(position))`) plus the command's length in
//! characters on top of whatever the command had already accumulated.
//!
//! Notes
//! - `ln(0)` is undefined. Position 0 contributes a recency term of 0, the
//!   same as position 1, so the oldest line scores `prior + length`.
//! - Scores are `u32`. A result that does not fit is an invariant
//!   violation and panics.

/// Integer score type shared by the sorter and the orchestrator.
pub type Score = u32;

/// Weight applied to the natural log of the occurrence position.
const RECENCY_WEIGHT: f64 = 10.0;

/// Recency contribution of an occurrence at zero-based `position`.
pub fn recency_term(position: usize) -> u64
{
    if position <= 1
    {
        return 0;
    }

    ((position as f64).ln() * RECENCY_WEIGHT).round() as u64
}

/// Compute the new score for an occurrence of a command.
///
/// `prior` is 0 on the first occurrence and the accumulated score after
/// that. `length` is the character length of the command text.
///
/// # Panics
///
/// Panics if the result exceeds [`Score::MAX`].
pub fn score(
    prior: Score,
    position: usize,
    length: usize,
) -> Score
{
    let total = u64::from(prior)
        .checked_add(recency_term(position))
        .and_then(|s| s.checked_add(length as u64));

    match total.and_then(|t| Score::try_from(t).ok())
    {
        Some(s) => s,
        None => panic!(
            "history score overflow: prior={prior} position={position} length={length}"
        ),
    }
}

/// Character length used for scoring.
pub fn text_length(text: &str) -> usize
{
    text.chars()
        .count()
}
