use thiserror::Error;

/// Errors raised by the scheduler and the study session.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("Quality {0} is not a valid rating. Use 0, 2, 3 or 5.")]
    InvalidQuality(u8),

    #[error("Unknown rating {0:?}. Use [a]gain, [h]ard, [g]ood or [e]asy.")]
    InvalidRating(String),

    #[error("Session is complete ({cursor} of {len} cards rated)")]
    SessionComplete { cursor: usize, len: usize },

    #[error("Due date overflows the calendar ({interval} days ahead)")]
    DueDateOverflow { interval: u32 },
}
