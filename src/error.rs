//! Error taxonomy for the booking core.

/// Failures surfaced by catalog, slot, booking and discount operations.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Malformed date, time, percentage or other user input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Referenced service, booking, user or discount does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The slot conflicts with an existing booking or is already in the past.
    #[error("time slot is no longer available")]
    SlotUnavailable,

    /// The caller does not own the booking.
    #[error("access denied")]
    Forbidden,

    /// The booking is no longer in a state that allows the transition.
    #[error("booking has already been processed")]
    AlreadyProcessed,

    /// Storage failure not classified above.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl BookingError {
    /// Text shown to the chat user for this failure.
    pub fn user_message(&self) -> String {
        match self {
            BookingError::InvalidInput(reason) => format!("Invalid input: {reason}. Please try again."),
            BookingError::NotFound(what) => format!("Sorry, that {what} could not be found."),
            BookingError::SlotUnavailable => {
                "This time is already taken or has passed. Please pick another slot.".to_string()
            }
            BookingError::Forbidden => "You don't have access to this action.".to_string(),
            BookingError::AlreadyProcessed => "This booking has already been processed.".to_string(),
            BookingError::Database(_) => "Something went wrong. Please try again later.".to_string(),
        }
    }
}
