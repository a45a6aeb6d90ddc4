use chrono::NaiveDate;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

/// Where a user is in the booking flow. Each step carries the choices made so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum BookingState {
    #[default]
    Idle,
    ChoosingDate {
        service_id: i64,
    },
    ChoosingTime {
        service_id: i64,
        date: NaiveDate,
    },
    Confirming {
        service_id: i64,
        date: NaiveDate,
        time: String,
    },
}

impl BookingState {
    /// Service chosen so far, if any.
    pub fn service_id(&self) -> Option<i64> {
        match self {
            BookingState::Idle => None,
            BookingState::ChoosingDate { service_id }
            | BookingState::ChoosingTime { service_id, .. }
            | BookingState::Confirming { service_id, .. } => Some(*service_id),
        }
    }
}

pub type BookingStorage = InMemStorage<BookingState>;
pub type BookingDialogue = Dialogue<BookingState, BookingStorage>;
