// Domain layer - streak rules, journal-day clock and the ports the engine depends on
// No dependencies on infrastructure or application layers

pub mod activity;
pub mod clock;
pub mod push;
pub mod relationship;
pub mod reminder;
pub mod shared;
pub mod streak;
pub mod subject;
pub mod user;

// Re-exports for convenience
pub use clock::{Clock, CutoffHour, JournalDate};
pub use shared::{DomainError, UserId};
pub use subject::Subject;
