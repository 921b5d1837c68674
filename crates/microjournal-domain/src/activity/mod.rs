mod aggregate;
mod repository;

pub use aggregate::{ActivityRecord, NewActivity, MAX_TEXT_CHARS};
pub use repository::ActivityRepository;
