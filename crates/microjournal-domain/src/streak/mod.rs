mod aggregate;
mod repository;


pub use aggregate::{PairStreak, SoloStreak, StreakProgress, StreakState, Transition};
pub use repository::{ExpiryCandidate, StreakRepository};
