mod activity_repo;
mod push_endpoint_repo;
mod relationship_repo;
mod reminder_ledger_repo;
mod streak_repo;
mod user_repo;

pub use activity_repo::SqliteActivityRepository;
pub use push_endpoint_repo::SqlitePushEndpointRepository;
pub use relationship_repo::SqliteRelationshipDirectory;
pub use reminder_ledger_repo::SqliteReminderLedger;
pub use streak_repo::SqliteStreakRepository;
pub use user_repo::SqliteUserDirectory;

use microjournal_domain::clock::JournalDate;
use microjournal_domain::shared::DomainError;

/// Journal dates are stored as `YYYY-MM-DD` text.
pub(crate) fn parse_journal_date(value: Option<String>) -> Result<Option<JournalDate>, DomainError> {
    value
        .map(|s| {
            s.parse::<JournalDate>()
                .map_err(|e| DomainError::DataIntegrity(format!("Stored journal date: {e}")))
        })
        .transpose()
}
