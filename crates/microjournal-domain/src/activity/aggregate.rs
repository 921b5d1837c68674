use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::JournalDate;
use crate::shared::{ActivityId, DomainError, UserId};

/// Longest post body accepted, counted in characters.
pub const MAX_TEXT_CHARS: usize = 280;

/// Payload submitted by a user for today's journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub text: String,
    #[serde(default)]
    pub template_id: Option<i64>,
    #[serde(default)]
    pub photo_path: Option<String>,
}

impl NewActivity {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            template_id: None,
            photo_path: None,
        }
    }

    pub fn with_template(mut self, template_id: i64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn with_photo(mut self, photo_path: impl Into<String>) -> Self {
        self.photo_path = Some(photo_path.into());
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.text.trim().is_empty() {
            return Err(DomainError::Validation("Post text cannot be empty".to_string()));
        }
        let chars = self.text.chars().count();
        if chars > MAX_TEXT_CHARS {
            return Err(DomainError::Validation(format!(
                "Post text is {chars} characters, limit is {MAX_TEXT_CHARS}"
            )));
        }
        if matches!(&self.photo_path, Some(path) if path.trim().is_empty()) {
            return Err(DomainError::Validation("Photo path cannot be blank".to_string()));
        }
        Ok(())
    }
}

/// A stored post, at most one per user and journal date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    id: ActivityId,
    user_id: UserId,
    journal_date: JournalDate,
    created_at: DateTime<Utc>,
    template_id: Option<i64>,
    text: String,
    photo_path: Option<String>,
}

impl ActivityRecord {
    /// Reconstruct from persistence
    pub fn from_persistence(
        id: ActivityId,
        user_id: UserId,
        journal_date: JournalDate,
        created_at: DateTime<Utc>,
        payload: NewActivity,
    ) -> Self {
        Self {
            id,
            user_id,
            journal_date,
            created_at,
            template_id: payload.template_id,
            text: payload.text,
            photo_path: payload.photo_path,
        }
    }

    pub fn id(&self) -> ActivityId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn journal_date(&self) -> JournalDate {
        self.journal_date
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn template_id(&self) -> Option<i64> {
        self.template_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn photo_path(&self) -> Option<&str> {
        self.photo_path.as_deref()
    }
}
