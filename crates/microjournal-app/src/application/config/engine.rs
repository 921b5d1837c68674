use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use microjournal_domain::clock::CutoffHour;
use microjournal_domain::reminder::ReminderWindow;
use microjournal_domain::shared::DomainError;

/// Deployment configuration, loaded from a JSON file. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub database_path: PathBuf,
    pub log_dir: PathBuf,
    /// Must stay fixed for the lifetime of a database.
    pub cutoff_hour: CutoffHour,
    pub daily_window: ReminderWindow,
    pub expiry_window: ReminderWindow,
    /// Subjects evaluated in parallel during one scan.
    pub scan_concurrency: usize,
    pub dispatch: DispatchConfig,
    pub schedule: ScheduleConfig,
    pub fcm: FcmSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub workers: usize,
    pub queue_capacity: usize,
}

/// Six-field cron expressions (seconds first).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub daily_reminder_cron: String,
    pub streak_reminder_cron: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FcmSettings {
    pub project_id: String,
    /// Name of the environment variable holding the OAuth2 access token.
    pub access_token_env: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("microjournal")
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            database_path: data_dir.join("microjournal.db"),
            log_dir: data_dir.join("logs"),
            cutoff_hour: CutoffHour::default(),
            daily_window: ReminderWindow::daily_default(),
            expiry_window: ReminderWindow::expiry_default(),
            scan_concurrency: 8,
            dispatch: DispatchConfig::default(),
            schedule: ScheduleConfig::default(),
            fcm: FcmSettings::default(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 256,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            daily_reminder_cron: "0 */5 * * * *".to_string(),
            streak_reminder_cron: "30 */5 * * * *".to_string(),
        }
    }
}

impl Default for FcmSettings {
    fn default() -> Self {
        Self {
            project_id: String::new(),
            access_token_env: "FCM_ACCESS_TOKEN".to_string(),
            base_url: microjournal_infrastructure::notification::DEFAULT_FCM_BASE_URL.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl FcmSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl EngineConfig {
    /// Read `path` if given, otherwise use defaults. The result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self, DomainError> {
        let config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    DomainError::Infrastructure(format!(
                        "Failed to read config {}: {e}",
                        path.display()
                    ))
                })?;
                Self::from_json(&raw)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        serde_json::from_str(raw)
            .map_err(|e| DomainError::Validation(format!("Invalid engine config: {e}")))
    }

    pub fn with_database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = path.into();
        self
    }

    pub fn with_cutoff_hour(mut self, cutoff: CutoffHour) -> Self {
        self.cutoff_hour = cutoff;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.scan_concurrency == 0 {
            return Err(DomainError::Validation(
                "scan_concurrency must be at least 1".to_string(),
            ));
        }
        if self.dispatch.workers == 0 || self.dispatch.queue_capacity == 0 {
            return Err(DomainError::Validation(
                "dispatch workers and queue_capacity must be at least 1".to_string(),
            ));
        }
        for (name, expr) in [
            ("daily_reminder_cron", &self.schedule.daily_reminder_cron),
            ("streak_reminder_cron", &self.schedule.streak_reminder_cron),
        ] {
            if expr.split_whitespace().count() < 6 {
                return Err(DomainError::Validation(format!(
                    "{name} must be a six-field cron expression, got '{expr}'"
                )));
            }
        }
        if self.database_path.as_os_str().is_empty() {
            return Err(DomainError::Validation("database_path is empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.cutoff_hour.hour(), 6);
        assert_eq!(config.daily_window, ReminderWindow::parse("21:00", 5).unwrap());
        assert_eq!(config.expiry_window, ReminderWindow::parse("12:00", 15).unwrap());
        assert_eq!(config.scan_concurrency, 8);
        assert_eq!(config.dispatch.workers, 4);
        assert_eq!(config.dispatch.queue_capacity, 256);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{"cutoff_hour": 12, "daily_window": {"start": "20:30", "minutes": 10}}"#,
        )
        .unwrap();

        assert_eq!(config.cutoff_hour.hour(), 12);
        assert_eq!(
            config.daily_window.start(),
            NaiveTime::from_hms_opt(20, 30, 0).unwrap()
        );
        assert_eq!(config.expiry_window, ReminderWindow::expiry_default());
        assert_eq!(config.fcm.access_token_env, "FCM_ACCESS_TOKEN");
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(EngineConfig::from_json(r#"{"cutoff_hour": 24}"#).is_err());
        assert!(EngineConfig::from_json(r#"{"daily_window": {"start": "9pm", "minutes": 5}}"#).is_err());

        let mut config = EngineConfig::default();
        config.dispatch.workers = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.schedule.daily_reminder_cron = "*/5 * * * *".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"database_path": "/tmp/journal.db", "scan_concurrency": 2}}"#
        )
        .unwrap();

        let config = EngineConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/journal.db"));
        assert_eq!(config.scan_concurrency, 2);

        assert!(EngineConfig::load(Some(Path::new("/nonexistent/config.json"))).is_err());
    }
}
