mod activity_service;
mod dispatch_queue;
mod notification_dispatcher;
mod reminder_scanner;
mod scheduler;
mod streak_tracker;

pub use activity_service::{ActivityPorts, ActivityService, CreatedActivity};
pub use dispatch_queue::{DispatchJob, DispatchQueue, DispatchTicket};
pub use notification_dispatcher::NotificationDispatcher;
pub use reminder_scanner::{ReminderScanner, ReminderSettings, ScanReport, ScannerPorts};
pub use scheduler::ReminderScheduler;
pub use streak_tracker::{PairStreakView, RecordOutcome, StreakTracker};
