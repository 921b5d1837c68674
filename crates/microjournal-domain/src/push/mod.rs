mod endpoint;
mod message;
mod templates;
mod transport;

pub use endpoint::{token_prefix, PushEndpoint, PushEndpointRepository};
pub use message::PushMessage;
pub use templates::{daily_reminder, new_post, streak_expiry, NEW_POST_BODY_LIMIT};
pub use transport::{BulkOutcome, DeliveryOutcome, FailureKind, MulticastReport, PushTransport};
