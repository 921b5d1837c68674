mod fcm;

pub use fcm::{FcmConfig, FcmTransport, DEFAULT_FCM_BASE_URL};
