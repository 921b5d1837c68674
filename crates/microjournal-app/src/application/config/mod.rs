mod engine;

pub use engine::{DispatchConfig, EngineConfig, FcmSettings, ScheduleConfig};
