// Application layer - streak engine services, reminder scheduling and the CLI surface

pub mod application;
pub mod presentation;
