// Data models for hand-landmark traces and gesture capture sessions

pub mod landmarks;
pub mod session;
