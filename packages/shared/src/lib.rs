//! Utilities shared by the Colony server and worker binaries.

pub mod logger;
pub mod time;
