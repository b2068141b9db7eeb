pub mod format;
pub mod log;
pub mod rate_limit;
