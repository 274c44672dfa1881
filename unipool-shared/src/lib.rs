pub mod models;
pub mod redact;
