//! Application layer - errors and the messaging pipeline

pub mod errors;
pub mod messaging;
