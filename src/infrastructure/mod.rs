//! Infrastructure layer - config, commands, storage, adapters, session

pub mod adapters;
pub mod commands;
pub mod config;
pub mod session;
pub mod storage;
