//! Domain layer - entities and capability traits

pub mod entities;
pub mod traits;
