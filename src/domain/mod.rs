//! Domain layer: the transaction entity, wire shapes, and the store port.

pub mod ports;
pub mod sale;
pub mod transaction;
