//! Application services over the record store port.

pub mod catalog;
pub mod error;
pub mod store;
pub mod submissions;
