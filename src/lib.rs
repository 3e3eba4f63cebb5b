//! cal-sync: free-text scheduling instructions to calendar events, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
