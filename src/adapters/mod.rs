//! Infrastructure adapters. Implement outbound ports.
//!
//! LLM providers, Google Calendar, local store. Map errors to DomainError.

pub mod ai;
pub mod calendar;
pub mod persistence;
pub mod ui;
