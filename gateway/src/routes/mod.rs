//! HTTP handlers.

pub mod accounts;
pub mod events;
pub mod health;
pub mod login;
