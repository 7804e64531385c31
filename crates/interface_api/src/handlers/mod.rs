//! Request handlers

pub mod audits;
pub mod health;
pub mod rules;
