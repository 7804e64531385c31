//! Request and response bodies

pub mod audits;
pub mod rules;
