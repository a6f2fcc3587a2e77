//! Completion notification: message composition and SMTP delivery.

pub mod email;
pub mod message;
