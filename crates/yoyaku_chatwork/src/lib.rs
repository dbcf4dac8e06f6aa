// --- File: crates/yoyaku_chatwork/src/lib.rs ---
pub mod alerter;
pub mod message;
#[cfg(test)]
mod message_test;

pub use alerter::{ChatworkAlerter, ChatworkError};
pub use message::render_alert;
