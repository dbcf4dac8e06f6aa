// --- File: crates/yoyaku_line/src/lib.rs ---
//! LINE integration: Login (authorization code to identity) and Messaging
//! (text push to a user id).

pub mod client;
pub mod login;

pub use client::{LineClient, LineError, LineProfile, MAX_MESSAGE_CHARS};
pub use login::{new_login_state, route_from_state};
