// --- File: crates/yoyaku_line/src/login.rs ---
//! The OAuth `state` round trip.
//!
//! `state` is `<nonce>,<ref>`: the nonce makes every login unique, the
//! referral key rides along so the callback can hand it back to the form.

use uuid::Uuid;

const STATE_SEPARATOR: char = ',';

/// Builds a fresh `state` value carrying an optional referral key.
pub fn new_login_state(route_ref: Option<&str>) -> String {
    let nonce = Uuid::new_v4().simple().to_string();
    match route_ref.map(str::trim).filter(|r| !r.is_empty()) {
        Some(route_ref) => format!("{nonce}{STATE_SEPARATOR}{route_ref}"),
        None => nonce,
    }
}

/// The referral key carried in `state`, if any.
pub fn route_from_state(state: Option<&str>) -> Option<String> {
    let (_, route_ref) = state?.split_once(STATE_SEPARATOR)?;
    let route_ref = route_ref.trim();
    (!route_ref.is_empty()).then(|| route_ref.to_string())
}
