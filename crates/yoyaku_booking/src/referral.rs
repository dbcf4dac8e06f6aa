// --- File: crates/yoyaku_booking/src/referral.rs ---
//! Referral routes: the `ref` query parameter selects a provenance tag and
//! whether the booking must go through LINE Login.

use std::collections::HashMap;
use yoyaku_config::ReferralRouteConfig;

/// Route used when `ref` is missing or unknown.
pub const DEFAULT_ROUTE_KEY: &str = "normal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferralRoute {
    pub key: String,
    /// Stored on the record. `None` leaves the record untagged.
    pub tag: Option<String>,
    pub requires_line_login: bool,
}

#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: HashMap<String, ReferralRoute>,
    fallback: ReferralRoute,
}

impl RouteTable {
    pub fn from_config(routes: &[ReferralRouteConfig]) -> Self {
        let routes: HashMap<String, ReferralRoute> = routes
            .iter()
            .map(|route| {
                let tag = route.tag.trim();
                (
                    route.key.clone(),
                    ReferralRoute {
                        key: route.key.clone(),
                        tag: (!tag.is_empty()).then(|| tag.to_string()),
                        requires_line_login: route.requires_line_login,
                    },
                )
            })
            .collect();
        let fallback = routes
            .get(DEFAULT_ROUTE_KEY)
            .cloned()
            .unwrap_or_else(|| ReferralRoute {
                key: DEFAULT_ROUTE_KEY.to_string(),
                tag: None,
                requires_line_login: false,
            });
        Self { routes, fallback }
    }

    pub fn resolve(&self, key: Option<&str>) -> &ReferralRoute {
        key.map(str::trim)
            .filter(|key| !key.is_empty())
            .and_then(|key| self.routes.get(key))
            .unwrap_or(&self.fallback)
    }
}
