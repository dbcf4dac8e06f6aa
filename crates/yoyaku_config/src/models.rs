// --- File: crates/yoyaku_config/src/models.rs ---

use serde::{Deserialize, Serialize};

// --- General Server Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Origins allowed by the CORS layer. Empty means any origin.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// --- Logging Config ---
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum level for `yoyaku*` targets, e.g. "info" or "debug".
    pub level: Option<String>,
    /// When set, logs are also written to a daily rolling file in this directory.
    pub directory: Option<String>,
    pub file_prefix: Option<String>,
}

// --- Business Calendar ---
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct BusinessConfig {
    pub time_zone: String,
    pub open_hour: u32,
    pub close_hour: u32,
    /// Weekday names ("Sat", "Sunday", ...) that are never bookable.
    pub closed_weekdays: Vec<String>,
}

impl Default for BusinessConfig {
    fn default() -> Self {
        Self {
            time_zone: "Asia/Tokyo".to_string(),
            open_hour: 12,
            close_hour: 21,
            closed_weekdays: vec!["Sat".to_string(), "Sun".to_string()],
        }
    }
}

/// Static non-bookable dates, `YYYY-MM-DD` in business local time.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct CalendarConfig {
    pub holidays: Vec<String>,
    pub closure_days: Vec<String>,
}

// --- Blocking Rules ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FixedRuleConfig {
    pub name: String,
    /// Weekday name the rule applies to; `None` matches every day.
    #[serde(default)]
    pub weekday: Option<String>,
    #[serde(default)]
    pub exclude_weekdays: Vec<String>,
    pub start_hour: u32,
    pub end_hour: u32,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CategoryRuleConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Value of the call-method tag that marks this category.
    pub call_method_value: String,
    /// Substrings of the event name that mark this category.
    #[serde(default)]
    pub name_keywords: Vec<String>,
    #[serde(default)]
    pub before_hours: i64,
    pub after_hours: i64,
    /// Block from the business opening hour instead of `before_hours`.
    #[serde(default)]
    pub block_from_open: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BlockingConfig {
    #[serde(default)]
    pub fixed_rules: Vec<FixedRuleConfig>,
    pub in_person: CategoryRuleConfig,
    pub shooting: CategoryRuleConfig,
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            fixed_rules: Vec::new(),
            in_person: CategoryRuleConfig {
                enabled: true,
                call_method_value: "対面".to_string(),
                name_keywords: vec!["対面".to_string()],
                before_hours: 3,
                after_hours: 3,
                block_from_open: false,
            },
            shooting: CategoryRuleConfig {
                enabled: true,
                call_method_value: "撮影".to_string(),
                name_keywords: vec!["撮影".to_string()],
                before_hours: 0,
                after_hours: 3,
                block_from_open: true,
            },
        }
    }
}

// --- Referral Routes ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ReferralRouteConfig {
    pub key: String,
    /// Provenance tag stored on the booking record. Empty leaves it unset.
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub requires_line_login: bool,
}

// --- Google Calendar Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GcalConfig {
    pub key_path: Option<String>,
    pub calendar_id: Option<String>,
    // Secrets loaded directly from env vars:
    // GOOGLE_APPLICATION_CREDENTIALS style key file at key_path
}

// --- LINE Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LineConfig {
    pub channel_id: String,
    pub channel_secret: String,
    /// Messaging API channel access token used for push messages.
    pub channel_access_token: String,
    pub redirect_uri: String,
    /// Where the customer lands after the login callback.
    pub frontend_url: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub authorize_url: Option<String>,
}

// --- ChatWork Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ChatworkConfig {
    pub api_token: String,
    pub room_id: String,
    #[serde(default)]
    pub api_base_url: Option<String>,
}

// --- Database Config ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default)]
    pub max_connections: Option<u32>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_minutes: i64,
    pub reap_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_minutes: 24 * 60,
            reap_interval_secs: 600,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub day_before_hour: u32,
    pub imminent_lead_minutes: i64,
    pub imminent_tolerance_minutes: i64,
    pub sweep_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            day_before_hour: 18,
            imminent_lead_minutes: 15,
            imminent_tolerance_minutes: 1,
            sweep_interval_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_minutes: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_minutes: 15 }
    }
}

/// Operator endpoints under `/admin`. They are only mounted when a usable
/// shared secret is configured.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AdminConfig {
    pub shared_secret: Option<String>,
}

impl AdminConfig {
    /// The configured secret, ignoring blanks and an unreplaced env marker.
    pub fn secret(&self) -> Option<&str> {
        self.shared_secret
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != crate::SECRET_MARKER)
    }
}

// --- Unified App Configuration ---
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    // Server config is mandatory
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    // --- Runtime Flags (optional in config file, default to false) ---
    #[serde(default)]
    pub use_gcal: bool,
    #[serde(default)]
    pub use_line: bool,
    #[serde(default)]
    pub use_chatwork: bool,
    #[serde(default)]
    pub use_database: bool,

    // --- Business rules ---
    #[serde(default)]
    pub business: BusinessConfig,
    #[serde(default)]
    pub calendar: CalendarConfig,
    #[serde(default)]
    pub blocking: BlockingConfig,
    #[serde(default)]
    pub routes: Vec<ReferralRouteConfig>,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub reminder: ReminderConfig,
    #[serde(default)]
    pub cache: CacheConfig,

    // --- Optional Feature Configurations ---
    #[serde(default)]
    pub gcal: Option<GcalConfig>,
    #[serde(default)]
    pub line: Option<LineConfig>,
    #[serde(default)]
    pub chatwork: Option<ChatworkConfig>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

impl AppConfig {
    /// The admin shared secret, when operator endpoints are enabled.
    pub fn admin_secret(&self) -> Option<&str> {
        self.admin.as_ref().and_then(AdminConfig::secret)
    }

    /// A configuration with only the server section set and every business
    /// section at its default. Used by tests and as a base for overrides.
    pub fn with_server(host: &str, port: u16) -> Self {
        Self {
            server: ServerConfig {
                host: host.to_string(),
                port,
                allowed_origins: Vec::new(),
            },
            logging: LoggingConfig::default(),
            use_gcal: false,
            use_line: false,
            use_chatwork: false,
            use_database: false,
            business: BusinessConfig::default(),
            calendar: CalendarConfig::default(),
            blocking: BlockingConfig::default(),
            routes: Vec::new(),
            session: SessionConfig::default(),
            reminder: ReminderConfig::default(),
            cache: CacheConfig::default(),
            gcal: None,
            line: None,
            chatwork: None,
            database: None,
            admin: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
