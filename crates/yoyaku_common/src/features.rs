//! Runtime feature checks.
//!
//! A collaborator is used only when its `use_*` flag is set and its config
//! section is present. Otherwise the backend falls back to the process-local
//! implementations in [`crate::local`].

use yoyaku_config::AppConfig;

/// `true` when the flag is set and the feature's configuration exists.
pub fn is_feature_enabled<T>(use_feature: bool, feature_config: Option<&T>) -> bool {
    use_feature && feature_config.is_some()
}

pub fn is_gcal_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_gcal, config.gcal.as_ref())
}

pub fn is_line_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_line, config.line.as_ref())
}

pub fn is_chatwork_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_chatwork, config.chatwork.as_ref())
}

pub fn is_database_enabled(config: &AppConfig) -> bool {
    is_feature_enabled(config.use_database, config.database.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yoyaku_config::ChatworkConfig;

    #[test]
    fn test_flag_without_section_is_disabled() {
        let mut config = AppConfig::with_server("127.0.0.1", 8086);
        config.use_chatwork = true;
        assert!(!is_chatwork_enabled(&config));

        config.chatwork = Some(ChatworkConfig {
            api_token: "t".to_string(),
            room_id: "1".to_string(),
            api_base_url: None,
        });
        assert!(is_chatwork_enabled(&config));

        config.use_chatwork = false;
        assert!(!is_chatwork_enabled(&config));
    }

    #[test]
    fn test_defaults_are_all_disabled() {
        let config = AppConfig::with_server("127.0.0.1", 8086);
        assert!(!is_gcal_enabled(&config));
        assert!(!is_line_enabled(&config));
        assert!(!is_database_enabled(&config));
    }
}
