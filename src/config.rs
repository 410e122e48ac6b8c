use std::env;
use thiserror::Error;
use tracing::info;

use crate::auth::AwsCredentials;
use crate::models::common::parse_flag;

pub const DEFAULT_APPLICATION_NAME: &str = "chime-sdk-rails";
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_MEDIA_REGION: &str = "us-east-1";
pub const DEFAULT_MAX_RESULTS: u32 = 10;
pub const DEFAULT_API_ENDPOINT: &str = "https://service.chime.aws.amazon.com";
/// The meetings API is only served from this region, whatever the media region is.
pub const API_SIGNING_REGION: &str = "us-east-1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set in environment")]
    Missing(&'static str),
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("{key} must be a boolean, got {value:?}")]
    InvalidBoolean { key: &'static str, value: String },
    #[error("invalid provider endpoint {0:?}")]
    InvalidEndpoint(String),
}

/// Tenant-wide settings, built once at startup and shared read-only
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub application_name: String,
    pub environment: String,
    pub media_region: String,
    pub prefix: String,
    pub max_meeting_results: u32,
    pub max_attendee_results: u32,
    pub create_meeting_with_attendee: bool,
    pub create_attendee_from_meeting: bool,
    pub create_meeting_by_get_request: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_APPLICATION_NAME, DEFAULT_ENVIRONMENT)
    }
}

impl Config {
    /// Settings with every default applied; the prefix is `"{application}-{environment}-"`
    pub fn new(application_name: &str, environment: &str) -> Self {
        Self {
            application_name: application_name.to_string(),
            environment: environment.to_string(),
            media_region: DEFAULT_MEDIA_REGION.to_string(),
            prefix: format!("{}-{}-", application_name, environment),
            max_meeting_results: DEFAULT_MAX_RESULTS,
            max_attendee_results: DEFAULT_MAX_RESULTS,
            create_meeting_with_attendee: true,
            create_attendee_from_meeting: true,
            create_meeting_by_get_request: false,
        }
    }

    /// Load settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let application_name = lookup("CHIME_APPLICATION_NAME")
            .unwrap_or_else(|| DEFAULT_APPLICATION_NAME.to_string());
        let environment =
            lookup("ENVIRONMENT").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let mut config = Self::new(&application_name, &environment);

        if let Some(media_region) = lookup("CHIME_MEDIA_REGION") {
            config.media_region = media_region;
        }
        if let Some(prefix) = lookup("CHIME_PREFIX") {
            config.prefix = prefix;
        }
        if let Some(value) = lookup("CHIME_MAX_MEETING_RESULTS") {
            config.max_meeting_results = parse_count("CHIME_MAX_MEETING_RESULTS", value)?;
        }
        if let Some(value) = lookup("CHIME_MAX_ATTENDEE_RESULTS") {
            config.max_attendee_results = parse_count("CHIME_MAX_ATTENDEE_RESULTS", value)?;
        }
        if let Some(value) = lookup("CHIME_CREATE_MEETING_WITH_ATTENDEE") {
            config.create_meeting_with_attendee =
                parse_bool("CHIME_CREATE_MEETING_WITH_ATTENDEE", value)?;
        }
        if let Some(value) = lookup("CHIME_CREATE_ATTENDEE_FROM_MEETING") {
            config.create_attendee_from_meeting =
                parse_bool("CHIME_CREATE_ATTENDEE_FROM_MEETING", value)?;
        }
        if let Some(value) = lookup("CHIME_CREATE_MEETING_BY_GET_REQUEST") {
            config.create_meeting_by_get_request =
                parse_bool("CHIME_CREATE_MEETING_BY_GET_REQUEST", value)?;
        }

        info!(
            "Loaded configuration for application {} ({}) with prefix {:?}",
            config.application_name, config.environment, config.prefix
        );

        Ok(config)
    }
}

fn parse_count(key: &'static str, value: String) -> Result<u32, ConfigError> {
    match value.trim().parse::<u32>() {
        Ok(count) if count > 0 => Ok(count),
        _ => Err(ConfigError::InvalidNumber { key, value }),
    }
}

fn parse_bool(key: &'static str, value: String) -> Result<bool, ConfigError> {
    parse_flag(value.trim()).ok_or(ConfigError::InvalidBoolean { key, value })
}

/// Where and how to reach the meeting provider
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub endpoint: String,
    pub region: String,
    pub credentials: AwsCredentials,
}

impl ProviderSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            endpoint: lookup("CHIME_API_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            region: API_SIGNING_REGION.to_string(),
            credentials: AwsCredentials {
                access_key_id: lookup("AWS_ACCESS_KEY_ID")
                    .ok_or(ConfigError::Missing("AWS_ACCESS_KEY_ID"))?,
                secret_access_key: lookup("AWS_SECRET_ACCESS_KEY")
                    .ok_or(ConfigError::Missing("AWS_SECRET_ACCESS_KEY"))?,
                session_token: lookup("AWS_SESSION_TOKEN"),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.application_name, "chime-sdk-rails");
        assert_eq!(config.media_region, "us-east-1");
        assert_eq!(config.prefix, "chime-sdk-rails-development-");
        assert_eq!(config.max_meeting_results, 10);
        assert_eq!(config.max_attendee_results, 10);
        assert!(config.create_meeting_with_attendee);
        assert!(config.create_attendee_from_meeting);
        assert!(!config.create_meeting_by_get_request);
    }

    #[test]
    fn test_prefix_follows_application_and_environment() {
        let config = Config::from_lookup(lookup_from(&[
            ("CHIME_APPLICATION_NAME", "rooms"),
            ("ENVIRONMENT", "production"),
        ]))
        .unwrap();
        assert_eq!(config.prefix, "rooms-production-");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("CHIME_PREFIX", "P-"),
            ("CHIME_MEDIA_REGION", "ap-northeast-1"),
            ("CHIME_MAX_MEETING_RESULTS", "25"),
            ("CHIME_MAX_ATTENDEE_RESULTS", "5"),
            ("CHIME_CREATE_MEETING_WITH_ATTENDEE", "false"),
            ("CHIME_CREATE_ATTENDEE_FROM_MEETING", "0"),
            ("CHIME_CREATE_MEETING_BY_GET_REQUEST", "yes"),
        ]))
        .unwrap();

        assert_eq!(config.prefix, "P-");
        assert_eq!(config.media_region, "ap-northeast-1");
        assert_eq!(config.max_meeting_results, 25);
        assert_eq!(config.max_attendee_results, 5);
        assert!(!config.create_meeting_with_attendee);
        assert!(!config.create_attendee_from_meeting);
        assert!(config.create_meeting_by_get_request);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Config::from_lookup(lookup_from(&[("CHIME_MAX_MEETING_RESULTS", "lots")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { key: "CHIME_MAX_MEETING_RESULTS", .. }));

        let err = Config::from_lookup(lookup_from(&[("CHIME_MAX_ATTENDEE_RESULTS", "0")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = Config::from_lookup(lookup_from(&[(
            "CHIME_CREATE_MEETING_BY_GET_REQUEST",
            "maybe",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBoolean { .. }));
    }

    #[test]
    fn test_provider_settings_require_credentials() {
        let err = ProviderSettings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("AWS_ACCESS_KEY_ID")));

        let settings = ProviderSettings::from_lookup(lookup_from(&[
            ("AWS_ACCESS_KEY_ID", "AKID"),
            ("AWS_SECRET_ACCESS_KEY", "secret"),
        ]))
        .unwrap();
        assert_eq!(settings.endpoint, DEFAULT_API_ENDPOINT);
        assert_eq!(settings.region, "us-east-1");
        assert!(settings.credentials.session_token.is_none());
    }
}
