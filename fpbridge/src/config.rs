//! Configuration management for the bridge.
//!
//! Configuration is loaded from a YAML file (default `config.yaml`) and then
//! overridden by environment variables prefixed with `FPBRIDGE_`. Nested
//! values use double underscores.
//!
//! ```yaml
//! host: 0.0.0.0
//! port: 3000
//! log_format: pretty
//! settings:
//!   webhook_url: https://hook.eu1.make.com/abc123
//!   revisions_page_id: 7
//! trigger:
//!   page_bound: true
//! admin:
//!   api_token: change-me
//! pages:
//!   - id: 7
//!     title: Revisions complete
//!     content: |
//!       <h1>Thanks!</h1>
//!       [FILEPASS_REVISIONS make_url="https://hook.eu1.make.com/def456"]Your notes are on their way.[/FILEPASS_REVISIONS]
//! ```
//!
//! ```bash
//! FPBRIDGE_PORT=8080
//! FPBRIDGE_SETTINGS__WEBHOOK_URL="https://hook.eu1.make.com/abc123"
//! FPBRIDGE_ADMIN__API_TOKEN="change-me"
//! ```

use std::collections::HashSet;

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::pages::Page;
use crate::revisions::GateMode;
use crate::settings::{Settings, SettingsUpdate};
use crate::telemetry::LogFormat;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "FPBRIDGE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Log output format
    pub log_format: LogFormat,
    /// Initial settings, sanitised the same way as an admin save
    pub settings: SettingsUpdate,
    pub trigger: TriggerConfig,
    pub admin: AdminConfig,
    /// Pages served under `/pages/{id}`
    pub pages: Vec<Page>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_format: LogFormat::default(),
            settings: SettingsUpdate::default(),
            trigger: TriggerConfig::default(),
            admin: AdminConfig::default(),
            pages: Vec::new(),
        }
    }
}

/// Page-load trigger behaviour.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct TriggerConfig {
    /// Arm the page-load trigger only on the configured revisions page.
    /// When false, any served page with a Filepass referrer and the four
    /// parameters triggers a notification.
    pub page_bound: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self { page_bound: true }
    }
}

impl TriggerConfig {
    pub fn gate_mode(&self) -> GateMode {
        if self.page_bound { GateMode::PageBound } else { GateMode::AnyPage }
    }
}

/// Admin settings API.
#[derive(Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct AdminConfig {
    /// Bearer token for `/admin/api/v1`. The admin API is not mounted without one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
}

// Config is debug-logged at startup; the token must not appear there
impl std::fmt::Debug for AdminConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminConfig")
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        self.initial_settings()?;

        if let Some(token) = &self.admin.api_token
            && token.trim().is_empty()
        {
            return Err(Error::Internal {
                operation: "Config validation: admin.api_token is set but empty. Remove it to disable the admin API.".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for page in &self.pages {
            if !seen.insert(page.id) {
                return Err(Error::Internal {
                    operation: format!("Config validation: page id {} is configured more than once", page.id),
                });
            }
        }

        Ok(())
    }

    /// The seed settings after save-time sanitisation.
    pub fn initial_settings(&self) -> Result<Settings, Error> {
        self.settings.sanitize().map_err(|e| Error::Internal {
            operation: format!("Config validation: settings.{}: {e}", e.field()),
        })
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("FPBRIDGE_").split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PageIdInput;
    use figment::Jail;

    fn args() -> Args {
        Args {
            config: "test.yaml".to_string(),
            validate: false,
        }
    }

    #[test]
    fn test_defaults_without_config_file() {
        Jail::expect_with(|_jail| {
            let config = Config::load(&args())?;

            assert_eq!(config.bind_address(), "0.0.0.0:3000");
            assert_eq!(config.log_format, LogFormat::Pretty);
            assert_eq!(config.trigger.gate_mode(), GateMode::PageBound);
            assert!(config.admin.api_token.is_none());
            assert!(config.pages.is_empty());
            assert_eq!(config.initial_settings().unwrap(), Settings::default());

            Ok(())
        });
    }

    #[test]
    fn test_full_config_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
port: 8081
log_format: json
settings:
  webhook_url: hook.eu1.make.com/abc
  revisions_page_id: "7"
trigger:
  page_bound: false
admin:
  api_token: secret
pages:
  - id: 7
    title: Revisions complete
    content: "[FILEPASS_REVISIONS make_url=\"https://hook.eu1.make.com/def\"]Thanks![/FILEPASS_REVISIONS]"
  - id: 8
    title: About
"#,
            )?;

            let config = Config::load(&args())?;

            assert_eq!(config.port, 8081);
            assert_eq!(config.log_format, LogFormat::Json);
            assert_eq!(config.settings.revisions_page_id, Some(PageIdInput::Text("7".to_string())));
            assert_eq!(config.trigger.gate_mode(), GateMode::AnyPage);
            assert_eq!(config.admin.api_token.as_deref(), Some("secret"));
            assert_eq!(config.pages.len(), 2);
            assert_eq!(config.pages[1].content, "");

            let settings = config.initial_settings().unwrap();
            assert_eq!(settings.webhook_url.unwrap().as_str(), "http://hook.eu1.make.com/abc");
            assert_eq!(settings.revisions_page_id, Some(7));

            Ok(())
        });
    }

    #[test]
    fn test_env_override() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "port: 8081\n")?;

            jail.set_env("FPBRIDGE_HOST", "127.0.0.1");
            jail.set_env("FPBRIDGE_PORT", "9090");
            jail.set_env("FPBRIDGE_SETTINGS__WEBHOOK_URL", "https://hook.eu1.make.com/env");
            jail.set_env("FPBRIDGE_SETTINGS__REVISIONS_PAGE_ID", "12");

            let config = Config::load(&args())?;

            assert_eq!(config.bind_address(), "127.0.0.1:9090");
            let settings = config.initial_settings().unwrap();
            assert_eq!(settings.webhook_url.unwrap().as_str(), "https://hook.eu1.make.com/env");
            assert_eq!(settings.revisions_page_id, Some(12));

            Ok(())
        });
    }

    #[test]
    fn test_unknown_field_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "webhook_url: https://hook.eu1.make.com/abc\n")?;

            assert!(Config::load(&args()).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_duplicate_page_ids_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "test.yaml",
                r#"
pages:
  - id: 3
    title: One
  - id: 3
    title: Two
"#,
            )?;

            let err = Config::load(&args()).unwrap_err();
            assert!(err.to_string().contains("page id 3"));

            Ok(())
        });
    }

    #[test]
    fn test_debug_output_redacts_admin_token() {
        let config = Config {
            admin: AdminConfig {
                api_token: Some("s3cret-admin-token".to_string()),
            },
            ..Config::default()
        };

        let rendered = format!("{config:#?}");

        assert!(!rendered.contains("s3cret-admin-token"));
        assert!(rendered.contains("<redacted>"));
        assert_eq!(format!("{:?}", AdminConfig::default()), "AdminConfig { api_token: None }");
    }

    #[test]
    fn test_empty_admin_token_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "admin:\n  api_token: \"  \"\n")?;

            assert!(Config::load(&args()).is_err());

            Ok(())
        });
    }

    #[test]
    fn test_bad_seed_settings_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file("test.yaml", "settings:\n  webhook_url: ftp://files.example.com/x\n")?;

            let err = Config::load(&args()).unwrap_err();
            assert!(err.to_string().contains("settings.webhook_url"));

            Ok(())
        });
    }
}
