//! Settings store for the two values the pipeline reads: the webhook URL and
//! the revisions page.
//!
//! Values are sanitised when they are saved, never when they are read. The
//! pipeline takes an immutable [`Settings`] snapshot at the start of each
//! request, so a concurrent admin save is seen by the next request.

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use utoipa::ToSchema;

/// Identifier of a page served by the bridge.
pub type PageId = i64;

/// Schemes accepted for the outbound webhook.
const ALLOWED_SCHEMES: &[&str] = &["http", "https"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Webhook URL '{value}' is not a valid http(s) URL")]
    InvalidWebhookUrl { value: String },

    #[error("Revisions page '{value}' is not an integer page ID")]
    InvalidPageId { value: String },
}

impl SettingsError {
    /// Name of the setting that was rejected.
    pub fn field(&self) -> &'static str {
        match self {
            SettingsError::InvalidWebhookUrl { .. } => "webhook_url",
            SettingsError::InvalidPageId { .. } => "revisions_page_id",
        }
    }
}

/// Read-only snapshot of the bridge settings.
///
/// `None` means "not configured", which disables the corresponding trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Settings {
    /// Make.com webhook receiving revisions-complete notifications
    #[schema(value_type = Option<String>, format = "uri")]
    pub webhook_url: Option<Url>,
    /// Page on which the page-load trigger is armed
    pub revisions_page_id: Option<PageId>,
}

/// A page ID as submitted by a form or config file: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum PageIdInput {
    Number(i64),
    Text(String),
}

/// Raw settings as submitted, before sanitisation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(default, deny_unknown_fields)]
pub struct SettingsUpdate {
    pub webhook_url: Option<String>,
    pub revisions_page_id: Option<PageIdInput>,
}

impl SettingsUpdate {
    /// Sanitise every submitted value into a [`Settings`] snapshot.
    pub fn sanitize(&self) -> Result<Settings, SettingsError> {
        Ok(Settings {
            webhook_url: self.webhook_url.as_deref().map(sanitize_webhook_url).transpose()?.flatten(),
            revisions_page_id: self.revisions_page_id.as_ref().map(coerce_page_id).transpose()?.flatten(),
        })
    }
}

/// Trim, default the scheme to `http://`, and require an http(s) URL.
/// An empty value clears the setting.
pub fn sanitize_webhook_url(raw: &str) -> Result<Option<Url>, SettingsError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let candidate = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };

    match Url::parse(&candidate) {
        Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) && url.has_host() => Ok(Some(url)),
        _ => Err(SettingsError::InvalidWebhookUrl { value: raw.to_string() }),
    }
}

/// Coerce a submitted page ID to an integer. Zero, negatives and blank strings clear the setting.
pub fn coerce_page_id(input: &PageIdInput) -> Result<Option<PageId>, SettingsError> {
    let id = match input {
        PageIdInput::Number(n) => *n,
        PageIdInput::Text(s) if s.trim().is_empty() => return Ok(None),
        PageIdInput::Text(s) => s
            .trim()
            .parse::<PageId>()
            .map_err(|_| SettingsError::InvalidPageId { value: s.clone() })?,
    };

    Ok((id > 0).then_some(id))
}

/// Where the pipeline reads its configuration from.
pub trait SettingsStore: Send + Sync {
    /// Current settings. Cheap; called once per request.
    fn snapshot(&self) -> Arc<Settings>;

    /// Sanitise and persist new settings, returning what was stored.
    fn save(&self, update: &SettingsUpdate) -> Result<Arc<Settings>, SettingsError>;
}

/// Process-local settings store, seeded from the configuration file.
#[derive(Debug)]
pub struct InMemorySettingsStore {
    current: ArcSwap<Settings>,
}

impl InMemorySettingsStore {
    pub fn new(initial: Settings) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }
}

impl SettingsStore for InMemorySettingsStore {
    fn snapshot(&self) -> Arc<Settings> {
        self.current.load_full()
    }

    fn save(&self, update: &SettingsUpdate) -> Result<Arc<Settings>, SettingsError> {
        let settings = Arc::new(update.sanitize()?);
        self.current.store(settings.clone());
        tracing::info!(
            webhook_configured = settings.webhook_url.is_some(),
            revisions_page_id = ?settings.revisions_page_id,
            "Saved bridge settings"
        );
        Ok(settings)
    }
}
