//! API response models for the settings endpoints.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::settings::{PageId, Settings};

/// Current bridge settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SettingsResponse {
    /// Make.com webhook for page-load notifications; null when unset
    pub webhook_url: Option<String>,
    /// Page the page-load trigger is bound to; null when unset
    pub revisions_page_id: Option<PageId>,
    /// True when both values are set, so page-load notifications can fire
    pub page_load_armed: bool,
}

impl From<&Settings> for SettingsResponse {
    fn from(settings: &Settings) -> Self {
        Self {
            webhook_url: settings.webhook_url.as_ref().map(|url| url.to_string()),
            revisions_page_id: settings.revisions_page_id,
            page_load_armed: settings.webhook_url.is_some() && settings.revisions_page_id.is_some(),
        }
    }
}
