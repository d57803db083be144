//! Test utilities (available with the `test-utils` feature).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum_test::TestServer;

use crate::config::{AdminConfig, Config, TriggerConfig};
use crate::pages::Page;
use crate::revisions::{Delivery, Forwarder, InboundRequest, SendError};
use crate::settings::{PageId, PageIdInput, SettingsUpdate};

/// Referrer a Filepass review page would send.
pub const FILEPASS_REFERRER: &str = "https://app.filepass.com/review/abc123";

/// Admin token used by [`create_test_config`].
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Forwarder that records what it would have sent instead of sending it.
#[derive(Debug, Default)]
pub struct RecordingForwarder {
    sent: Mutex<Vec<(String, serde_json::Value)>>,
    failure: Option<String>,
}

impl RecordingForwarder {
    /// A forwarder whose every send fails at the transport layer with `message`.
    pub fn failing(message: &str) -> Self {
        Self {
            sent: Mutex::default(),
            failure: Some(message.to_string()),
        }
    }

    /// `(url, body)` pairs in send order. Failed sends are not recorded.
    pub fn sent(&self) -> Vec<(String, serde_json::Value)> {
        self.sent.lock().expect("recording forwarder poisoned").clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn post_json(&self, url: &str, body: String) -> Result<Delivery, SendError> {
        if let Some(message) = &self.failure {
            return Err(SendError::Transport { message: message.clone() });
        }

        let body = serde_json::from_str(&body).expect("forwarded body should be JSON");
        self.sent.lock().expect("recording forwarder poisoned").push((url.to_string(), body));
        Ok(Delivery { status_code: 200 })
    }
}

/// Query string of a complete revisions-complete link.
pub fn revisions_query() -> HashMap<String, String> {
    [
        ("email", "artist@example.com"),
        ("song", "Track One.wav"),
        ("project", "Debut EP"),
        ("filepass", "abc123"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// A request arriving from Filepass with all four parameters.
pub fn revisions_request(current_page_id: Option<PageId>) -> InboundRequest {
    InboundRequest {
        referrer: Some(FILEPASS_REFERRER.to_string()),
        query: revisions_query(),
        current_page_id,
    }
}

/// Config with a revisions page (7), a directive page (8) posting to
/// `directive_url`, and the page-load webhook set to `webhook_url`.
pub fn create_test_config(webhook_url: Option<&str>, directive_url: &str) -> Config {
    Config {
        settings: SettingsUpdate {
            webhook_url: webhook_url.map(str::to_string),
            revisions_page_id: Some(PageIdInput::Number(7)),
        },
        trigger: TriggerConfig::default(),
        admin: AdminConfig {
            api_token: Some(TEST_ADMIN_TOKEN.to_string()),
        },
        pages: vec![
            Page {
                id: 7,
                title: "Revisions".to_string(),
                content: "<p>Revisions received.</p>".to_string(),
            },
            Page {
                id: 8,
                title: "Thank you".to_string(),
                content: format!(r#"[FILEPASS_REVISIONS make_url="{directive_url}"]Thanks for your notes![/FILEPASS_REVISIONS]"#),
            },
        ],
        ..Default::default()
    }
}

/// Test server over the full router, using `forwarder` for outbound calls.
pub fn create_test_app(config: Config, forwarder: Arc<dyn Forwarder>) -> TestServer {
    let app = crate::Application::with_forwarder(config, forwarder).expect("Failed to create application");
    app.into_test_server()
}
