//! The two trigger paths and the send step they share.
//!
//! ```text
//! page view ──► TriggerGate ──► page_load payload ──┐
//!                (settings,      (sanitised, logs    │
//!                 referrer,       empty fields)      ├──► Notifier::send ──► webhook
//!                 params)                            │    (JSON POST, transport
//! [FILEPASS_REVISIONS] ──► directive payload ────────┘     errors logged)
//!                          (email check, song/link
//!                           derivation, date)
//! ```
//!
//! A transport failure never escapes either path. The page-load path only
//! logs it; the directive path also renders it inline for the visitor.

use std::sync::Arc;

use askama::Template;
use chrono::Utc;
use tracing::{debug, error, warn};

use crate::revisions::forwarder::{Delivery, Forwarder, SendError};
use crate::revisions::gate::{Eligibility, TriggerGate};
use crate::revisions::payload::NotificationPayload;
use crate::revisions::request::InboundRequest;
use crate::sanitize::is_email;
use crate::settings::Settings;

pub const MISSING_MAKE_URL: &str = r#"Missing value for "make_url""#;
pub const MISSING_FIELDS: &str = "Missing email, song, or project data.";
pub const INVALID_EMAIL: &str = "Whoops! It looks like the email provided is not a valid email address.";

/// A directive's rendered output: its content, then any transport error.
#[derive(Template)]
#[template(
    source = r#"<p class="ysp_filepass">{{ content|safe }}</p>{% match error %}{% when Some with (detail) %}<h2>Error!</h2><pre>{{ detail }}</pre>{% when None %}{% endmatch %}"#,
    ext = "html"
)]
struct DirectiveOutput<'a> {
    content: &'a str,
    error: Option<String>,
}

/// What the page-load trigger did with a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLoadOutcome {
    /// The gate turned the request away; nothing was sent
    Skipped(Eligibility),
    /// The webhook was reached. `empty_fields` lists values lost to sanitisation
    Sent {
        delivery: Delivery,
        empty_fields: Vec<&'static str>,
    },
    /// The webhook could not be reached; already logged
    TransportFailed(SendError),
}

#[derive(Clone)]
pub struct Notifier {
    forwarder: Arc<dyn Forwarder>,
}

impl Notifier {
    pub fn new(forwarder: Arc<dyn Forwarder>) -> Self {
        Self { forwarder }
    }

    /// Serialise `payload` and POST it to `url`. Transport errors are logged
    /// here and handed back for the caller's policy to decide on.
    pub async fn send(&self, url: &str, payload: &NotificationPayload) -> Result<Delivery, SendError> {
        let body = serde_json::to_string(payload).map_err(|e| SendError::Encode { message: e.to_string() })?;

        match self.forwarder.post_json(url, body).await {
            Ok(delivery) => {
                debug!(status = delivery.status_code, "Webhook accepted revisions-complete notification");
                Ok(delivery)
            }
            Err(e) => {
                error!(error = %e, "Webhook transport error");
                Err(e)
            }
        }
    }

    /// Page-load trigger: gate, sanitise, log empty values, send.
    ///
    /// Empty values after sanitisation do not stop the send; they are logged
    /// with the values as received.
    pub async fn on_page_load(&self, gate: &TriggerGate, settings: &Settings, request: &InboundRequest) -> PageLoadOutcome {
        let eligibility = gate.evaluate(settings, request);
        if !eligibility.is_eligible() {
            debug!(reason = ?eligibility, page_id = ?request.current_page_id, "Not a revisions-complete request");
            return PageLoadOutcome::Skipped(eligibility);
        }

        let Some(webhook_url) = settings.webhook_url.as_ref() else {
            return PageLoadOutcome::Skipped(Eligibility::WebhookNotConfigured);
        };
        let Some(fields) = request.fields() else {
            return PageLoadOutcome::Skipped(Eligibility::MissingParams);
        };

        let payload = NotificationPayload::page_load(&fields);
        let empty_fields = payload.empty_fields();
        if !empty_fields.is_empty() {
            warn!(
                email = %fields.email,
                song = %fields.song,
                project = %fields.project,
                filepass = fields.filepass.as_deref().unwrap_or_default(),
                empty_fields = ?empty_fields,
                "Filepass: unexpected values"
            );
        }

        match self.send(webhook_url.as_str(), &payload).await {
            Ok(delivery) => PageLoadOutcome::Sent { delivery, empty_fields },
            Err(e) => PageLoadOutcome::TransportFailed(e),
        }
    }

    /// Embedded directive: validate, send to `make_url`, and return the HTML
    /// fragment that replaces the directive in the page.
    pub async fn render_directive(&self, make_url: Option<&str>, content: &str, request: &InboundRequest) -> String {
        let Some(make_url) = make_url else {
            return MISSING_MAKE_URL.to_string();
        };
        let Some(fields) = request.fields() else {
            return MISSING_FIELDS.to_string();
        };
        if !is_email(&fields.email) {
            return INVALID_EMAIL.to_string();
        }

        // The content is rendered whatever the send does
        let payload = NotificationPayload::directive(&fields, Utc::now());
        let error = self.send(make_url, &payload).await.err().map(|e| e.to_string());

        DirectiveOutput { content, error }.render().unwrap_or_else(|e| {
            error!(error = %e, "Failed to render directive output");
            String::new()
        })
    }
}
