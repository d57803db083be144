//! Trigger gate: decides whether a page view is a revisions-complete signal.
//!
//! The referrer check is a substring heuristic. Anyone can send a `Referer`
//! containing "filepass", so passing the gate is not proof the view came from
//! Filepass; it only filters out ordinary visitors.

use serde::{Deserialize, Serialize};

use crate::revisions::request::{InboundRequest, REQUIRED_PARAMS};
use crate::settings::Settings;

/// Substring the referrer must contain (case-sensitive).
pub const REFERRER_MARKER: &str = "filepass";

/// Which pages arm the page-load trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateMode {
    /// Only the configured revisions page
    #[default]
    PageBound,
    /// Every page the bridge serves
    AnyPage,
}

/// Outcome of the gate, kept distinct so skips can be traced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    WebhookNotConfigured,
    RevisionsPageNotConfigured,
    NotRevisionsPage,
    ReferrerMissing,
    ReferrerMismatch,
    MissingParams,
}

impl Eligibility {
    pub fn is_eligible(self) -> bool {
        self == Eligibility::Eligible
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TriggerGate {
    mode: GateMode,
}

impl TriggerGate {
    pub fn new(mode: GateMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> GateMode {
        self.mode
    }

    pub fn evaluate(&self, settings: &Settings, request: &InboundRequest) -> Eligibility {
        if settings.webhook_url.is_none() {
            return Eligibility::WebhookNotConfigured;
        }

        if self.mode == GateMode::PageBound {
            let Some(page_id) = settings.revisions_page_id else {
                return Eligibility::RevisionsPageNotConfigured;
            };
            if request.current_page_id != Some(page_id) {
                return Eligibility::NotRevisionsPage;
            }
        }

        let Some(referrer) = request.referrer.as_deref() else {
            return Eligibility::ReferrerMissing;
        };
        if !referrer.contains(REFERRER_MARKER) {
            return Eligibility::ReferrerMismatch;
        }

        if !request.has_params(&REQUIRED_PARAMS) {
            return Eligibility::MissingParams;
        }

        Eligibility::Eligible
    }

    pub fn should_process(&self, settings: &Settings, request: &InboundRequest) -> bool {
        self.evaluate(settings, request).is_eligible()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn settings() -> Settings {
        Settings {
            webhook_url: Some(Url::parse("https://hook.make.com/abc").unwrap()),
            revisions_page_id: Some(7),
        }
    }

    fn request() -> InboundRequest {
        InboundRequest {
            referrer: Some("https://app.filepass.com/p/123".to_string()),
            query: [
                ("email", "artist@example.com"),
                ("song", "Track One.wav"),
                ("project", "Debut EP"),
                ("filepass", "abc123"),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
            current_page_id: Some(7),
        }
    }

    #[test]
    fn test_complete_request_is_eligible() {
        assert!(TriggerGate::default().should_process(&settings(), &request()));
    }

    #[test]
    fn test_missing_webhook_blocks_every_request() {
        let settings = Settings {
            webhook_url: None,
            ..settings()
        };
        for mode in [GateMode::PageBound, GateMode::AnyPage] {
            assert_eq!(
                TriggerGate::new(mode).evaluate(&settings, &request()),
                Eligibility::WebhookNotConfigured
            );
        }
    }

    #[test]
    fn test_page_bound_requires_matching_page() {
        let gate = TriggerGate::new(GateMode::PageBound);

        let unset = Settings {
            revisions_page_id: None,
            ..settings()
        };
        assert_eq!(gate.evaluate(&unset, &request()), Eligibility::RevisionsPageNotConfigured);

        let other_page = InboundRequest {
            current_page_id: Some(8),
            ..request()
        };
        assert_eq!(gate.evaluate(&settings(), &other_page), Eligibility::NotRevisionsPage);

        let no_page = InboundRequest {
            current_page_id: None,
            ..request()
        };
        assert_eq!(gate.evaluate(&settings(), &no_page), Eligibility::NotRevisionsPage);
    }

    #[test]
    fn test_any_page_ignores_page_identity() {
        let gate = TriggerGate::new(GateMode::AnyPage);
        let settings = Settings {
            revisions_page_id: None,
            ..settings()
        };
        let request = InboundRequest {
            current_page_id: None,
            ..request()
        };
        assert!(gate.should_process(&settings, &request));
    }

    #[test]
    fn test_referrer_must_mention_filepass() {
        let gate = TriggerGate::default();

        let missing = InboundRequest {
            referrer: None,
            ..request()
        };
        assert_eq!(gate.evaluate(&settings(), &missing), Eligibility::ReferrerMissing);

        for referrer in ["https://google.com/", "https://app.FILEPASS.com/", "https://file-pass.io/"] {
            let request = InboundRequest {
                referrer: Some(referrer.to_string()),
                ..request()
            };
            assert_eq!(gate.evaluate(&settings(), &request), Eligibility::ReferrerMismatch, "{referrer}");
        }
    }

    #[test]
    fn test_each_required_param_is_checked() {
        let gate = TriggerGate::default();
        for missing in REQUIRED_PARAMS {
            let mut request = request();
            request.query.remove(missing);
            assert_eq!(gate.evaluate(&settings(), &request), Eligibility::MissingParams, "{missing}");
        }
    }
}
