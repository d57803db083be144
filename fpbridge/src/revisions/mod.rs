//! Revisions-complete notification pipeline.
//!
//! - [`request`]: per-request inputs (referrer, query, page)
//! - [`gate`]: eligibility check for the page-load trigger
//! - [`payload`]: payload shapes and field derivations
//! - [`forwarder`]: outbound HTTP delivery
//! - [`pipeline`]: the page-load and directive trigger paths around a shared send step

pub mod forwarder;
pub mod gate;
pub mod payload;
pub mod pipeline;
pub mod request;

pub use forwarder::{Delivery, Forwarder, HttpForwarder, SendError};
pub use gate::{Eligibility, GateMode, TriggerGate};
pub use payload::NotificationPayload;
pub use pipeline::{Notifier, PageLoadOutcome};
pub use request::{InboundRequest, RevisionFields};
