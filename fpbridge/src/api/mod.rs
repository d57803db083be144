//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Request/response data structures for the admin API
//!
//! # Routes
//!
//! - **Pages** (`/pages/{page_id}`): run the page-load trigger, then render the page
//! - **Assets** (`/assets/css/style.css`): stylesheet for directive output
//! - **Settings** (`/admin/api/v1/settings`): read and save the bridge settings
//!
//! The admin API is documented with `utoipa`; the document is served at
//! `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
