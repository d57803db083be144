//! OpenAPI documentation for the admin API at `/admin/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::{api, settings};

/// Security scheme for the admin API (Bearer token only).
struct AdminSecurityAddon;

impl Modify for AdminSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some(
                            "The configured `admin.api_token`:\n\n```\nAuthorization: Bearer YOUR_ADMIN_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "fpbridge admin API",
        description = "Manage the webhook URL and revisions page used by the Filepass revisions-complete bridge."
    ),
    servers(
        (url = "/admin/api/v1", description = "Admin API server")
    ),
    modifiers(&AdminSecurityAddon),
    paths(
        api::handlers::settings::get_settings,
        api::handlers::settings::update_settings,
    ),
    components(
        schemas(
            api::models::settings::SettingsResponse,
            settings::SettingsUpdate,
            settings::PageIdInput,
        )
    ),
    tags(
        (name = "settings", description = "Bridge settings"),
    )
)]
pub struct ApiDoc;
