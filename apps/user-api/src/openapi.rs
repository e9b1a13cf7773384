//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Base document carrying the service metadata
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Registry API",
        version = "0.1.0",
        description = "REST API for managing user records backed by MongoDB"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    )
)]
struct BaseDoc;

/// Combined OpenAPI documentation: service metadata plus the users domain.
///
/// The domain document is merged manually because its paths live at the
/// application root rather than under a nest prefix.
pub struct ApiDoc;

impl OpenApi for ApiDoc {
    fn openapi() -> utoipa::openapi::OpenApi {
        let mut doc = BaseDoc::openapi();
        doc.merge(domain_users::ApiDoc::openapi());
        doc
    }
}
