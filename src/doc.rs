//! OpenAPI document for the HTTP surface, served as JSON and through
//! Swagger UI by [`crate::app::build_app`].

use utoipa::OpenApi;

use crate::error::ErrorBody;
use crate::users::dto::{ListResponse, UserPayload, UserResponse, UserView};

pub const OPENAPI_JSON_PATH: &str = "/api-docs/openapi.json";
pub const SWAGGER_UI_PATH: &str = "/docs";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "User registry API",
        description = "List, create, show, update and delete user records."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::users::handlers::list_users,
        crate::users::handlers::create_user,
        crate::users::handlers::show_user,
        crate::users::handlers::update_user,
        crate::users::handlers::delete_user,
    ),
    components(schemas(UserView, UserPayload, UserResponse, ListResponse, ErrorBody)),
    tags(
        (name = "users", description = "User records")
    )
)]
pub struct ApiDoc;
