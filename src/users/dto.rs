use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /users` and `PUT /users/{id}`. Every field is optional at
/// the type level; the create and update rule sets decide what is required.
#[derive(Default, Deserialize, ToSchema)]
pub struct UserPayload {
    #[schema(example = "John Doe")]
    pub name: Option<String>,
    #[schema(example = "T3hYq@example.com")]
    pub email: Option<String>,
    #[schema(example = "password", min_length = 8, max_length = 255)]
    pub password: Option<String>,
    #[schema(example = "password")]
    pub password_confirmation: Option<String>,
    #[schema(example = "000.000.000-00")]
    pub cpf: Option<String>,
    #[schema(example = "(00) 00000-0000")]
    pub phone: Option<String>,
}

/// Raw list query; numbers stay strings until validated so a bad value is
/// reported per field instead of rejecting the whole query string.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Substring of the user's name.
    pub search: Option<String>,
    /// Page number, starting at 1.
    #[param(value_type = Option<i64>, default = 1)]
    pub page: Option<String>,
    /// Rows per page.
    #[param(value_type = Option<i64>, default = 10)]
    pub per_page: Option<String>,
}

/// Public representation of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserView {
    #[schema(example = 1)]
    pub id: i64,
    #[schema(example = "John Doe")]
    pub name: String,
    #[schema(example = "T3hYq@example.com")]
    pub email: String,
    #[schema(example = "000.000.000-00")]
    pub cpf: Option<String>,
    #[schema(example = "(00) 00000-0000")]
    pub phone: Option<String>,
    #[schema(example = "2023-01-01 00:00:00")]
    pub created_at: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub data: UserView,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse {
    pub data: Vec<UserView>,
    /// Matching rows before pagination.
    pub total: i64,
}
