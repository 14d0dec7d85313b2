use serde::Serialize;
use utoipa::OpenApi;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Serialize, ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(Serialize, ToSchema)]
pub struct CredentialsDoc { pub name: String, pub password: String }

#[derive(Serialize, ToSchema)]
pub struct AuthOutputDoc { pub id: Uuid, pub name: String, pub token: String }

#[derive(Serialize, ToSchema)]
pub struct SessionDoc { pub id: Uuid, pub name: String }

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemInputDoc {
    pub title: String,
    /// Defaults to empty
    #[serde(default)]
    pub description: String,
    pub phone_number: String,
    pub address: String,
    /// Inline `data:` URI
    pub image_url: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RentalItemDoc {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub phone_number: String,
    pub address: String,
    pub user_id: Uuid,
    /// RFC 3339 timestamp
    pub created_at: String,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemViewDoc {
    pub item: RentalItemDoc,
    pub owner_name: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::auth::register,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
        crate::routes::items::list_items,
        crate::routes::items::create_item,
        crate::routes::items::my_items,
        crate::routes::items::get_item,
        crate::routes::items::update_item,
        crate::routes::items::delete_item,
        crate::routes::items::user_items,
    ),
    components(
        schemas(
            HealthResponse,
            CredentialsDoc,
            AuthOutputDoc,
            SessionDoc,
            ItemInputDoc,
            RentalItemDoc,
            ItemViewDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "auth"),
        (name = "items")
    )
)]
pub struct ApiDoc;
