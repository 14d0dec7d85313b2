use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use models::{ItemInput, RentalItem};

use crate::errors::JsonApiError;
use crate::extract::{JsonBody, JsonPath};
use crate::routes::auth::{Caller, ServerState};

/// Single item plus the poster's display name, when the owner still exists.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemView {
    pub item: RentalItem,
    pub owner_name: Option<String>,
}

#[utoipa::path(get, path = "/items", tag = "items", responses((status = 200, description = "All items in posting order", body = [crate::openapi::RentalItemDoc])))]
pub async fn list_items(State(state): State<ServerState>) -> Result<Json<Vec<RentalItem>>, JsonApiError> {
    Ok(Json(state.listings.list_all().await?))
}

#[utoipa::path(post, path = "/items", tag = "items", request_body = crate::openapi::ItemInputDoc, responses((status = 201, description = "Created", body = crate::openapi::RentalItemDoc), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized")))]
pub async fn create_item(
    State(state): State<ServerState>,
    caller: Caller,
    JsonBody(input): JsonBody<ItemInput>,
) -> Result<(StatusCode, Json<RentalItem>), JsonApiError> {
    let item = state.listings.create_item(caller.session(), input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(get, path = "/items/mine", tag = "items", responses((status = 200, description = "Caller's items", body = [crate::openapi::RentalItemDoc]), (status = 401, description = "Unauthorized")))]
pub async fn my_items(State(state): State<ServerState>, caller: Caller) -> Result<Json<Vec<RentalItem>>, JsonApiError> {
    let session = caller.session().ok_or_else(JsonApiError::unauthenticated)?;
    Ok(Json(state.listings.list_by_owner(session.id).await?))
}

#[utoipa::path(get, path = "/items/{id}", tag = "items", params(("id" = Uuid, Path, description = "Item id")), responses((status = 200, description = "Item with owner name", body = crate::openapi::ItemViewDoc), (status = 404, description = "Not Found")))]
pub async fn get_item(State(state): State<ServerState>, JsonPath(id): JsonPath<Uuid>) -> Result<Json<ItemView>, JsonApiError> {
    let item = state
        .listings
        .get_by_id(id)
        .await?
        .ok_or_else(|| JsonApiError::from(service::errors::ServiceError::not_found("item")))?;
    // an owner lookup failure only hides the name
    let owner_name = match state.identity.find_user(item.user_id).await {
        Ok(owner) => owner.map(|o| o.name),
        Err(e) => {
            warn!(item_id = %id, err = %e, "owner lookup failed");
            None
        }
    };
    Ok(Json(ItemView { item, owner_name }))
}

#[utoipa::path(put, path = "/items/{id}", tag = "items", params(("id" = Uuid, Path, description = "Item id")), request_body = crate::openapi::ItemInputDoc, responses((status = 200, description = "Updated", body = crate::openapi::RentalItemDoc), (status = 400, description = "Bad Request"), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn update_item(
    State(state): State<ServerState>,
    caller: Caller,
    JsonPath(id): JsonPath<Uuid>,
    JsonBody(input): JsonBody<ItemInput>,
) -> Result<Json<RentalItem>, JsonApiError> {
    Ok(Json(state.listings.update_item(caller.session(), id, input).await?))
}

#[utoipa::path(delete, path = "/items/{id}", tag = "items", params(("id" = Uuid, Path, description = "Item id")), responses((status = 204, description = "Deleted"), (status = 401, description = "Unauthorized"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn delete_item(
    State(state): State<ServerState>,
    caller: Caller,
    JsonPath(id): JsonPath<Uuid>,
) -> Result<StatusCode, JsonApiError> {
    state.listings.delete_item(caller.session(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/users/{id}/items", tag = "items", params(("id" = Uuid, Path, description = "Owner id")), responses((status = 200, description = "Items posted by the user", body = [crate::openapi::RentalItemDoc])))]
pub async fn user_items(State(state): State<ServerState>, JsonPath(user_id): JsonPath<Uuid>) -> Result<Json<Vec<RentalItem>>, JsonApiError> {
    Ok(Json(state.listings.list_by_owner(user_id).await?))
}
