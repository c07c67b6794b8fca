use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::note;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::customers::find_customer;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateNoteRequest {
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdateNoteRequest {
    pub matter_id: Option<i32>,
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content is required"))]
    pub content: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NoteFilter {
    pub customer_id: Option<i32>,
    pub matter_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: i32,
    pub customer_id: i32,
    pub matter_id: Option<i32>,
    pub title: String,
    pub content: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<note::Model> for NoteResponse {
    fn from(model: note::Model) -> Self {
        Self {
            id: model.id,
            customer_id: model.customer_id,
            matter_id: model.matter_id,
            title: model.title,
            content: model.content,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

async fn find_note(db: &DatabaseConnection, note_id: i32) -> ApiResult<note::Model> {
    note::Entity::find_active_by_id(note_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Note", note_id))
}

/// Attach a note to a customer
#[utoipa::path(
    post,
    path = "/api/v1/notes",
    tag = "notes",
    request_body = CreateNoteRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn create_note(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateNoteRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<NoteResponse>>)> {
    find_customer(&state.db, request.customer_id).await?;

    let created = note::ActiveModel {
        customer_id: Set(request.customer_id),
        matter_id: Set(request.matter_id),
        title: Set(request.title.trim().to_string()),
        content: Set(request.content),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Note created with ID: {} for customer {}", created.id, created.customer_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(NoteResponse::from(created), "Note created successfully")),
    ))
}

/// List notes
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    tag = "notes",
    params(ListQuery, NoteFilter),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Notes retrieved successfully", body = [NoteResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_notes(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
    Query(filter): Query<NoteFilter>,
) -> ApiResult<Json<PaginatedResponse<NoteResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let mut select = note::Entity::find_active();
    if let Some(customer_id) = filter.customer_id {
        select = select.filter(note::Column::CustomerId.eq(customer_id));
    }
    if let Some(matter_id) = filter.matter_id {
        select = select.filter(note::Column::MatterId.eq(matter_id));
    }
    let select = apply_list_params(
        select,
        &params,
        &[note::Column::Title, note::Column::Content],
        None,
        note::Column::CreatedAt,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    debug!("Retrieved {} of {} notes", rows.len(), total);
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(NoteResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Notes retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i32, Path, description = "Note ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Note retrieved successfully", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_note(
    State(state): State<AppState>,
    Path(note_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<NoteResponse>>> {
    let note = find_note(&state.db, note_id).await?;
    Ok(Json(ApiResponse::ok(NoteResponse::from(note), "Note retrieved successfully")))
}

#[utoipa::path(
    put,
    path = "/api/v1/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i32, Path, description = "Note ID")),
    request_body = UpdateNoteRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state, request))]
pub async fn update_note(
    State(state): State<AppState>,
    Path(note_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdateNoteRequest>,
) -> ApiResult<Json<ApiResponse<NoteResponse>>> {
    let existing = find_note(&state.db, note_id).await?;
    let mut active: note::ActiveModel = existing.into();

    if let Some(matter_id) = request.matter_id {
        active.matter_id = Set(Some(matter_id));
    }
    if let Some(title) = request.title {
        active.title = Set(title.trim().to_string());
    }
    if let Some(content) = request.content {
        active.content = Set(content);
    }

    let updated = active.update(&state.db).await?;
    info!("Note {} updated successfully", note_id);
    Ok(Json(ApiResponse::ok(NoteResponse::from(updated), "Note updated successfully")))
}

#[utoipa::path(
    delete,
    path = "/api/v1/notes/{note_id}",
    tag = "notes",
    params(("note_id" = i32, Path, description = "Note ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Note deleted successfully"),
        (status = 404, description = "Note not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_note(
    State(state): State<AppState>,
    Path(note_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !note::Entity::soft_delete(&state.db, note_id).await? {
        warn!("Note with ID {} not found for deletion", note_id);
        return Err(ApiError::not_found("Note", note_id));
    }
    info!("Note {} deleted", note_id);
    Ok(Json(ApiResponse::ok((), "Note deleted successfully")))
}
