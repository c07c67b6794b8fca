use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDateTime;
use model::entities::{custom_field, custom_field_group, practice_area, subcategory};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::errors::{ApiError, ApiResult};
use crate::handlers::custom_fields::CustomFieldResponse;
use crate::helpers::pagination::{apply_list_params, fetch_page};
use crate::helpers::{ListQuery, SortOrder, ValidatedJson};
use crate::schemas::{ApiResponse, AppState, ErrorResponse, PaginatedResponse};

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreatePracticeAreaRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema, Validate, Default)]
pub struct UpdatePracticeAreaRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PracticeAreaResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl From<practice_area::Model> for PracticeAreaResponse {
    fn from(model: practice_area::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Intake form of a practice area: its subcategories, their field groups
/// and the fields of each group.
#[derive(Debug, Serialize, ToSchema)]
pub struct PracticeAreaForm {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub subcategories: Vec<SubcategoryForm>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubcategoryForm {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub field_groups: Vec<FieldGroupForm>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FieldGroupForm {
    pub id: i32,
    pub title: String,
    pub sort_order: i32,
    pub fields: Vec<CustomFieldResponse>,
}

pub(crate) async fn find_practice_area(
    db: &DatabaseConnection,
    practice_area_id: i32,
) -> ApiResult<practice_area::Model> {
    practice_area::Entity::find_active_by_id(practice_area_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Practice area", practice_area_id))
}

/// Resolves the form tree level by level from the integer references.
async fn load_form(db: &DatabaseConnection, area: practice_area::Model) -> ApiResult<PracticeAreaForm> {
    let subcategories = subcategory::Entity::find_active()
        .filter(subcategory::Column::PracticeAreaId.eq(area.id))
        .order_by_asc(subcategory::Column::Id)
        .all(db)
        .await?;
    let subcategory_ids: Vec<i32> = subcategories.iter().map(|s| s.id).collect();

    let groups = custom_field_group::Entity::find_active()
        .filter(custom_field_group::Column::SubcategoryId.is_in(subcategory_ids))
        .order_by_asc(custom_field_group::Column::SortOrder)
        .order_by_asc(custom_field_group::Column::Id)
        .all(db)
        .await?;
    let group_ids: Vec<i32> = groups.iter().map(|g| g.id).collect();

    let fields = custom_field::Entity::find_active()
        .filter(custom_field::Column::GroupId.is_in(group_ids))
        .order_by_asc(custom_field::Column::SortOrder)
        .order_by_asc(custom_field::Column::Id)
        .all(db)
        .await?;
    debug!(
        "Form of practice area {}: {} subcategories, {} groups, {} fields",
        area.id,
        subcategories.len(),
        groups.len(),
        fields.len()
    );

    let mut fields_by_group: HashMap<i32, Vec<CustomFieldResponse>> = HashMap::new();
    for field in fields {
        fields_by_group
            .entry(field.group_id)
            .or_default()
            .push(CustomFieldResponse::from(field));
    }

    let mut groups_by_subcategory: HashMap<i32, Vec<FieldGroupForm>> = HashMap::new();
    for group in groups {
        groups_by_subcategory
            .entry(group.subcategory_id)
            .or_default()
            .push(FieldGroupForm {
                fields: fields_by_group.remove(&group.id).unwrap_or_default(),
                id: group.id,
                title: group.title,
                sort_order: group.sort_order,
            });
    }

    let subcategories = subcategories
        .into_iter()
        .map(|sub| SubcategoryForm {
            field_groups: groups_by_subcategory.remove(&sub.id).unwrap_or_default(),
            id: sub.id,
            name: sub.name,
            description: sub.description,
        })
        .collect();

    Ok(PracticeAreaForm {
        id: area.id,
        name: area.name,
        description: area.description,
        subcategories,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/practice-areas",
    tag = "taxonomy",
    request_body = CreatePracticeAreaRequest,
    security(("bearer" = [])),
    responses(
        (status = 201, description = "Practice area created successfully", body = PracticeAreaResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn create_practice_area(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreatePracticeAreaRequest>,
) -> ApiResult<(StatusCode, Json<ApiResponse<PracticeAreaResponse>>)> {
    let created = practice_area::ActiveModel {
        name: Set(request.name.trim().to_string()),
        description: Set(request.description),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Practice area created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(
            PracticeAreaResponse::from(created),
            "Practice area created successfully",
        )),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-areas",
    tag = "taxonomy",
    params(ListQuery),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Practice areas retrieved successfully", body = [PracticeAreaResponse]),
    )
)]
#[instrument(skip(state))]
pub async fn get_practice_areas(
    State(state): State<AppState>,
    Query(list): Query<ListQuery>,
) -> ApiResult<Json<PaginatedResponse<PracticeAreaResponse>>> {
    let params = list.resolve(10, SortOrder::Desc);
    let select = apply_list_params(
        practice_area::Entity::find_active(),
        &params,
        &[practice_area::Column::Name, practice_area::Column::Description],
        None,
        practice_area::Column::Id,
    );

    let (rows, total) = fetch_page(select, &state.db, &params).await?;
    Ok(Json(PaginatedResponse::new(
        rows.into_iter().map(PracticeAreaResponse::from).collect(),
        total,
        params.page,
        params.limit,
        "Practice areas retrieved successfully",
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/practice-areas/{practice_area_id}",
    tag = "taxonomy",
    params(("practice_area_id" = i32, Path, description = "Practice area ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Practice area retrieved successfully", body = PracticeAreaResponse),
        (status = 404, description = "Practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_practice_area(
    State(state): State<AppState>,
    Path(practice_area_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<PracticeAreaResponse>>> {
    let area = find_practice_area(&state.db, practice_area_id).await?;
    Ok(Json(ApiResponse::ok(
        PracticeAreaResponse::from(area),
        "Practice area retrieved successfully",
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/practice-areas/{practice_area_id}",
    tag = "taxonomy",
    params(("practice_area_id" = i32, Path, description = "Practice area ID")),
    request_body = UpdatePracticeAreaRequest,
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Practice area updated successfully", body = PracticeAreaResponse),
        (status = 404, description = "Practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn update_practice_area(
    State(state): State<AppState>,
    Path(practice_area_id): Path<i32>,
    ValidatedJson(request): ValidatedJson<UpdatePracticeAreaRequest>,
) -> ApiResult<Json<ApiResponse<PracticeAreaResponse>>> {
    let existing = find_practice_area(&state.db, practice_area_id).await?;
    let mut active: practice_area::ActiveModel = existing.into();

    if let Some(name) = request.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = request.description {
        active.description = Set(Some(description));
    }

    let updated = active.update(&state.db).await?;
    info!("Practice area {} updated successfully", practice_area_id);
    Ok(Json(ApiResponse::ok(
        PracticeAreaResponse::from(updated),
        "Practice area updated successfully",
    )))
}

#[utoipa::path(
    delete,
    path = "/api/v1/practice-areas/{practice_area_id}",
    tag = "taxonomy",
    params(("practice_area_id" = i32, Path, description = "Practice area ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Practice area deleted successfully"),
        (status = 404, description = "Practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn delete_practice_area(
    State(state): State<AppState>,
    Path(practice_area_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<()>>> {
    if !practice_area::Entity::soft_delete(&state.db, practice_area_id).await? {
        warn!("Practice area with ID {} not found for deletion", practice_area_id);
        return Err(ApiError::not_found("Practice area", practice_area_id));
    }
    info!("Practice area {} deleted", practice_area_id);
    Ok(Json(ApiResponse::ok((), "Practice area deleted successfully")))
}

/// Full intake form of a practice area. Deleted nodes are left out; groups
/// and fields come in `sort_order`.
#[utoipa::path(
    get,
    path = "/api/v1/practice-areas/{practice_area_id}/form",
    tag = "taxonomy",
    params(("practice_area_id" = i32, Path, description = "Practice area ID")),
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Form retrieved successfully", body = PracticeAreaForm),
        (status = 404, description = "Practice area not found", body = ErrorResponse)
    )
)]
#[instrument(skip(state))]
pub async fn get_practice_area_form(
    State(state): State<AppState>,
    Path(practice_area_id): Path<i32>,
) -> ApiResult<Json<ApiResponse<PracticeAreaForm>>> {
    let area = find_practice_area(&state.db, practice_area_id).await?;
    let form = load_form(&state.db, area).await?;
    Ok(Json(ApiResponse::ok(form, "Practice area form retrieved successfully")))
}
