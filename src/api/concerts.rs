use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use std::sync::Arc;

use super::auth::AdminKey;
use super::{ApiError, ApiJson, ApiResponse, AppState, ConcertQuery};
use crate::db::ConcertFilter;
use crate::models::concert::{Concert, ConcertInput, MediaRefs};

/// Ids that do not parse can never match a row.
pub(crate) fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

/// GET /api/concerts?genre=&search=
pub async fn list_concerts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConcertQuery>,
) -> Result<Json<ApiResponse<Vec<Concert>>>, ApiError> {
    let filter = ConcertFilter {
        genre: query.genre,
        search: query.search,
    };

    let concerts = state.concerts().list(filter).await?;
    Ok(Json(ApiResponse::success(concerts)))
}

/// GET /api/concerts/{id}
pub async fn get_concert(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Concert>>, ApiError> {
    let id = parse_id(&id).ok_or_else(ApiError::concert_not_found)?;
    let concert = state.concerts().get(id).await?;
    Ok(Json(ApiResponse::success(concert)))
}

/// POST /api/concerts
pub async fn create_concert(
    State(state): State<Arc<AppState>>,
    _admin: AdminKey,
    ApiJson(input): ApiJson<ConcertInput>,
) -> Result<(StatusCode, Json<ApiResponse<Concert>>), ApiError> {
    let concert = state.concerts().create(input, MediaRefs::default()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message(
            "Konser berhasil ditambahkan",
            concert,
        )),
    ))
}
