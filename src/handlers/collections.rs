// src/handlers/collections.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::{
        db_utils::read_pool,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::collections::{CollectionsOverview, CollectionsQuery},
};

// GET /api/collections
#[utoipa::path(
    get,
    path = "/api/collections",
    tag = "Cobranças",
    params(
        ("daysAhead" = Option<i64>, Query, description = "Dias à frente (1 a 30, padrão 7)"),
        ("search" = Option<String>, Query, description = "Trecho do nome do cliente")
    ),
    responses(
        (status = 200, description = "Parcelas a vencer agrupadas por cliente", body = CollectionsOverview),
        (status = 400, description = "daysAhead fora do intervalo")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_collections(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<CollectionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let overview = app_state
        .collections_service
        .overview(
            read_pool(&app_state),
            user.id,
            app_state.clock.today(),
            query.days_ahead,
            query.search.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(overview)))
}
