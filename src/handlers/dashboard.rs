// src/handlers/dashboard.rs

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
    // Importamos os models para referenciar no Swagger
    models::dashboard::{ClientRankingEntry, DashboardQuery, DashboardSummary, SalesChartEntry},
    services::dashboard_service::empty_summary,
};

// GET /api/dashboard/summary
#[utoipa::path(
    get,
    path = "/api/dashboard/summary",
    tag = "Dashboard",
    params(
        ("startDate" = Option<chrono::NaiveDate>, Query, description = "Início do período (data da venda)"),
        ("endDate" = Option<chrono::NaiveDate>, Query, description = "Fim do período (inclusive)"),
        ("upcomingDays" = Option<i64>, Query, description = "Janela de próximos vencimentos (padrão 7)")
    ),
    responses(
        (status = 200, description = "Cards, próximos vencimentos, atrasadas e status de pagamento", body = DashboardSummary),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    query
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(empty_summary())));
    };

    let summary = app_state
        .dashboard_service
        .get_summary(pool, user.id, &query, app_state.clock.today())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(summary)))
}

// GET /api/dashboard/sales-chart
#[utoipa::path(
    get,
    path = "/api/dashboard/sales-chart",
    tag = "Dashboard",
    params(
        ("startDate" = Option<chrono::NaiveDate>, Query, description = "Início do período"),
        ("endDate" = Option<chrono::NaiveDate>, Query, description = "Fim do período (inclusive)")
    ),
    responses(
        (status = 200, description = "Total vendido por dia, em ordem cronológica", body = Vec<SalesChartEntry>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_sales_chart(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(Vec::<SalesChartEntry>::new())));
    };

    let chart = app_state
        .dashboard_service
        .get_sales_chart(pool, user.id, &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(chart)))
}

// GET /api/dashboard/top-clients
#[utoipa::path(
    get,
    path = "/api/dashboard/top-clients",
    tag = "Dashboard",
    params(
        ("startDate" = Option<chrono::NaiveDate>, Query, description = "Início do período"),
        ("endDate" = Option<chrono::NaiveDate>, Query, description = "Fim do período (inclusive)")
    ),
    responses(
        (status = 200, description = "Os 5 clientes que mais compraram no período", body = Vec<ClientRankingEntry>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_top_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<DashboardQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(Vec::<ClientRankingEntry>::new())));
    };

    let ranking = app_state
        .dashboard_service
        .get_top_clients(pool, user.id, &query)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(ranking)))
}
