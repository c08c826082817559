// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        db_utils::{read_pool, record_pool, write_pool},
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::sale::{
        AllocationRequest, AllocationResponse, CreateSalePayload, CreatedSaleResponse, SaleDetail, SaleListQuery,
        SaleWithClient,
    },
    services::sale_service::preview_allocation,
};

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Vendas",
    params(
        ("clientId" = Option<i64>, Query, description = "Filtra pelas vendas de um cliente")
    ),
    responses(
        (status = 200, description = "Vendas com o nome do cliente, mais recentes primeiro", body = Vec<SaleWithClient>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<SaleListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(Vec::<SaleWithClient>::new())));
    };

    let sales = app_state
        .sale_service
        .list_sales(pool, user.id, query.client_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(sales)))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Vendas",
    params(
        ("id" = i64, Path, description = "ID da venda")
    ),
    responses(
        (status = 200, description = "Venda com produtos e parcelas", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = record_pool(read_pool(&app_state), AppError::SaleNotFound)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .sale_service
        .get_sale(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(detail)))
}

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Vendas",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada com produtos e parcelas", body = CreatedSaleResponse),
        (status = 400, description = "Dados inválidos ou soma das parcelas diferente do total"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateSalePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let id = app_state
        .sale_service
        .create_sale(pool, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(CreatedSaleResponse { id })))
}

// DELETE /api/sales/{id}
#[utoipa::path(
    delete,
    path = "/api/sales/{id}",
    tag = "Vendas",
    params(
        ("id" = i64, Path, description = "ID da venda")
    ),
    responses(
        (status = 204, description = "Venda removida com produtos e parcelas"),
        (status = 404, description = "Venda não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_sale(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .sale_service
        .delete_sale(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// POST /api/sales/allocation
// Distribui o total entre as parcelas enquanto o formulário é preenchido. Não grava nada.
#[utoipa::path(
    post,
    path = "/api/sales/allocation",
    tag = "Vendas",
    request_body = AllocationRequest,
    responses(
        (status = 200, description = "Valores sugeridos por parcela", body = AllocationResponse),
        (status = 400, description = "Dados inválidos")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn preview_sale_allocation(
    State(app_state): State<AppState>,
    locale: Locale,
    Json(payload): Json<AllocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let allocation = preview_allocation(&payload).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(allocation)))
}
