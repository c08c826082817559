// src/handlers/clients.rs

use axum::{
    extract::{Path, State},
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
    models::client::{Client, ClientPayload, ClientSalesHistory},
};

// GET /api/clients
#[utoipa::path(
    get,
    path = "/api/clients",
    tag = "Clientes",
    responses(
        (status = 200, description = "Clientes do usuário, mais recentes primeiro", body = Vec<Client>),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_clients(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(Vec::<Client>::new())));
    };

    let clients = app_state
        .client_service
        .list_clients(pool, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(clients)))
}

// GET /api/clients/{id}
#[utoipa::path(
    get,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(
        ("id" = i64, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Cliente", body = Client),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = record_pool(read_pool(&app_state), AppError::ClientNotFound)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .get_client(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// POST /api/clients
#[utoipa::path(
    post,
    path = "/api/clients",
    tag = "Clientes",
    request_body = ClientPayload,
    responses(
        (status = 201, description = "Cliente criado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 503, description = "Banco de dados indisponível")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn create_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .create_client(pool, user.id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(client)))
}

// PUT /api/clients/{id}
#[utoipa::path(
    put,
    path = "/api/clients/{id}",
    tag = "Clientes",
    request_body = ClientPayload,
    params(
        ("id" = i64, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Cliente atualizado", body = Client),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ClientPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let client = app_state
        .client_service
        .update_client(pool, user.id, id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(client)))
}

// DELETE /api/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/clients/{id}",
    tag = "Clientes",
    params(
        ("id" = i64, Path, description = "ID do cliente")
    ),
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 404, description = "Cliente não encontrado"),
        (status = 409, description = "Cliente possui vendas")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn delete_client(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .client_service
        .delete_client(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/clients/{id}/sales
#[utoipa::path(
    get,
    path = "/api/clients/{id}/sales",
    tag = "Clientes",
    params(
        ("id" = i64, Path, description = "ID do cliente")
    ),
    responses(
        (status = 200, description = "Histórico de compras do cliente", body = ClientSalesHistory),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_sales_history(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = record_pool(read_pool(&app_state), AppError::ClientNotFound)
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let history = app_state
        .client_service
        .sales_history(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(history)))
}
