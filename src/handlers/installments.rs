// src/handlers/installments.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::{
    common::{
        db_utils::{read_pool, write_pool},
        error::ApiError,
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::installment::{
        ContactedPayload, Installment, InstallmentFilter, InstallmentListQuery, InstallmentView, MarkPaidResponse,
        NotificationResponse, UpdateStatusPayload,
    },
};

// GET /api/installments
#[utoipa::path(
    get,
    path = "/api/installments",
    tag = "Parcelas",
    params(
        ("status" = Option<InstallmentFilter>, Query, description = "all | paid | pending | overdue (status efetivo)"),
        ("search" = Option<String>, Query, description = "Trecho do nome do cliente")
    ),
    responses(
        (status = 200, description = "Parcelas com cliente e status efetivo do dia", body = Vec<InstallmentView>)
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn list_installments(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<InstallmentListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let Some(pool) = read_pool(&app_state) else {
        return Ok((StatusCode::OK, Json(Vec::<InstallmentView>::new())));
    };

    let installments = app_state
        .installment_service
        .list_installments(
            pool,
            user.id,
            app_state.clock.today(),
            query.status.unwrap_or(InstallmentFilter::All),
            query.search.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installments)))
}

// POST /api/installments/{id}/pay
#[utoipa::path(
    post,
    path = "/api/installments/{id}/pay",
    tag = "Parcelas",
    params(
        ("id" = i64, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Parcela paga. `changed = false` quando já estava paga", body = MarkPaidResponse),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn mark_as_paid(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .installment_service
        .mark_as_paid(pool, user.id, id, app_state.clock.now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}

// PATCH /api/installments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/installments/{id}/status",
    tag = "Parcelas",
    request_body = UpdateStatusPayload,
    params(
        ("id" = i64, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Status atualizado", body = Installment),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let installment = app_state
        .installment_service
        .update_status(pool, user.id, id, payload.status, app_state.clock.now())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installment)))
}

// PATCH /api/installments/{id}/contacted
#[utoipa::path(
    patch,
    path = "/api/installments/{id}/contacted",
    tag = "Parcelas",
    request_body = ContactedPayload,
    params(
        ("id" = i64, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Marcação de contato atualizada", body = Installment),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn set_contacted(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Json(payload): Json<ContactedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let installment = app_state
        .installment_service
        .set_contacted(pool, user.id, id, payload.contacted)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(installment)))
}

// POST /api/installments/{id}/notify
#[utoipa::path(
    post,
    path = "/api/installments/{id}/notify",
    tag = "Parcelas",
    params(
        ("id" = i64, Path, description = "ID da parcela")
    ),
    responses(
        (status = 200, description = "Resultado do envio pelo WhatsApp", body = NotificationResponse),
        (status = 400, description = "Cliente sem telefone"),
        (status = 404, description = "Parcela não encontrada")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn notify_installment(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let pool = write_pool(&app_state).map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let response = app_state
        .notification_service
        .notify_installment(pool, user.id, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(response)))
}
