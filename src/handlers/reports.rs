// src/handlers/reports.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    common::{db_utils::read_pool, error::ApiError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::report::ReportQuery,
    services::document_service::ReportContent,
};

fn pdf_response(filename: &str, pdf_bytes: Vec<u8>) -> Response {
    // Configura os Headers para o navegador baixar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", filename)),
    ];
    (headers, pdf_bytes).into_response()
}

fn render(app_state: &AppState, locale: &Locale, content: &ReportContent) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .render(content)
        .map_err(|e| e.to_api_error(locale, &app_state.i18n_store))?;
    Ok(pdf_response(&content.filename, pdf_bytes))
}

// GET /api/reports/sales
#[utoipa::path(
    get,
    path = "/api/reports/sales",
    tag = "Relatórios",
    params(
        ("startDate" = Option<chrono::NaiveDate>, Query, description = "Início do período (data da venda)"),
        ("endDate" = Option<chrono::NaiveDate>, Query, description = "Fim do período (inclusive)"),
        ("clientId" = Option<i64>, Query, description = "Somente um cliente")
    ),
    responses(
        (status = 200, description = "Relatório de vendas em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn sales_report(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let content = app_state
        .document_service
        .sales_content(read_pool(&app_state), user.id, &filters, app_state.clock.today())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    render(&app_state, &locale, &content)
}

// GET /api/reports/installments
#[utoipa::path(
    get,
    path = "/api/reports/installments",
    tag = "Relatórios",
    params(
        ("startDate" = Option<chrono::NaiveDate>, Query, description = "Início do período (vencimento)"),
        ("endDate" = Option<chrono::NaiveDate>, Query, description = "Fim do período (inclusive)"),
        ("clientId" = Option<i64>, Query, description = "Somente um cliente")
    ),
    responses(
        (status = 200, description = "Relatório de parcelas em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Cliente não encontrado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn installments_report(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filters): Query<ReportQuery>,
) -> Result<Response, ApiError> {
    let content = app_state
        .document_service
        .installments_content(read_pool(&app_state), user.id, &filters, app_state.clock.today())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    render(&app_state, &locale, &content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdf_response_is_an_attachment() {
        let response = pdf_response("vendas.pdf", b"%PDF-1.7".to_vec());

        let headers = response.headers();
        assert_eq!(headers[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(headers[header::CONTENT_DISPOSITION], "attachment; filename=\"vendas.pdf\"");
    }
}
