// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::local_login,
        handlers::auth::logout,
        handlers::auth::get_me,

        // --- Clientes ---
        handlers::clients::list_clients,
        handlers::clients::get_client,
        handlers::clients::create_client,
        handlers::clients::update_client,
        handlers::clients::delete_client,
        handlers::clients::get_sales_history,

        // --- Vendas ---
        handlers::sales::list_sales,
        handlers::sales::get_sale,
        handlers::sales::create_sale,
        handlers::sales::delete_sale,
        handlers::sales::preview_sale_allocation,

        // --- Parcelas ---
        handlers::installments::list_installments,
        handlers::installments::mark_as_paid,
        handlers::installments::update_status,
        handlers::installments::set_contacted,
        handlers::installments::notify_installment,

        // --- Dashboard ---
        handlers::dashboard::get_summary,
        handlers::dashboard::get_sales_chart,
        handlers::dashboard::get_top_clients,

        // --- Cobranças ---
        handlers::collections::get_collections,

        // --- Relatórios ---
        handlers::reports::sales_report,
        handlers::reports::installments_report,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::UserRole,
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::LocalLoginPayload,
            models::auth::AuthResponse,

            // --- Clientes ---
            models::client::Client,
            models::client::ClientPayload,
            models::client::ClientSalesHistory,

            // --- Vendas ---
            crate::common::money::MoneyInput,
            models::sale::PaymentType,
            models::sale::Sale,
            models::sale::SaleWithClient,
            models::sale::Product,
            models::sale::SaleDetail,
            models::sale::ProductPayload,
            models::sale::InstallmentPayload,
            models::sale::CreateSalePayload,
            models::sale::CreatedSaleResponse,
            models::sale::AllocationRequest,
            models::sale::AllocationResponse,

            // --- Parcelas ---
            models::installment::InstallmentStatus,
            models::installment::InstallmentFilter,
            models::installment::Installment,
            models::installment::InstallmentWithClient,
            models::installment::InstallmentView,
            models::installment::UpdateStatusPayload,
            models::installment::ContactedPayload,
            models::installment::MarkPaidResponse,
            models::installment::NotificationResponse,

            // --- Dashboard ---
            models::dashboard::DashboardSummary,
            models::dashboard::PaymentStatusSlice,
            models::dashboard::SalesChartEntry,
            models::dashboard::ClientRankingEntry,

            // --- Cobranças ---
            models::collections::CollectionItem,
            models::collections::ClientCollectionGroup,
            models::collections::CollectionsOverview,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação, sessão e registro"),
        (name = "Clientes", description = "Cadastro de clientes e histórico de compras"),
        (name = "Vendas", description = "Vendas, produtos e distribuição das parcelas"),
        (name = "Parcelas", description = "Pagamentos, contato e lembretes por WhatsApp"),
        (name = "Dashboard", description = "Indicadores e Gráficos Gerenciais"),
        (name = "Cobranças", description = "Parcelas a vencer agrupadas por cliente"),
        (name = "Relatórios", description = "Exportação em PDF")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_route_group() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        for path in [
            "/api/auth/login",
            "/api/clients/{id}/sales",
            "/api/sales/allocation",
            "/api/installments/{id}/notify",
            "/api/dashboard/top-clients",
            "/api/collections",
            "/api/reports/installments",
        ] {
            assert!(paths.contains_key(path), "rota ausente na documentação: {}", path);
        }
    }
}
