//src/main.rs

use anyhow::Context;
use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// Declaração dos nossos módulos
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

// Importações principais
use crate::config::AppState;
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; padrão "info"
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let app_state = AppState::new()
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    if let Some(pool) = &app_state.db_pool {
        sqlx::migrate!()
            .run(pool)
            .await
            .context("Falha ao rodar as migrações do banco de dados")?;
        tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");
    }

    let addr = app_state.settings.server_addr.clone();
    let app = router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("Erro no servidor Axum")?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Define as rotas de autenticação (públicas)
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/local-login", post(handlers::auth::local_login))
        .route("/logout", post(handlers::auth::logout));

    // Todas as demais rotas exigem sessão
    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::auth::get_me))
        .route(
            "/clients",
            get(handlers::clients::list_clients).post(handlers::clients::create_client),
        )
        .route(
            "/clients/{id}",
            get(handlers::clients::get_client)
                .put(handlers::clients::update_client)
                .delete(handlers::clients::delete_client),
        )
        .route("/clients/{id}/sales", get(handlers::clients::get_sales_history))
        .route(
            "/sales",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/sales/allocation", post(handlers::sales::preview_sale_allocation))
        .route(
            "/sales/{id}",
            get(handlers::sales::get_sale).delete(handlers::sales::delete_sale),
        )
        .route("/installments", get(handlers::installments::list_installments))
        .route("/installments/{id}/pay", post(handlers::installments::mark_as_paid))
        .route("/installments/{id}/status", patch(handlers::installments::update_status))
        .route("/installments/{id}/contacted", patch(handlers::installments::set_contacted))
        .route("/installments/{id}/notify", post(handlers::installments::notify_installment))
        .route("/dashboard/summary", get(handlers::dashboard::get_summary))
        .route("/dashboard/sales-chart", get(handlers::dashboard::get_sales_chart))
        .route("/dashboard/top-clients", get(handlers::dashboard::get_top_clients))
        .route("/collections", get(handlers::collections::get_collections))
        .route("/reports/sales", get(handlers::reports::sales_report))
        .route("/reports/installments", get(handlers::reports::installments_report))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", ApiDoc::openapi()))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
