use sqlx::PgPool;

use crate::common::error::AppError;
use crate::config::AppState;

// ---
// Acesso ao banco quando a conexão é opcional
// ---

/// Pool para leituras. `None` quando não há banco configurado: o handler devolve
/// uma lista vazia em vez de falhar.
pub(crate) fn read_pool(app_state: &AppState) -> Option<&PgPool> {
    app_state.db_pool.as_ref()
}

/// Pool para escritas. Sem banco configurado a operação falha explicitamente.
pub(crate) fn write_pool(app_state: &AppState) -> Result<&PgPool, AppError> {
    app_state.db_pool.as_ref().ok_or(AppError::DatabaseUnavailable)
}

/// Pool para leitura de um único registro. Sem banco o registro não existe:
/// devolve `missing` (404) em vez de `DatabaseUnavailable`.
pub(crate) fn record_pool(pool: Option<&PgPool>, missing: AppError) -> Result<&PgPool, AppError> {
    pool.ok_or(missing)
}

/// Nome da constraint violada, se o erro for de chave estrangeira (SQLSTATE 23503).
pub(crate) fn foreign_key_violation(err: &sqlx::Error) -> Option<String> {
    let sqlx::Error::Database(db_err) = err else {
        return None;
    };
    if db_err.is_foreign_key_violation() {
        return Some(db_err.constraint().unwrap_or_default().to_string());
    }
    None
}
