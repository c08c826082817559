// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::auth::{AuthResponse, LocalLoginPayload, LoginUserPayload, RegisterUserPayload, User},
    services::auth::SESSION_COOKIE_NAME,
};

// O navegador guarda a sessão no cookie; clientes de API usam o token do corpo
fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .build()
}

// POST /api/auth/register
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "Auth",
    request_body = RegisterUserPayload,
    responses(
        (status = 201, description = "Usuário criado e sessão iniciada", body = AuthResponse),
        (status = 400, description = "Dados inválidos"),
        (status = 409, description = "E-mail já cadastrado")
    )
)]
pub async fn register(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<RegisterUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .register_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let jar = jar.add(session_cookie(response.token.clone(), app_state.settings.cookie_secure));
    Ok((StatusCode::CREATED, jar, Json(response)))
}

// POST /api/auth/login
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "Auth",
    request_body = LoginUserPayload,
    responses(
        (status = 200, description = "Sessão iniciada", body = AuthResponse),
        (status = 401, description = "Credenciais inválidas")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<LoginUserPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .login_user(&payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let jar = jar.add(session_cookie(response.token.clone(), app_state.settings.cookie_secure));
    Ok((StatusCode::OK, jar, Json(response)))
}

// POST /api/auth/local-login (apenas desenvolvimento)
#[utoipa::path(
    post,
    path = "/api/auth/local-login",
    tag = "Auth",
    request_body = LocalLoginPayload,
    responses(
        (status = 200, description = "Sessão local iniciada", body = AuthResponse),
        (status = 403, description = "Login local desabilitado")
    )
)]
pub async fn local_login(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    Json(payload): Json<LocalLoginPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let response = app_state
        .auth_service
        .local_login(payload.name.as_deref())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let jar = jar.add(session_cookie(response.token.clone(), app_state.settings.cookie_secure));
    Ok((StatusCode::OK, jar, Json(response)))
}

// POST /api/auth/logout
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses(
        (status = 204, description = "Cookie de sessão removido")
    )
)]
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(SESSION_COOKIE_NAME).path("/"));
    (StatusCode::NO_CONTENT, jar)
}

// GET /api/auth/me
#[utoipa::path(
    get,
    path = "/api/auth/me",
    tag = "Auth",
    responses(
        (status = 200, description = "Usuário da sessão", body = User),
        (status = 401, description = "Não autorizado")
    ),
    security(
        ("api_jwt" = [])
    )
)]
pub async fn get_me(AuthenticatedUser(user): AuthenticatedUser) -> Json<User> {
    Json(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_cookie_is_http_only_and_scoped_to_root() {
        let cookie = session_cookie("abc".to_string(), true);

        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
    }
}
