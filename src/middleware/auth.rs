// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::i18n::Locale,
    models::auth::User,
    services::auth::SESSION_COOKIE_NAME,
};

/// Credencial da requisição: `Authorization: Bearer ...` tem prioridade sobre o cookie de sessão.
pub fn session_token(headers: &HeaderMap, jar: &CookieJar) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string);

    bearer.or_else(|| {
        jar.get(SESSION_COOKIE_NAME)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

// O middleware em si: resolve o usuário pelas estratégias configuradas
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = session_token(request.headers(), &jar)
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let user = app_state
        .auth_service
        .authenticate(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Insere o usuário nos "extensions" da requisição
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<User>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| {
                AppError::InvalidToken.to_api_error(&Locale::from_headers(&parts.headers), &I18nStore::default())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use axum_extra::extract::cookie::Cookie;

    #[test]
    fn bearer_header_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, "do-cookie"));

        assert_eq!(session_token(&headers, &jar).as_deref(), Some("abc"));
    }

    #[test]
    fn falls_back_to_session_cookie() {
        let jar = CookieJar::new().add(Cookie::new(SESSION_COOKIE_NAME, "do-cookie"));
        assert_eq!(session_token(&HeaderMap::new(), &jar).as_deref(), Some("do-cookie"));
    }

    #[test]
    fn no_credentials_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic xyz"));
        assert_eq!(session_token(&headers, &CookieJar::new()), None);
    }
}
