use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::AppState;
use crate::services::AuthService;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    pub password: String,
}

/// Ответ шлюза доступа: токен присутствует только при успехе
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/validate", post(validate))
}

/// Проверка общего пароля и выдача токена
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Результат проверки пароля", body = AuthResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    if payload.password == state.config.access_password {
        let token = AuthService::new(state.config.clone()).generate_token()?;
        return Ok(Json(AuthResponse {
            success: true,
            message: "Доступ разрешён".to_string(),
            token: Some(token),
        }));
    }

    tracing::warn!("login attempt with wrong access password");
    Ok(Json(AuthResponse {
        success: false,
        message: "Неверный пароль".to_string(),
        token: None,
    }))
}

/// Проверка действительности токена
#[utoipa::path(
    post,
    path = "/api/auth/validate",
    tag = "auth",
    responses(
        (status = 200, description = "Результат проверки токена", body = AuthResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn validate(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<AuthResponse>> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    if let Some(token) = token {
        let auth_service = AuthService::new(state.config.clone());
        if auth_service.verify_token(token).is_ok() {
            return Ok(Json(AuthResponse {
                success: true,
                message: "Токен действителен".to_string(),
                token: Some(token.to_string()),
            }));
        }
    }

    Ok(Json(AuthResponse {
        success: false,
        message: "Токен недействителен или истёк".to_string(),
        token: None,
    }))
}
