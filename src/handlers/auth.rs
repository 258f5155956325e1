/// Authentication handlers
use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::error::AuthError;
use crate::middleware::CurrentUser;
use crate::models::user::{
    LoginRequest, LoginResponse, PendingTwoFactorResponse, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest, RegisterResponse, TwoFactorLoginRequest,
    ValidateTotpRequest,
};
use crate::models::User;
use crate::security::{password, totp};
use crate::services::LoginOutcome;
use crate::{db, AppState};

const ALLOWED_ROLES: [&str; 3] = ["member", "moderator", "admin"];

pub async fn index() -> HttpResponse {
    HttpResponse::Ok().body("REST API Authentication and Authorization")
}

pub async fn register(
    state: web::Data<AppState>,
    payload: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::Validation("Please fill in all fields".to_string()));
    }

    let role = payload.role.as_deref().unwrap_or("member");
    if !ALLOWED_ROLES.contains(&role) {
        return Err(AuthError::Validation(format!("Unknown role: {role}")));
    }

    let email = payload.email.trim().to_lowercase();
    if db::users::email_exists(&state.db, &email).await? {
        return Err(AuthError::DuplicateEmail);
    }

    let password_hash = password::hash_password(&payload.password)?;
    let user = db::users::create_user(
        &state.db,
        payload.name.trim(),
        &email,
        &password_hash,
        role,
    )
    .await?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User registered successfully".to_string(),
        id: user.id,
    }))
}

pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::Validation("Please fill in all fields".to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    match state.sessions.login(&email, &payload.password).await? {
        LoginOutcome::Authenticated(tokens) => Ok(HttpResponse::Ok().json(LoginResponse {
            id: tokens.user_id,
            name: tokens.name,
            email: tokens.email,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })),
        LoginOutcome::SecondFactorRequired {
            temp_token,
            expires_in_seconds,
        } => Ok(HttpResponse::Ok().json(PendingTwoFactorResponse {
            temp_token,
            expires_in_seconds,
        })),
    }
}

pub async fn login_2fa(
    state: web::Data<AppState>,
    payload: web::Json<TwoFactorLoginRequest>,
) -> Result<HttpResponse, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::Validation(
            "Please fill in all fields (tempToken, totp)".to_string(),
        ));
    }

    let tokens = state
        .sessions
        .complete_second_factor(&payload.temp_token, &payload.totp)
        .await?;

    Ok(HttpResponse::Ok().json(LoginResponse {
        id: tokens.user_id,
        name: tokens.name,
        email: tokens.email,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

pub async fn refresh_token(
    state: web::Data<AppState>,
    payload: web::Json<RefreshTokenRequest>,
) -> Result<HttpResponse, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::Validation(
            "Please fill in all fields (refreshToken)".to_string(),
        ));
    }

    let pair = state.sessions.refresh(&payload.refresh_token).await?;

    Ok(HttpResponse::Ok().json(RefreshTokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    }))
}

/// Generate (or regenerate) the caller's TOTP secret and return it as a
/// scannable QR code. Does not enable the factor.
pub async fn generate_2fa(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, AuthError> {
    let user = load_current_user(&state, &current).await?;

    let (_, uri) = state.sessions.second_factor().generate_secret(&user).await?;
    let png = totp::qr_png(&uri)?;

    Ok(HttpResponse::Ok()
        .content_type("image/png")
        .insert_header(("Content-Disposition", "attachment; filename=qrcode.png"))
        .body(png))
}

/// Prove possession of the freshly enrolled secret and activate the
/// second factor.
pub async fn validate_2fa(
    state: web::Data<AppState>,
    current: CurrentUser,
    payload: web::Json<ValidateTotpRequest>,
) -> Result<HttpResponse, AuthError> {
    if payload.validate().is_err() {
        return Err(AuthError::Validation("TOTP is required".to_string()));
    }

    let user = load_current_user(&state, &current).await?;
    state
        .sessions
        .second_factor()
        .verify_and_activate(&user, &payload.totp)
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "TOTP validated successfully"
    })))
}

pub async fn logout(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, AuthError> {
    state.sessions.logout(&current.0).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Resolve the authenticated principal to its user row. A token whose
/// user no longer exists is treated like any other invalid token.
pub(crate) async fn load_current_user(
    state: &AppState,
    current: &CurrentUser,
) -> Result<User, AuthError> {
    db::users::find_by_id(&state.db, current.0.user_id)
        .await?
        .ok_or(AuthError::TokenMalformed)
}
