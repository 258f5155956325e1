/// Role-gated demo routes. Roles live on the user row, not in the token,
/// so a role change takes effect on the next request rather than the
/// next login.
use actix_web::{web, HttpResponse};

use crate::error::AuthError;
use crate::handlers::auth::load_current_user;
use crate::middleware::CurrentUser;
use crate::AppState;

pub async fn admin_only(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, AuthError> {
    require_role(&state, &current, &["admin"]).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Only admins can access this route!"
    })))
}

pub async fn admin_or_moderator(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, AuthError> {
    require_role(&state, &current, &["admin", "moderator"]).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Admins and moderators can access this route!"
    })))
}

async fn require_role(
    state: &AppState,
    current: &CurrentUser,
    allowed: &[&str],
) -> Result<(), AuthError> {
    let user = load_current_user(state, current).await?;
    if allowed.contains(&user.role.as_str()) {
        Ok(())
    } else {
        Err(AuthError::Forbidden)
    }
}
