use actix_web::{web, HttpResponse};

use crate::error::AuthError;
use crate::handlers::auth::load_current_user;
use crate::middleware::CurrentUser;
use crate::models::user::CurrentUserResponse;
use crate::AppState;

pub async fn current_user(
    state: web::Data<AppState>,
    current: CurrentUser,
) -> Result<HttpResponse, AuthError> {
    let user = load_current_user(&state, &current).await?;

    Ok(HttpResponse::Ok().json(CurrentUserResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        role: user.role,
        totp_enabled: user.totp_enabled,
    }))
}
