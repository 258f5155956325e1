use actix_web::web;

use crate::handlers::{admin, auth, health, users};
use crate::middleware::RequireAuth;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(auth::index))
        .route("/health", web::get().to(health::health_check))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/login/2fa", web::post().to(auth::login_2fa))
                        .route("/refresh-token", web::post().to(auth::refresh_token))
                        .service(
                            web::scope("")
                                .wrap(RequireAuth)
                                .route("/2fa/generate", web::get().to(auth::generate_2fa))
                                .route("/2fa/validate", web::post().to(auth::validate_2fa))
                                .route("/logout", web::post().to(auth::logout)),
                        ),
                )
                .service(
                    web::scope("/users")
                        .wrap(RequireAuth)
                        .route("/current", web::get().to(users::current_user)),
                )
                .service(
                    web::scope("/admin")
                        .wrap(RequireAuth)
                        .route("", web::get().to(admin::admin_only))
                        .route("/moderator", web::get().to(admin::admin_or_moderator)),
                ),
        );
}
