/// HTTP handlers for the comment service
///
/// Each handler validates its input, makes exactly one `ThreadService` call
/// and serializes the result; storage errors map to responses via `AppError`.
pub mod comments;
pub mod posts;
pub mod users;

use crate::config::PaginationConfig;
use crate::error::AppError;
use crate::services::ThreadService;
use actix_web::{web, HttpResponse};
use serde::Deserialize;

pub use comments::{create_comment, get_comment};
pub use posts::{create_post, get_post, list_posts};
pub use users::{create_user, get_user};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub service: ThreadService,
    pub pagination: PaginationConfig,
}

impl AppState {
    pub fn new(service: ThreadService, pagination: PaginationConfig) -> Self {
        Self {
            service,
            pagination,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

/// Register all routes under `/api/v1`
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .route("/health", web::get().to(health))
            .service(
                web::scope("/users")
                    .service(web::resource("").route(web::post().to(create_user)))
                    .service(web::resource("/{user_id}").route(web::get().to(get_user))),
            )
            .service(
                web::scope("/posts")
                    .service(
                        web::resource("")
                            .route(web::get().to(list_posts))
                            .route(web::post().to(create_post)),
                    )
                    .service(web::resource("/{post_id}").route(web::get().to(get_post))),
            )
            .service(
                web::scope("/comments")
                    .service(web::resource("").route(web::post().to(create_comment)))
                    .service(web::resource("/{comment_id}").route(web::get().to(get_comment))),
            ),
    );
}

/// Store health check
pub async fn health(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    state
        .service
        .health_check()
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "Health check failed");
            AppError::Unavailable("storage backend unreachable".to_string())
        })?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "status": "ok" })))
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::BadRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}
