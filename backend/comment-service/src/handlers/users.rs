use super::{require_non_blank, AppState};
use crate::domain::models::NewUser;
use crate::error::Result;
use actix_web::{web, HttpResponse};

/// Create a user
pub async fn create_user(
    state: web::Data<AppState>,
    req: web::Json<NewUser>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    require_non_blank("username", &req.username)?;

    let user = state.service.create_user(req).await?;
    Ok(HttpResponse::Created().json(user))
}

/// Get a user by ID
pub async fn get_user(
    state: web::Data<AppState>,
    user_id: web::Path<i64>,
) -> Result<HttpResponse> {
    let user = state.service.get_user(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}
