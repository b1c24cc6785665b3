use super::{require_non_blank, AppState, PaginationParams};
use crate::domain::models::NewPost;
use crate::error::Result;
use actix_web::{web, HttpResponse};

/// Create a post
pub async fn create_post(
    state: web::Data<AppState>,
    req: web::Json<NewPost>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    require_non_blank("title", &req.title)?;
    require_non_blank("content", &req.content)?;

    let post = state.service.create_post(req).await?;
    Ok(HttpResponse::Created().json(post))
}

/// List posts, one page at a time
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = state.pagination.request(query.limit, query.offset);
    let posts = state.service.list_posts(page).await?;
    Ok(HttpResponse::Ok().json(posts))
}

/// Get a post with its comment tree
pub async fn get_post(
    state: web::Data<AppState>,
    post_id: web::Path<i64>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = state.pagination.request(query.limit, query.offset);
    let post = state.service.get_post(post_id.into_inner(), page).await?;
    Ok(HttpResponse::Ok().json(post))
}
