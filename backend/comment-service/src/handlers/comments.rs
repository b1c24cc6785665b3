/// Comment handlers - create comments/replies and expand reply trees
use super::{require_non_blank, AppState, PaginationParams};
use crate::domain::models::NewComment;
use crate::error::Result;
use actix_web::{web, HttpResponse};

/// Create a comment, or a reply when `parent_id` is set
pub async fn create_comment(
    state: web::Data<AppState>,
    req: web::Json<NewComment>,
) -> Result<HttpResponse> {
    let req = req.into_inner();
    require_non_blank("content", &req.content)?;

    let comment = state.service.create_comment(req).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// Get a comment with its reply tree
pub async fn get_comment(
    state: web::Data<AppState>,
    comment_id: web::Path<i64>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    let page = state.pagination.request(query.limit, query.offset);
    let comment = state
        .service
        .get_comment(comment_id.into_inner(), page)
        .await?;
    Ok(HttpResponse::Ok().json(comment))
}
