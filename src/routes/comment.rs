use actix_web::{web, HttpResponse};
use log::debug;
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::auth::SessionUser;
use crate::error::AppError;
use crate::repo::comment::{self as comment_repo, NewComment};
use crate::response::MessageDto;
use crate::routes::dto::CommentDto;
use crate::validate;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_comments))
            .route(web::post().to(create_comment)),
    )
    .service(web::resource("/{id:\\d+}").route(web::delete().to(delete_comment)));
}

#[derive(Deserialize)]
struct CreateCommentRequest {
    comment_text: Option<String>,
    post_id: i32,
}

async fn list_comments(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let rows = comment_repo::list_all(db.get_ref()).await?;
    let list: Vec<CommentDto> = rows.into_iter().map(CommentDto::from).collect();
    Ok(HttpResponse::Ok().json(list))
}

async fn create_comment(
    db: web::Data<DatabaseConnection>,
    auth: SessionUser,
    payload: web::Json<CreateCommentRequest>,
) -> Result<HttpResponse, AppError> {
    let comment_text = validate::required("comment_text", payload.comment_text.as_deref())?;
    let comment = comment_repo::insert(
        db.get_ref(),
        NewComment {
            comment_text,
            user_id: auth.user_id,
            post_id: payload.post_id,
        },
    )
    .await?;
    debug!("comment saved id={} post={}", comment.id, comment.post_id);
    Ok(HttpResponse::Ok().json(CommentDto::from_model(comment, Some(auth.username))))
}

async fn delete_comment(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    if !comment_repo::delete(db.get_ref(), path.into_inner()).await? {
        return Err(AppError::not_found("No comment with this id was found"));
    }
    Ok(HttpResponse::Ok().json(MessageDto::new("Comment deleted")))
}
