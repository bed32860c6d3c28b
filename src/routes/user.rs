use actix_web::{web, HttpResponse};
use log::{debug, info};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};

use crate::auth::{removal_cookie, session_cookie, OptionalSession};
use crate::config::AppConfig;
use crate::error::AppError;
use crate::password::{verify_password, HashedPassword};
use crate::repo::user::{NewUser, UserChanges};
use crate::repo::{comment as comment_repo, post as post_repo, session as session_repo, user as user_repo};
use crate::response::MessageDto;
use crate::routes::dto::{to_rfc3339, UserDto};
use crate::validate;

const LOGIN_FAILED: &str = "Incorrect email or password!";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    )
    .service(web::resource("/login").route(web::post().to(login)))
    .service(web::resource("/logout").route(web::post().to(logout)))
    .service(
        web::resource("/{id:\\d+}")
            .route(web::get().to(get_user))
            .route(web::put().to(update_user))
            .route(web::delete().to(delete_user)),
    );
}

#[derive(Deserialize)]
struct CreateUserRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct UpdateUserRequest {
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
}

#[derive(Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct LoginResponse {
    user: UserDto,
    message: String,
}

#[derive(Serialize)]
struct UserPostDto {
    id: i32,
    title: String,
    post_url: String,
    created_at: Option<String>,
}

#[derive(Serialize)]
struct PostTitleDto {
    title: Option<String>,
}

#[derive(Serialize)]
struct UserCommentDto {
    id: i32,
    comment_text: String,
    post_id: i32,
    user_id: i32,
    created_at: Option<String>,
    post: PostTitleDto,
}

#[derive(Serialize)]
struct VotedPostDto {
    id: i32,
    title: String,
}

#[derive(Serialize)]
struct UserDetailDto {
    id: i32,
    username: String,
    email: String,
    posts: Vec<UserPostDto>,
    comments: Vec<UserCommentDto>,
    voted_posts: Vec<VotedPostDto>,
}

async fn list_users(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let users = user_repo::find_all(db.get_ref()).await?;
    let list: Vec<UserDto> = users.into_iter().map(UserDto::from).collect();
    Ok(HttpResponse::Ok().json(list))
}

async fn get_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    let user = user_repo::find_by_id(db.get_ref(), user_id)
        .await?
        .ok_or_else(|| AppError::not_found("No user found with this id"))?;

    let posts = post_repo::find_by_user(db.get_ref(), user_id).await?;
    let comments = comment_repo::list_by_user(db.get_ref(), user_id).await?;
    let voted = post_repo::find_voted_by(db.get_ref(), user_id).await?;

    let dto = UserDetailDto {
        id: user.id,
        username: user.username,
        email: user.email,
        posts: posts
            .into_iter()
            .map(|p| UserPostDto {
                id: p.id,
                title: p.title,
                post_url: p.post_url,
                created_at: p.created_at.map(to_rfc3339),
            })
            .collect(),
        comments: comments
            .into_iter()
            .map(|c| UserCommentDto {
                id: c.id,
                comment_text: c.comment_text,
                post_id: c.post_id,
                user_id: c.user_id,
                created_at: c.created_at.map(to_rfc3339),
                post: PostTitleDto { title: c.post_title },
            })
            .collect(),
        voted_posts: voted
            .into_iter()
            .map(|p| VotedPostDto { id: p.id, title: p.title })
            .collect(),
    };
    Ok(HttpResponse::Ok().json(dto))
}

async fn create_user(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    payload: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let username = validate::required("username", payload.username.as_deref())?;
    let email = validate::required("email", payload.email.as_deref())?;
    validate::email(&email)?;
    let password = payload.password.as_deref().unwrap_or_default();
    let password = HashedPassword::from_plain(password)?;

    let (user, session) = user_repo::register(
        db.get_ref(),
        NewUser {
            username,
            email,
            password,
        },
        config.session_max_age_secs,
    )
    .await?;
    debug!("user registered id={}", user.id);

    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&config, &session.sid))
        .json(UserDto::from(user)))
}

async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    payload: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let email = validate::required("email", payload.email.as_deref())?;
    let password = payload.password.clone().unwrap_or_default();

    let user = user_repo::find_by_email(db.get_ref(), &email)
        .await?
        .ok_or_else(|| AppError::param_error(LOGIN_FAILED))?;
    if !verify_password(&password, &user.password) {
        return Err(AppError::param_error(LOGIN_FAILED));
    }

    let session = session_repo::start(db.get_ref(), &user, config.session_max_age_secs).await?;
    info!("user {} logged in", user.id);
    Ok(HttpResponse::Ok()
        .cookie(session_cookie(&config, &session.sid))
        .json(LoginResponse {
            user: UserDto::from(user),
            message: "You are now logged in!".to_string(),
        }))
}

async fn logout(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    session: OptionalSession,
) -> Result<HttpResponse, AppError> {
    let Some(session) = session.0 else {
        return Err(AppError::not_found("No active session"));
    };
    session_repo::destroy(db.get_ref(), &session.sid).await?;
    debug!("session closed for user {}", session.user_id);
    Ok(HttpResponse::NoContent().cookie(removal_cookie(&config)).finish())
}

async fn update_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let mut changes = UserChanges::default();
    if payload.username.is_some() {
        changes.username = Some(validate::required("username", payload.username.as_deref())?);
    }
    if payload.email.is_some() {
        let email = validate::required("email", payload.email.as_deref())?;
        validate::email(&email)?;
        changes.email = Some(email);
    }
    if let Some(password) = payload.password.as_deref() {
        changes.password = Some(HashedPassword::from_plain(password)?);
    }

    let user = user_repo::update(db.get_ref(), path.into_inner(), changes)
        .await?
        .ok_or_else(|| AppError::not_found("No user found with this id"))?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

async fn delete_user(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    if !user_repo::delete(db.get_ref(), user_id).await? {
        return Err(AppError::not_found("No user found with this id"));
    }
    info!("user {} deleted", user_id);
    Ok(HttpResponse::Ok().json(MessageDto::new("User deleted")))
}
