use actix_web::{web, HttpResponse};
use log::{debug, info};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::auth::SessionUser;
use crate::error::AppError;
use crate::repo::post::NewPost;
use crate::repo::{comment as comment_repo, post as post_repo, vote as vote_repo};
use crate::response::MessageDto;
use crate::routes::dto::{group_comments, PlainPostDto, PostVotesDto};
use crate::validate;

const POST_NOT_FOUND: &str = "No post with this id was found";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("")
            .route(web::get().to(list_posts))
            .route(web::post().to(create_post)),
    )
    .service(web::resource("/upvote").route(web::put().to(upvote)))
    .service(
        web::resource("/{id:\\d+}")
            .route(web::get().to(get_post))
            .route(web::put().to(update_post))
            .route(web::delete().to(delete_post)),
    );
}

#[derive(Deserialize)]
struct CreatePostRequest {
    title: Option<String>,
    post_url: Option<String>,
}

#[derive(Deserialize)]
struct UpdatePostRequest {
    title: Option<String>,
}

#[derive(Deserialize)]
struct UpvoteRequest {
    post_id: PostIdParam,
}

/// Browsers send the id they read from the page URL, so a numeric string is
/// accepted as well as a number.
#[derive(Deserialize)]
#[serde(untagged)]
enum PostIdParam {
    Number(i32),
    Text(String),
}

impl PostIdParam {
    fn to_id(&self) -> Result<i32, AppError> {
        match self {
            PostIdParam::Number(id) => Ok(*id),
            PostIdParam::Text(raw) => raw
                .trim()
                .parse()
                .map_err(|_| AppError::param_error("post_id must be a number")),
        }
    }
}

async fn list_posts(db: web::Data<DatabaseConnection>) -> Result<HttpResponse, AppError> {
    let rows = post_repo::list_with_votes(db.get_ref()).await?;
    let comments = comment_repo::list_all(db.get_ref()).await?;
    Ok(HttpResponse::Ok().json(group_comments(rows, comments)))
}

async fn get_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let row = post_repo::find_with_votes(db.get_ref(), path.into_inner())
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_FOUND))?;
    let comments = comment_repo::list_for_post(db.get_ref(), row.id).await?;
    let dto = group_comments(vec![row], comments)
        .pop()
        .ok_or_else(AppError::system_exception)?;
    Ok(HttpResponse::Ok().json(dto))
}

async fn create_post(
    db: web::Data<DatabaseConnection>,
    auth: SessionUser,
    payload: web::Json<CreatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let title = validate::required("title", payload.title.as_deref())?;
    let post_url = validate::required("post_url", payload.post_url.as_deref())?;
    validate::post_url(&post_url)?;

    let post = post_repo::insert(
        db.get_ref(),
        NewPost {
            title,
            post_url,
            user_id: auth.user_id,
        },
    )
    .await?;
    debug!("post saved id={} user={}", post.id, auth.user_id);
    Ok(HttpResponse::Ok().json(PlainPostDto::from(post)))
}

async fn upvote(
    db: web::Data<DatabaseConnection>,
    auth: SessionUser,
    payload: web::Json<UpvoteRequest>,
) -> Result<HttpResponse, AppError> {
    let post_id = payload.post_id.to_id()?;
    let row = vote_repo::upvote(db.get_ref(), auth.user_id, post_id)
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(PostVotesDto::from(row)))
}

async fn update_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
    payload: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse, AppError> {
    let title = validate::required("title", payload.title.as_deref())?;
    let post = post_repo::update_title(db.get_ref(), path.into_inner(), title)
        .await?
        .ok_or_else(|| AppError::not_found(POST_NOT_FOUND))?;
    Ok(HttpResponse::Ok().json(PlainPostDto::from(post)))
}

async fn delete_post(
    db: web::Data<DatabaseConnection>,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let post_id = path.into_inner();
    if !post_repo::delete(db.get_ref(), post_id).await? {
        return Err(AppError::not_found(POST_NOT_FOUND));
    }
    info!("post {} deleted", post_id);
    Ok(HttpResponse::Ok().json(MessageDto::new("Post deleted")))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use sea_orm::ConnectionTrait;
    use serde_json::json;

    use crate::repo::{post as post_repo, vote as vote_repo};
    use crate::test_support::test_db;

    #[actix_web::test]
    async fn fresh_post_has_zero_votes_then_one() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, author) = signup!(app, "alice", "alice@example.com");
        let (_, voter) = signup!(app, "bob", "bob@example.com");
        let post_id = submit_post!(app, author, "Hello", "https://example.com/hello");

        let (status, body) = send!(app, TestRequest::get().uri(&format!("/api/posts/{}", post_id)));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vote_count"], 0);

        let (status, body) = send!(
            app,
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(voter.clone())
                .set_json(json!({ "post_id": post_id }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], post_id);
        assert_eq!(body["vote_count"], 1);
        assert_eq!(vote_repo::count_for_post(&db, post_id).await.unwrap(), 1);
    }

    #[actix_web::test]
    async fn second_vote_by_the_same_user_is_rejected() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, author) = signup!(app, "alice", "alice@example.com");
        let post_id = submit_post!(app, author, "Hello", "https://example.com/hello");

        let upvote = || {
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(author.clone())
                .set_json(json!({ "post_id": post_id }))
        };
        let (status, _) = send!(app, upvote());
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send!(app, upvote());
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let row = post_repo::find_with_votes(&db, post_id).await.unwrap().unwrap();
        assert_eq!(row.vote_count, 1);
    }

    #[actix_web::test]
    async fn upvote_needs_a_session_and_an_existing_post() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, voter) = signup!(app, "alice", "alice@example.com");

        let (status, _) = send!(
            app,
            TestRequest::put().uri("/api/posts/upvote").set_json(json!({ "post_id": 1 }))
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send!(
            app,
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(voter)
                .set_json(json!({ "post_id": 4242 }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn listing_counts_votes_per_post() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, alice) = signup!(app, "alice", "alice@example.com");
        let (_, bob) = signup!(app, "bob", "bob@example.com");
        let first = submit_post!(app, alice, "First", "https://example.com/1");
        let second = submit_post!(app, alice, "Second", "https://example.com/2");

        for cookie in [&alice, &bob] {
            let (status, _) = send!(
                app,
                TestRequest::put()
                    .uri("/api/posts/upvote")
                    .cookie(cookie.clone())
                    .set_json(json!({ "post_id": second }))
            );
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/comments")
                .cookie(bob.clone())
                .set_json(json!({ "comment_text": "first!", "post_id": first }))
        );
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send!(app, TestRequest::get().uri("/api/posts"));
        assert_eq!(status, StatusCode::OK);
        let posts = body.as_array().unwrap();
        assert_eq!(posts.len(), 2);
        // newest first
        assert_eq!(posts[0]["id"], second);
        assert_eq!(posts[0]["vote_count"], 2);
        assert_eq!(posts[0]["user"]["username"], "alice");
        assert_eq!(posts[0]["comments"].as_array().unwrap().len(), 0);
        assert_eq!(posts[1]["id"], first);
        assert_eq!(posts[1]["vote_count"], 0);
        assert_eq!(posts[1]["comments"][0]["comment_text"], "first!");
        assert_eq!(posts[1]["comments"][0]["user"]["username"], "bob");
    }

    #[actix_web::test]
    async fn create_post_validates_url_and_session() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");

        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/posts")
                .cookie(cookie.clone())
                .set_json(json!({ "title": "Bad", "post_url": "not a url" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/posts")
                .cookie(cookie)
                .set_json(json!({ "post_url": "https://example.com" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/posts")
                .set_json(json!({ "title": "Anon", "post_url": "https://example.com" }))
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn update_and_delete_report_missing_posts() {
        let db = test_db().await;
        let app = test_app!(db);

        let (status, body) = send!(
            app,
            TestRequest::put().uri("/api/posts/77").set_json(json!({ "title": "x" }))
        );
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "No post with this id was found");

        let (status, _) = send!(app, TestRequest::delete().uri("/api/posts/77"));
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send!(app, TestRequest::get().uri("/api/posts/77"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn update_changes_only_the_title() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");
        let post_id = submit_post!(app, cookie, "Old", "https://example.com/post");

        let (status, body) = send!(
            app,
            TestRequest::put()
                .uri(&format!("/api/posts/{}", post_id))
                .set_json(json!({ "title": "New", "post_url": "https://evil.example.com" }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["title"], "New");
        assert_eq!(body["post_url"], "https://example.com/post");
    }

    #[actix_web::test]
    async fn delete_removes_votes_and_comments_with_the_post() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");
        let post_id = submit_post!(app, cookie, "Doomed", "https://example.com/doomed");

        let (status, _) = send!(
            app,
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(cookie.clone())
                .set_json(json!({ "post_id": post_id }))
        );
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/comments")
                .cookie(cookie.clone())
                .set_json(json!({ "comment_text": "bye", "post_id": post_id }))
        );
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send!(app, TestRequest::delete().uri(&format!("/api/posts/{}", post_id)));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(vote_repo::count_for_post(&db, post_id).await.unwrap(), 0);
        assert!(post_repo::find_with_votes(&db, post_id).await.unwrap().is_none());

        let (_, body) = send!(app, TestRequest::get().uri("/api/comments"));
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[actix_web::test]
    async fn upvote_accepts_the_id_as_a_string() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");
        let post_id = submit_post!(app, cookie, "Hello", "https://example.com/hello");

        let (status, body) = send!(
            app,
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(cookie.clone())
                .set_json(json!({ "post_id": post_id.to_string() }))
        );
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vote_count"], 1);

        let (status, body) = send!(
            app,
            TestRequest::put()
                .uri("/api/posts/upvote")
                .cookie(cookie)
                .set_json(json!({ "post_id": "abc" }))
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "post_id must be a number");
    }

    #[actix_web::test]
    async fn listing_handles_more_posts_than_bind_parameters() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");
        let seed = submit_post!(app, cookie, "Seed", "https://example.com/seed");
        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/comments")
                .cookie(cookie.clone())
                .set_json(json!({ "comment_text": "still here", "post_id": seed }))
        );
        assert_eq!(status, StatusCode::OK);

        // SQLite refuses statements with more than 32766 bound parameters.
        db.execute_unprepared(&format!(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 33000) \
             INSERT INTO post (title, post_url, user_id, created_at, updated_at) \
             SELECT 'bulk ' || seq.n, 'https://example.com/' || seq.n, p.user_id, p.created_at, p.updated_at \
             FROM seq, post p WHERE p.id = {}",
            seed
        ))
        .await
        .unwrap();

        let (status, body) = send!(app, TestRequest::get().uri("/api/posts"));
        assert_eq!(status, StatusCode::OK);
        let posts = body.as_array().unwrap();
        assert_eq!(posts.len(), 33_001);
        let seeded = posts.iter().find(|p| p["id"] == seed).unwrap();
        assert_eq!(seeded["comments"][0]["comment_text"], "still here");

        let (status, body) = send!(app, TestRequest::get().uri("/"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["posts"].as_array().unwrap().len(), 33_001);
    }
}
