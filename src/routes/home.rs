use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::collections::HashMap;

use crate::auth::OptionalSession;
use crate::error::AppError;
use crate::helpers::{format_date, format_plural, format_url};
use crate::repo::{comment as comment_repo, post as post_repo};
use crate::repo::post::PostRow;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(home)));
}

/// One post as the front page shows it.
#[derive(Serialize)]
struct FeedItemDto {
    id: i32,
    title: String,
    post_url: String,
    display_url: String,
    created: Option<String>,
    author: Option<String>,
    vote_count: i64,
    vote_label: String,
    comment_count: i64,
    comment_label: String,
}

#[derive(Serialize)]
struct HomeDto {
    logged_in: bool,
    username: Option<String>,
    posts: Vec<FeedItemDto>,
}

impl FeedItemDto {
    fn new(row: PostRow, comment_count: i64) -> Self {
        Self {
            id: row.id,
            display_url: format_url(&row.post_url),
            title: row.title,
            post_url: row.post_url,
            created: row.created_at.map(|dt| format_date(dt.naive_utc())),
            author: row.username,
            vote_count: row.vote_count,
            vote_label: format!("{} {}", row.vote_count, format_plural("point", row.vote_count)),
            comment_count,
            comment_label: format!("{} {}", comment_count, format_plural("comment", comment_count)),
        }
    }
}

async fn home(
    db: web::Data<DatabaseConnection>,
    session: OptionalSession,
) -> Result<HttpResponse, AppError> {
    let rows = post_repo::list_with_votes(db.get_ref()).await?;
    let mut comment_counts: HashMap<i32, i64> = HashMap::new();
    for comment in comment_repo::list_all(db.get_ref()).await? {
        *comment_counts.entry(comment.post_id).or_default() += 1;
    }
    let posts = rows
        .into_iter()
        .map(|row| {
            let count = comment_counts.get(&row.id).copied().unwrap_or(0);
            FeedItemDto::new(row, count)
        })
        .collect();

    Ok(HttpResponse::Ok().json(HomeDto {
        logged_in: session.0.is_some(),
        username: session.0.map(|s| s.username),
        posts,
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use serde_json::json;

    use crate::test_support::test_db;

    #[actix_web::test]
    async fn home_feed_formats_posts() {
        let db = test_db().await;
        let app = test_app!(db);
        let (_, cookie) = signup!(app, "alice", "alice@example.com");
        let post_id = submit_post!(app, cookie, "Cool stuff", "https://www.coolstuff.com/abcdefg/");

        let (status, _) = send!(
            app,
            TestRequest::post()
                .uri("/api/comments")
                .cookie(cookie.clone())
                .set_json(json!({ "comment_text": "neat", "post_id": post_id }))
        );
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send!(app, TestRequest::get().uri("/").cookie(cookie));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logged_in"], true);
        assert_eq!(body["username"], "alice");
        let item = &body["posts"][0];
        assert_eq!(item["display_url"], "coolstuff.com");
        assert_eq!(item["author"], "alice");
        assert_eq!(item["vote_label"], "0 points");
        assert_eq!(item["comment_label"], "1 comment");
        let created = item["created"].as_str().unwrap();
        assert_eq!(created.split('/').count(), 3);
    }

    #[actix_web::test]
    async fn anonymous_home_feed() {
        let db = test_db().await;
        let app = test_app!(db);

        let (status, body) = send!(app, TestRequest::get().uri("/"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["logged_in"], false);
        assert!(body["username"].is_null());
        assert_eq!(body["posts"].as_array().unwrap().len(), 0);
    }
}
