//! Shared fixtures for handler tests: an in-memory database and the full app.

use sea_orm::DatabaseConnection;

pub async fn test_db() -> DatabaseConnection {
    crate::db::connect_url("sqlite::memory:")
        .await
        .expect("in-memory database")
}

/// Builds the application around `$db` and returns the initialised service.
macro_rules! test_app {
    ($db:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new(crate::config::AppConfig::default()))
                .app_data(actix_web::web::Data::new($db.clone()))
                .app_data(
                    actix_web::web::JsonConfig::default()
                        .error_handler(crate::response::json_error_handler),
                )
                .configure(crate::routes::config),
        )
        .await
    };
}

/// Registers a user through the API. Yields `(user_id, session_cookie)`.
macro_rules! signup {
    ($app:expr, $username:expr, $email:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/users")
            .set_json(serde_json::json!({
                "username": $username,
                "email": $email,
                "password": "password123",
            }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "sid")
            .expect("session cookie")
            .into_owned();
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        (body["id"].as_i64().expect("user id") as i32, cookie)
    }};
}

/// Creates a post as the owner of `$cookie`. Yields the post id.
macro_rules! submit_post {
    ($app:expr, $cookie:expr, $title:expr, $url:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/posts")
            .cookie($cookie.clone())
            .set_json(serde_json::json!({ "title": $title, "post_url": $url }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        let body: serde_json::Value = actix_web::test::read_body_json(resp).await;
        body["id"].as_i64().expect("post id") as i32
    }};
}

/// Sends one request and yields `(status, json_body)`; empty bodies come back as `Null`.
macro_rules! send {
    ($app:expr, $req:expr) => {{
        let resp = actix_web::test::call_service(&$app, $req.to_request()).await;
        let status = resp.status();
        let bytes = actix_web::test::read_body(resp).await;
        let body: serde_json::Value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, body)
    }};
}
