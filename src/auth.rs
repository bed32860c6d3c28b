use actix_web::cookie::{time, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use futures_util::future::LocalBoxFuture;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::repo::{session as session_repo, user as user_repo};

/// The logged-in user behind the request's session cookie.
#[derive(Clone, Debug)]
pub struct SessionUser {
    pub sid: String,
    pub user_id: i32,
    pub username: String,
}

#[derive(Clone, Debug)]
pub struct OptionalSession(pub Option<SessionUser>);

impl FromRequest for SessionUser {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = match req.app_data::<web::Data<DatabaseConnection>>() {
            Some(db) => db.clone(),
            None => {
                return Box::pin(async { Err(AppError::system_exception().into()) });
            }
        };
        let config = match req.app_data::<web::Data<AppConfig>>() {
            Some(cfg) => cfg.clone(),
            None => {
                return Box::pin(async { Err(AppError::system_exception().into()) });
            }
        };
        let sid = extract_sid(req, &config);

        Box::pin(async move {
            let sid = sid.ok_or_else(AppError::need_login)?;
            let user = load_session(&db, &sid).await?.ok_or_else(AppError::need_login)?;
            Ok(user)
        })
    }
}

impl FromRequest for OptionalSession {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let db = match req.app_data::<web::Data<DatabaseConnection>>() {
            Some(db) => db.clone(),
            None => {
                return Box::pin(async { Ok(OptionalSession(None)) });
            }
        };
        let config = match req.app_data::<web::Data<AppConfig>>() {
            Some(cfg) => cfg.clone(),
            None => {
                return Box::pin(async { Ok(OptionalSession(None)) });
            }
        };
        let sid = extract_sid(req, &config);

        Box::pin(async move {
            let Some(sid) = sid else {
                return Ok(OptionalSession(None));
            };
            let user = load_session(&db, &sid).await?;
            Ok(OptionalSession(user))
        })
    }
}

fn extract_sid(req: &HttpRequest, config: &AppConfig) -> Option<String> {
    req.cookie(&config.session_cookie)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Resolves a live session to its user. The username is read from `user` so a
/// rename shows up on the very next request.
async fn load_session(db: &DatabaseConnection, sid: &str) -> Result<Option<SessionUser>, AppError> {
    let Some(found) = session_repo::find_active(db, sid).await? else {
        return Ok(None);
    };
    if !found.logged_in {
        return Ok(None);
    }
    let Some(user) = user_repo::find_by_id(db, found.user_id).await? else {
        return Ok(None);
    };
    Ok(Some(SessionUser {
        sid: found.sid,
        user_id: user.id,
        username: user.username,
    }))
}

pub fn session_cookie(config: &AppConfig, sid: &str) -> Cookie<'static> {
    Cookie::build(config.session_cookie.clone(), sid.to_string())
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.session_cookie_secure)
        .max_age(time::Duration::seconds(config.session_max_age_secs))
        .finish()
}

pub fn removal_cookie(config: &AppConfig) -> Cookie<'static> {
    let mut cookie = Cookie::build(config.session_cookie.clone(), "")
        .path("/")
        .http_only(true)
        .finish();
    cookie.make_removal();
    cookie
}
