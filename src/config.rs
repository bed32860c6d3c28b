use std::env;

/// Longest accepted session lifetime, ten years.
pub const MAX_SESSION_AGE_SECS: i64 = 10 * 365 * 86_400;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub sqlite_path: String,
    pub database_url: Option<String>,
    pub session_cookie: String,
    pub session_max_age_secs: i64,
    pub session_cookie_secure: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            sqlite_path: "./data/news.sqlite".to_string(),
            database_url: None,
            session_cookie: "sid".to_string(),
            session_max_age_secs: 86_400,
            session_cookie_secure: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let server_port = env::var("SERVER_PORT")
            .or_else(|_| env::var("PORT"))
            .ok()
            .and_then(|v| v.parse::<u16>().ok())
            .unwrap_or(defaults.server_port);

        let sqlite_path = env::var("SQLITE_PATH").unwrap_or(defaults.sqlite_path);
        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let session_cookie = env::var("SESSION_COOKIE_NAME")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.session_cookie);

        let session_max_age_secs = parse_max_age(env::var("SESSION_MAX_AGE_SECS").ok().as_deref())
            .unwrap_or(defaults.session_max_age_secs);

        let session_cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
            .unwrap_or(defaults.session_cookie_secure);

        Self {
            server_port,
            sqlite_path,
            database_url,
            session_cookie,
            session_max_age_secs,
            session_cookie_secure,
        }
    }

    pub fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        let path = self.sqlite_path.trim();
        if path.starts_with("sqlite:") || path.starts_with("file:") {
            return path.to_string();
        }
        format!("sqlite://{}?mode=rwc", path)
    }
}

fn parse_max_age(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|v| *v > 0)
        .map(|v| v.min(MAX_SESSION_AGE_SECS))
}
