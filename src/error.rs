use actix_web::{http::StatusCode, ResponseError};
use log::{debug, error};
use sea_orm::{DbErr, SqlErr};
use thiserror::Error;

use crate::response::response_from_error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("please login first")]
    Unauthorized,
    #[error("system_exception")]
    Internal,
}

impl AppError {
    pub fn param_error(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn need_login() -> Self {
        Self::Unauthorized
    }

    pub fn system_exception() -> Self {
        Self::Internal
    }

    pub fn msg(&self) -> String {
        self.to_string()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        match classify_sql_err(&err) {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                debug!("unique violation: {}", detail);
                AppError::param_error("a record with these values already exists")
            }
            Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
                debug!("foreign key violation: {}", detail);
                AppError::param_error("referenced record is missing or still in use")
            }
            _ => {
                error!("database error: {}", err);
                AppError::system_exception()
            }
        }
    }
}

fn classify_sql_err(err: &DbErr) -> Option<SqlErr> {
    if let Some(sql_err) = err.sql_err() {
        return Some(sql_err);
    }
    let msg = err.to_string();
    if msg.contains("UNIQUE constraint") || msg.contains("Duplicate entry") {
        return Some(SqlErr::UniqueConstraintViolation(msg));
    }
    if msg.contains("FOREIGN KEY constraint") || msg.contains("foreign key constraint fails") {
        return Some(SqlErr::ForeignKeyConstraintViolation(msg));
    }
    None
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> actix_web::HttpResponse {
        response_from_error(self)
    }
}
