use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, Set};

use crate::entity::{session, user};

const SID_LEN: usize = 32;

pub fn new_sid() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SID_LEN)
        .map(char::from)
        .collect()
}

/// Opens a logged-in session for `user` that lives for `max_age_secs`.
pub async fn start<C: ConnectionTrait>(
    db: &C,
    user: &user::Model,
    max_age_secs: i64,
) -> Result<session::Model, DbErr> {
    let expires = Duration::try_seconds(max_age_secs)
        .and_then(|age| Utc::now().checked_add_signed(age))
        .ok_or_else(|| DbErr::Custom(format!("session max age out of range: {}s", max_age_secs)))?
        .timestamp_millis();
    prune_expired(db).await?;
    session::ActiveModel {
        sid: Set(new_sid()),
        user_id: Set(user.id),
        username: Set(user.username.clone()),
        logged_in: Set(true),
        expires: Set(expires),
    }
    .insert(db)
    .await
}

/// Looks up a live session. An expired one is deleted and reported as absent.
pub async fn find_active<C: ConnectionTrait>(db: &C, sid: &str) -> Result<Option<session::Model>, DbErr> {
    let Some(found) = session::Entity::find_by_id(sid.to_string()).one(db).await? else {
        return Ok(None);
    };
    if found.expires <= Utc::now().timestamp_millis() {
        session::Entity::delete_by_id(found.sid).exec(db).await?;
        return Ok(None);
    }
    Ok(Some(found))
}

pub async fn destroy<C: ConnectionTrait>(db: &C, sid: &str) -> Result<bool, DbErr> {
    let result = session::Entity::delete_by_id(sid.to_string()).exec(db).await?;
    Ok(result.rows_affected > 0)
}

pub async fn prune_expired<C: ConnectionTrait>(db: &C) -> Result<u64, DbErr> {
    let result = session::Entity::delete_many()
        .filter(session::Column::Expires.lte(Utc::now().timestamp_millis()))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}
