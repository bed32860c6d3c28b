use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::{flatten_tx, session as session_repo};
use crate::entity::{session, user};
use crate::password::HashedPassword;

#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password: HashedPassword,
}

#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<HashedPassword>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.email.is_none() && self.password.is_none()
    }
}

pub async fn find_all<C: ConnectionTrait>(db: &C) -> Result<Vec<user::Model>, DbErr> {
    user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
}

pub async fn find_by_id<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find_by_id(id).one(db).await
}

pub async fn find_by_email<C: ConnectionTrait>(
    db: &C,
    email: &str,
) -> Result<Option<user::Model>, DbErr> {
    user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(db: &C, new_user: NewUser) -> Result<user::Model, DbErr> {
    user::ActiveModel {
        username: Set(new_user.username),
        email: Set(new_user.email),
        password: Set(new_user.password.into_inner()),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// Creates the user and their first session together; neither row is kept
/// unless both are written.
pub async fn register(
    db: &DatabaseConnection,
    new_user: NewUser,
    session_max_age_secs: i64,
) -> Result<(user::Model, session::Model), DbErr> {
    db.transaction::<_, (user::Model, session::Model), DbErr>(|txn| {
        Box::pin(async move {
            let user = insert(txn, new_user).await?;
            let session = session_repo::start(txn, &user, session_max_age_secs).await?;
            Ok((user, session))
        })
    })
    .await
    .map_err(flatten_tx)
}

/// Applies `changes` to user `id`. `Ok(None)` when the user does not exist.
pub async fn update<C: ConnectionTrait>(
    db: &C,
    id: i32,
    changes: UserChanges,
) -> Result<Option<user::Model>, DbErr> {
    let Some(existing) = find_by_id(db, id).await? else {
        return Ok(None);
    };
    if changes.is_empty() {
        return Ok(Some(existing));
    }

    let mut active = existing.into_active_model();
    if let Some(username) = changes.username {
        active.username = Set(username);
    }
    if let Some(email) = changes.email {
        active.email = Set(email);
    }
    if let Some(password) = changes.password {
        active.password = Set(password.into_inner());
    }
    active.update(db).await.map(Some)
}

/// Deletes the user and their sessions. Posts, votes and comments are left to
/// the foreign keys, so a user who still owns any of them cannot be deleted.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    db.transaction::<_, bool, DbErr>(|txn| {
        Box::pin(async move {
            session::Entity::delete_many()
                .filter(session::Column::UserId.eq(id))
                .exec(txn)
                .await?;
            let result = user::Entity::delete_by_id(id).exec(txn).await?;
            Ok(result.rows_affected > 0)
        })
    })
    .await
    .map_err(flatten_tx)
}
