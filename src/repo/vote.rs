use sea_orm::{ActiveModelTrait, ConnectionTrait, DatabaseConnection, DbErr, Set, TransactionTrait};

use super::flatten_tx;
use super::post::{self as post_repo, PostRow};
use crate::entity::vote;

pub async fn insert<C: ConnectionTrait>(db: &C, user_id: i32, post_id: i32) -> Result<vote::Model, DbErr> {
    vote::ActiveModel {
        user_id: Set(user_id),
        post_id: Set(post_id),
        ..Default::default()
    }
    .insert(db)
    .await
}

#[cfg(test)]
pub async fn count_for_post<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<u64, DbErr> {
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    vote::Entity::find()
        .filter(vote::Column::PostId.eq(post_id))
        .count(db)
        .await
}

/// Records one vote and re-reads the post with its refreshed count.
///
/// A missing user or post trips a foreign key and a repeat vote trips the
/// `(user_id, post_id)` unique index; both come back as the store's error.
pub async fn upvote(db: &DatabaseConnection, user_id: i32, post_id: i32) -> Result<Option<PostRow>, DbErr> {
    db.transaction::<_, Option<PostRow>, DbErr>(|txn| {
        Box::pin(async move {
            let inserted = insert(txn, user_id, post_id).await?;
            log::debug!("vote saved id={} user={} post={}", inserted.id, user_id, post_id);
            post_repo::find_with_votes(txn, post_id).await
        })
    })
    .await
    .map_err(flatten_tx)
}
