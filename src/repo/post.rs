use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, IntoActiveModel, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, Set, TransactionTrait,
};

use super::flatten_tx;
use crate::entity::{comment, post, user, vote};

/// Correlated aggregate evaluated once per selected post row.
const VOTE_COUNT_SQL: &str = "(SELECT COUNT(*) FROM vote WHERE vote.post_id = post.id)";

/// A post as listed: its own columns, the author's username and the live vote count.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct PostRow {
    pub id: i32,
    pub title: String,
    pub post_url: String,
    pub user_id: i32,
    pub created_at: Option<chrono::DateTime<Utc>>,
    pub username: Option<String>,
    pub vote_count: i64,
}

#[derive(Debug)]
pub struct NewPost {
    pub title: String,
    pub post_url: String,
    pub user_id: i32,
}

fn select_with_votes() -> Select<post::Entity> {
    post::Entity::find()
        .column_as(user::Column::Username, "username")
        .column_as(Expr::cust(VOTE_COUNT_SQL), "vote_count")
        .join(JoinType::LeftJoin, post::Relation::User.def())
}

/// Every post, newest first, with vote counts in the same query.
pub async fn list_with_votes<C: ConnectionTrait>(db: &C) -> Result<Vec<PostRow>, DbErr> {
    select_with_votes()
        .order_by_desc(post::Column::CreatedAt)
        .order_by_desc(post::Column::Id)
        .into_model::<PostRow>()
        .all(db)
        .await
}

pub async fn find_with_votes<C: ConnectionTrait>(db: &C, id: i32) -> Result<Option<PostRow>, DbErr> {
    select_with_votes()
        .filter(post::Column::Id.eq(id))
        .into_model::<PostRow>()
        .one(db)
        .await
}

pub async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<post::Model>, DbErr> {
    post::Entity::find()
        .filter(post::Column::UserId.eq(user_id))
        .order_by_desc(post::Column::CreatedAt)
        .all(db)
        .await
}

/// Posts the user has upvoted, through the vote table.
pub async fn find_voted_by<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<post::Model>, DbErr> {
    post::Entity::find()
        .join(JoinType::InnerJoin, post::Relation::Vote.def())
        .filter(vote::Column::UserId.eq(user_id))
        .order_by_asc(vote::Column::Id)
        .all(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(db: &C, new_post: NewPost) -> Result<post::Model, DbErr> {
    let now = Utc::now();
    post::ActiveModel {
        title: Set(new_post.title),
        post_url: Set(new_post.post_url),
        user_id: Set(new_post.user_id),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await
}

/// `Ok(None)` when the post does not exist.
pub async fn update_title<C: ConnectionTrait>(
    db: &C,
    id: i32,
    title: String,
) -> Result<Option<post::Model>, DbErr> {
    let Some(existing) = post::Entity::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let mut active = existing.into_active_model();
    active.title = Set(title);
    active.updated_at = Set(Some(Utc::now()));
    active.update(db).await.map(Some)
}

/// Removes the post together with its votes and comments.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<bool, DbErr> {
    db.transaction::<_, bool, DbErr>(|txn| {
        Box::pin(async move {
            vote::Entity::delete_many()
                .filter(vote::Column::PostId.eq(id))
                .exec(txn)
                .await?;
            comment::Entity::delete_many()
                .filter(comment::Column::PostId.eq(id))
                .exec(txn)
                .await?;
            let result = post::Entity::delete_by_id(id).exec(txn).await?;
            Ok(result.rows_affected > 0)
        })
    })
    .await
    .map_err(flatten_tx)
}
