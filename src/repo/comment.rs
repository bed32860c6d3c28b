use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, FromQueryResult, JoinType,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Select, Set,
};

use crate::entity::{comment, post, user};

/// A comment with its author's username.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct CommentRow {
    pub id: i32,
    pub comment_text: String,
    pub user_id: i32,
    pub post_id: i32,
    pub created_at: Option<chrono::DateTime<Utc>>,
    pub username: Option<String>,
}

/// A comment with the title of the post it was left on.
#[derive(Clone, Debug, PartialEq, FromQueryResult)]
pub struct UserCommentRow {
    pub id: i32,
    pub comment_text: String,
    pub user_id: i32,
    pub post_id: i32,
    pub created_at: Option<chrono::DateTime<Utc>>,
    pub post_title: Option<String>,
}

#[derive(Debug)]
pub struct NewComment {
    pub comment_text: String,
    pub user_id: i32,
    pub post_id: i32,
}

fn select_with_author() -> Select<comment::Entity> {
    comment::Entity::find()
        .column_as(user::Column::Username, "username")
        .join(JoinType::LeftJoin, comment::Relation::User.def())
}

/// Every comment, oldest first. Listing all posts groups these in memory
/// instead of binding one parameter per post id.
pub async fn list_all<C: ConnectionTrait>(db: &C) -> Result<Vec<CommentRow>, DbErr> {
    select_with_author()
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .into_model::<CommentRow>()
        .all(db)
        .await
}

pub async fn list_for_post<C: ConnectionTrait>(db: &C, post_id: i32) -> Result<Vec<CommentRow>, DbErr> {
    select_with_author()
        .filter(comment::Column::PostId.eq(post_id))
        .order_by_asc(comment::Column::CreatedAt)
        .order_by_asc(comment::Column::Id)
        .into_model::<CommentRow>()
        .all(db)
        .await
}

pub async fn list_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Vec<UserCommentRow>, DbErr> {
    comment::Entity::find()
        .column_as(post::Column::Title, "post_title")
        .join(JoinType::LeftJoin, comment::Relation::Post.def())
        .filter(comment::Column::UserId.eq(user_id))
        .order_by_asc(comment::Column::Id)
        .into_model::<UserCommentRow>()
        .all(db)
        .await
}

pub async fn insert<C: ConnectionTrait>(db: &C, new_comment: NewComment) -> Result<comment::Model, DbErr> {
    let now = Utc::now();
    comment::ActiveModel {
        comment_text: Set(new_comment.comment_text),
        user_id: Set(new_comment.user_id),
        post_id: Set(new_comment.post_id),
        created_at: Set(Some(now)),
        updated_at: Set(Some(now)),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn delete<C: ConnectionTrait>(db: &C, id: i32) -> Result<bool, DbErr> {
    let result = comment::Entity::delete_by_id(id).exec(db).await?;
    Ok(result.rows_affected > 0)
}
