//! Response bodies shared by the post, comment and user routes.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::entity::{comment, post, user};
use crate::repo::comment::CommentRow;
use crate::repo::post::PostRow;

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
}

impl From<user::Model> for UserDto {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthorDto {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CommentDto {
    pub id: i32,
    pub comment_text: String,
    pub post_id: i32,
    pub user_id: i32,
    pub created_at: Option<String>,
    pub user: AuthorDto,
}

impl From<CommentRow> for CommentDto {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            comment_text: row.comment_text,
            post_id: row.post_id,
            user_id: row.user_id,
            created_at: row.created_at.map(to_rfc3339),
            user: AuthorDto { username: row.username },
        }
    }
}

impl CommentDto {
    pub fn from_model(model: comment::Model, username: Option<String>) -> Self {
        Self {
            id: model.id,
            comment_text: model.comment_text,
            post_id: model.post_id,
            user_id: model.user_id,
            created_at: model.created_at.map(to_rfc3339),
            user: AuthorDto { username },
        }
    }
}

/// Post attributes plus the live vote count, as returned by an upvote.
#[derive(Debug, Serialize)]
pub struct PostVotesDto {
    pub id: i32,
    pub post_url: String,
    pub title: String,
    pub created_at: Option<String>,
    pub vote_count: i64,
}

impl From<PostRow> for PostVotesDto {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            post_url: row.post_url,
            title: row.title,
            created_at: row.created_at.map(to_rfc3339),
            vote_count: row.vote_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostDto {
    pub id: i32,
    pub post_url: String,
    pub title: String,
    pub user_id: i32,
    pub created_at: Option<String>,
    pub vote_count: i64,
    pub comments: Vec<CommentDto>,
    pub user: AuthorDto,
}

impl PostDto {
    pub fn new(row: PostRow, comments: Vec<CommentDto>) -> Self {
        Self {
            id: row.id,
            post_url: row.post_url,
            title: row.title,
            user_id: row.user_id,
            created_at: row.created_at.map(to_rfc3339),
            vote_count: row.vote_count,
            comments,
            user: AuthorDto { username: row.username },
        }
    }
}

/// A post as stored, without aggregates.
#[derive(Debug, Serialize)]
pub struct PlainPostDto {
    pub id: i32,
    pub title: String,
    pub post_url: String,
    pub user_id: i32,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<post::Model> for PlainPostDto {
    fn from(model: post::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            post_url: model.post_url,
            user_id: model.user_id,
            created_at: model.created_at.map(to_rfc3339),
            updated_at: model.updated_at.map(to_rfc3339),
        }
    }
}

/// Attaches each comment to its post, keeping both orders.
pub fn group_comments(rows: Vec<PostRow>, comments: Vec<CommentRow>) -> Vec<PostDto> {
    let mut by_post: HashMap<i32, Vec<CommentDto>> = HashMap::new();
    for comment in comments {
        by_post.entry(comment.post_id).or_default().push(comment.into());
    }
    rows.into_iter()
        .map(|row| {
            let own = by_post.remove(&row.id).unwrap_or_default();
            PostDto::new(row, own)
        })
        .collect()
}

pub fn to_rfc3339(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, false)
}
