use std::collections::HashMap;

use actix_web::HttpRequest;
use common::constants::COMMENT_MAX_LEN;
use common::data_structures::post::{CommentLike, PostComment};
use common::error_code::{BackendError, BackendRes, PostError};
use models::comment::CommentFilter;
use models::like::{CommentLikeFilter, LikeFilter};
use models::{Entity, PgLocalCli, PsqlOp};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{find_comment, find_post};
use crate::post::CreateCommentRequest;
use crate::utils::token_auth::optional_credentials;
use crate::utils::{get_current_user, AppContext};

#[derive(Serialize, Deserialize, Debug)]
pub struct CommentNode {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub comment: String,
    pub likes_count: u64,
    pub request_user_liked: bool,
    pub created_at: String,
    pub replies: Vec<CommentNode>,
}

/// Assemble reply trees below `roots` from a flat, oldest first list of one
/// post's comments. Replies keep the order of the list. Uses an explicit
/// stack so arbitrarily deep reply chains can't overflow.
pub fn build_comment_tree(
    comments: Vec<Entity<PostComment>>,
    roots: &[Uuid],
    likes: &HashMap<Uuid, (u64, bool)>,
) -> Vec<CommentNode> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for entity in &comments {
        if let Some(parent_id) = entity.inner.parent_id {
            children.entry(parent_id).or_default().push(entity.inner.id);
        }
    }
    let mut pending: HashMap<Uuid, Entity<PostComment>> = comments
        .into_iter()
        .map(|entity| (entity.inner.id, entity))
        .collect();

    //post-order walk: a node is built once all of its replies are
    let mut built: HashMap<Uuid, CommentNode> = HashMap::new();
    let mut stack: Vec<(Uuid, bool)> = roots.iter().rev().map(|id| (*id, false)).collect();
    while let Some((id, expanded)) = stack.pop() {
        if !expanded {
            stack.push((id, true));
            if let Some(replies) = children.get(&id) {
                stack.extend(replies.iter().rev().map(|reply| (*reply, false)));
            }
            continue;
        }
        let Some(entity) = pending.remove(&id) else {
            continue;
        };
        let replies: Vec<CommentNode> = children
            .get(&id)
            .map(|replies| replies.iter().filter_map(|reply| built.remove(reply)).collect())
            .unwrap_or_default();
        let (likes_count, request_user_liked) = likes.get(&id).copied().unwrap_or((0, false));
        built.insert(
            id,
            CommentNode {
                id,
                author_id: entity.inner.author_id,
                post_id: entity.inner.post_id,
                parent_id: entity.inner.parent_id,
                comment: entity.inner.comment,
                likes_count,
                request_user_liked,
                created_at: entity.created_at,
                replies,
            },
        );
    }
    roots.iter().filter_map(|id| built.remove(id)).collect()
}

/// Like totals per comment, and whether `viewer` is one of the likers.
async fn comment_likes(
    comments: &[Entity<PostComment>],
    viewer: Option<&Uuid>,
    cli: &mut PgLocalCli<'_>,
) -> Result<HashMap<Uuid, (u64, bool)>, BackendError> {
    let mut likes = HashMap::new();
    for entity in comments {
        let id = entity.inner.id;
        let count = CommentLike::count(CommentLikeFilter(LikeFilter::ByTarget(&id)), cli).await?;
        let liked = match viewer {
            Some(user_id) if count > 0 => {
                CommentLike::count(
                    CommentLikeFilter(LikeFilter::ByAuthorAndTarget(user_id, &id)),
                    cli,
                )
                .await?
                    > 0
            }
            _ => false,
        };
        likes.insert(id, (count, liked));
    }
    Ok(likes)
}

async fn post_comment_tree(
    post_id: &Uuid,
    roots: Option<&[Uuid]>,
    viewer: Option<&Uuid>,
    cli: &mut PgLocalCli<'_>,
) -> Result<Vec<CommentNode>, BackendError> {
    let comments: Vec<Entity<PostComment>> =
        PostComment::find(CommentFilter::ByPost(post_id), cli).await?;
    let likes = comment_likes(&comments, viewer, cli).await?;
    let roots = match roots {
        Some(roots) => roots.to_vec(),
        None => comments
            .iter()
            .filter(|entity| entity.inner.parent_id.is_none())
            .map(|entity| entity.inner.id)
            .collect(),
    };
    Ok(build_comment_tree(comments, &roots, &likes))
}

/// Top-level comments of a post with their nested replies.
pub async fn list_req(
    req: HttpRequest,
    ctx: &AppContext,
    post_id: Uuid,
) -> BackendRes<Vec<CommentNode>> {
    let viewer = optional_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    find_post(&post_id, &mut db_cli).await?;
    let tree = post_comment_tree(&post_id, None, viewer.as_ref(), &mut db_cli).await?;
    Ok(Some(tree))
}

pub async fn detail_req(
    req: HttpRequest,
    ctx: &AppContext,
    comment_id: Uuid,
) -> BackendRes<CommentNode> {
    let viewer = optional_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    let comment = find_comment(&comment_id, &mut db_cli).await?.into_inner();
    let tree = post_comment_tree(
        &comment.post_id,
        Some(&[comment_id][..]),
        viewer.as_ref(),
        &mut db_cli,
    )
    .await?;
    Ok(tree.into_iter().next())
}

pub async fn create_req(
    req: HttpRequest,
    ctx: &AppContext,
    post_id: Uuid,
    request_data: CreateCommentRequest,
) -> BackendRes<CommentNode> {
    let CreateCommentRequest { comment, parent } = request_data;
    if comment.trim().is_empty() || comment.chars().count() > COMMENT_MAX_LEN {
        Err(BackendError::RequestParamInvalid(format!(
            "comment must be between 1 and {} characters",
            COMMENT_MAX_LEN
        )))?;
    }
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    find_post(&post_id, &mut db_cli).await?;
    if let Some(parent_id) = parent {
        let parent = find_comment(&parent_id, &mut db_cli).await?.into_inner();
        if parent.post_id != post_id {
            Err(BackendError::RequestParamInvalid(
                "parent comment belongs to another post".to_string(),
            ))?;
        }
    }

    let id = Uuid::new_v4();
    PostComment {
        id,
        author_id: user.id,
        post_id,
        comment,
        parent_id: parent,
    }
    .insert(&mut db_cli)
    .await?;
    info!("user {} commented {} on post {}", user.id, id, post_id);
    let entity = find_comment(&id, &mut db_cli).await?;
    Ok(build_comment_tree(vec![entity], &[id], &HashMap::new())
        .into_iter()
        .next())
}

/// Removes the comment together with its replies and their likes.
pub async fn delete_req(
    req: HttpRequest,
    ctx: &AppContext,
    comment_id: Uuid,
) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let comment = find_comment(&comment_id, &mut db_cli).await?.into_inner();
    if comment.author_id != user.id {
        Err(PostError::PermissionDenied("delete this comment"))?;
    }
    PostComment::delete(CommentFilter::ById(&comment_id), &mut db_cli).await?;
    info!("user {} deleted comment {}", user.id, comment_id);
    Ok(None)
}
