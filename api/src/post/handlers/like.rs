//! 点赞, posts and comments share the same rules
use actix_web::HttpRequest;
use common::data_structures::post::{CommentLike, PostLike};
use common::error_code::{BackendRes, PostError};
use models::like::{CommentLikeFilter, LikeFilter, PostLikeFilter};
use models::{Entity, PsqlOp};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{find_comment, find_post, not_found, page_bounds, PageResponse};
use crate::post::PageQuery;
use crate::utils::{get_current_user, AppContext};

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeView {
    pub id: Uuid,
    pub author_id: Uuid,
    /// the liked post or comment
    pub target_id: Uuid,
    pub created_at: String,
}

impl From<Entity<PostLike>> for LikeView {
    fn from(like: Entity<PostLike>) -> Self {
        LikeView {
            id: like.inner.id,
            author_id: like.inner.author_id,
            target_id: like.inner.post_id,
            created_at: like.created_at,
        }
    }
}

impl From<Entity<CommentLike>> for LikeView {
    fn from(like: Entity<CommentLike>) -> Self {
        LikeView {
            id: like.inner.id,
            author_id: like.inner.author_id,
            target_id: like.inner.comment_id,
            created_at: like.created_at,
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct LikeResponse {
    //false when the caller had already liked the target
    pub created: bool,
    pub like: LikeView,
}

pub async fn post_likes_req(
    ctx: &AppContext,
    post_id: Uuid,
    query: PageQuery,
) -> BackendRes<PageResponse<LikeView>> {
    let (page, page_size, offset) = page_bounds(&query)?;
    let mut db_cli = ctx.db_cli().await?;
    find_post(&post_id, &mut db_cli).await?;
    let filter = || PostLikeFilter(LikeFilter::ByTarget(&post_id));
    let count = PostLike::count(filter(), &mut db_cli).await?;
    let likes = PostLike::find_page(filter(), page_size, offset, &mut db_cli).await?;
    Ok(Some(PageResponse {
        count,
        page,
        page_size,
        results: likes.into_iter().map(LikeView::from).collect(),
    }))
}

/// Liking twice is a no-op that returns the existing like.
pub async fn like_post_req(
    req: HttpRequest,
    ctx: &AppContext,
    post_id: Uuid,
) -> BackendRes<LikeResponse> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    find_post(&post_id, &mut db_cli).await?;
    let filter = || PostLikeFilter(LikeFilter::ByAuthorAndTarget(&user.id, &post_id));
    let like = PostLike {
        id: Uuid::new_v4(),
        author_id: user.id,
        post_id,
    };
    let created = like.safe_insert(filter(), &mut db_cli).await?;
    debug!("user {} liked post {}: created {}", user.id, post_id, created);
    let like = PostLike::find_single(filter(), &mut db_cli).await?;
    Ok(Some(LikeResponse {
        created,
        like: like.into(),
    }))
}

pub async fn unlike_post_req(
    req: HttpRequest,
    ctx: &AppContext,
    like_id: Uuid,
) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let filter = || PostLikeFilter(LikeFilter::ById(&like_id));
    let like = PostLike::find_single(filter(), &mut db_cli)
        .await
        .map_err(not_found("like"))?
        .into_inner();
    if like.author_id != user.id {
        Err(PostError::PermissionDenied("remove this like"))?;
    }
    PostLike::delete(filter(), &mut db_cli).await?;
    Ok(None)
}

pub async fn comment_likes_req(
    ctx: &AppContext,
    comment_id: Uuid,
    query: PageQuery,
) -> BackendRes<PageResponse<LikeView>> {
    let (page, page_size, offset) = page_bounds(&query)?;
    let mut db_cli = ctx.db_cli().await?;
    find_comment(&comment_id, &mut db_cli).await?;
    let filter = || CommentLikeFilter(LikeFilter::ByTarget(&comment_id));
    let count = CommentLike::count(filter(), &mut db_cli).await?;
    let likes = CommentLike::find_page(filter(), page_size, offset, &mut db_cli).await?;
    Ok(Some(PageResponse {
        count,
        page,
        page_size,
        results: likes.into_iter().map(LikeView::from).collect(),
    }))
}

pub async fn like_comment_req(
    req: HttpRequest,
    ctx: &AppContext,
    comment_id: Uuid,
) -> BackendRes<LikeResponse> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    find_comment(&comment_id, &mut db_cli).await?;
    let filter = || CommentLikeFilter(LikeFilter::ByAuthorAndTarget(&user.id, &comment_id));
    let like = CommentLike {
        id: Uuid::new_v4(),
        author_id: user.id,
        comment_id,
    };
    let created = like.safe_insert(filter(), &mut db_cli).await?;
    debug!("user {} liked comment {}: created {}", user.id, comment_id, created);
    let like = CommentLike::find_single(filter(), &mut db_cli).await?;
    Ok(Some(LikeResponse {
        created,
        like: like.into(),
    }))
}

pub async fn unlike_comment_req(
    req: HttpRequest,
    ctx: &AppContext,
    like_id: Uuid,
) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let filter = || CommentLikeFilter(LikeFilter::ById(&like_id));
    let like = CommentLike::find_single(filter(), &mut db_cli)
        .await
        .map_err(not_found("like"))?
        .into_inner();
    if like.author_id != user.id {
        Err(PostError::PermissionDenied("remove this like"))?;
    }
    CommentLike::delete(filter(), &mut db_cli).await?;
    Ok(None)
}
