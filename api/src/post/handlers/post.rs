use actix_web::HttpRequest;
use common::constants::{CAPTION_MAX_LEN, POST_MEDIA_EXTENSIONS};
use common::data_structures::has_allowed_extension;
use common::data_structures::post::{Post, PostComment, PostLike};
use common::error_code::{BackendError, BackendRes, PostError};
use models::comment::CommentFilter;
use models::like::{LikeFilter, PostLikeFilter};
use models::post::{PostFilter, PostUpdater};
use models::{Entity, PgLocalCli, PsqlOp};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{find_post, page_bounds, PageResponse};
use crate::post::{CreatePostRequest, PageQuery, UpdatePostRequest};
use crate::utils::token_auth::optional_credentials;
use crate::utils::{get_current_user, AppContext};

#[derive(Serialize, Deserialize, Debug)]
pub struct PostView {
    pub id: Uuid,
    pub author_id: Uuid,
    pub media: String,
    pub caption: String,
    pub likes_count: u64,
    pub comments_count: u64,
    //false for anonymous callers
    pub request_user_liked: bool,
    pub created_at: String,
    pub updated_at: String,
}

async fn post_view(
    post: Entity<Post>,
    viewer: Option<&Uuid>,
    cli: &mut PgLocalCli<'_>,
) -> Result<PostView, BackendError> {
    let post_id = post.inner.id;
    let likes_count = PostLike::count(PostLikeFilter(LikeFilter::ByTarget(&post_id)), cli).await?;
    let comments_count = PostComment::count(CommentFilter::ByPost(&post_id), cli).await?;
    let request_user_liked = match viewer {
        Some(user_id) => {
            PostLike::count(
                PostLikeFilter(LikeFilter::ByAuthorAndTarget(user_id, &post_id)),
                cli,
            )
            .await?
                > 0
        }
        None => false,
    };
    Ok(PostView {
        id: post_id,
        author_id: post.inner.author_id,
        media: post.inner.media,
        caption: post.inner.caption,
        likes_count,
        comments_count,
        request_user_liked,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

fn check_content(media: &str, caption: &str) -> Result<(), BackendError> {
    if !has_allowed_extension(media, &POST_MEDIA_EXTENSIONS) {
        Err(BackendError::RequestParamInvalid(format!(
            "media must be one of {}",
            POST_MEDIA_EXTENSIONS.join(", ")
        )))?;
    }
    if caption.chars().count() > CAPTION_MAX_LEN {
        Err(BackendError::RequestParamInvalid(format!(
            "caption is longer than {} characters",
            CAPTION_MAX_LEN
        )))?;
    }
    Ok(())
}

pub async fn list_req(
    req: HttpRequest,
    ctx: &AppContext,
    query: PageQuery,
) -> BackendRes<PageResponse<PostView>> {
    let viewer = optional_credentials(&req, ctx)?;
    let (page, page_size, offset) = page_bounds(&query)?;
    let mut db_cli = ctx.db_cli().await?;
    let count = Post::count(PostFilter::All, &mut db_cli).await?;
    let posts = Post::find_page(PostFilter::All, page_size, offset, &mut db_cli).await?;
    let mut results = Vec::with_capacity(posts.len());
    for post in posts {
        results.push(post_view(post, viewer.as_ref(), &mut db_cli).await?);
    }
    Ok(Some(PageResponse {
        count,
        page,
        page_size,
        results,
    }))
}

pub async fn create_req(
    req: HttpRequest,
    ctx: &AppContext,
    request_data: CreatePostRequest,
) -> BackendRes<PostView> {
    let CreatePostRequest { media, caption } = request_data;
    let media = media.trim().to_string();
    check_content(&media, &caption)?;
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;

    let post = Post {
        id: Uuid::new_v4(),
        author_id: user.id,
        media,
        caption,
    };
    let post_id = post.id;
    post.insert(&mut db_cli).await?;
    info!("user {} created post {}", user.id, post_id);
    let post = find_post(&post_id, &mut db_cli).await?;
    Ok(Some(post_view(post, Some(&user.id), &mut db_cli).await?))
}

pub async fn detail_req(req: HttpRequest, ctx: &AppContext, post_id: Uuid) -> BackendRes<PostView> {
    let viewer = optional_credentials(&req, ctx)?;
    let mut db_cli = ctx.db_cli().await?;
    let post = find_post(&post_id, &mut db_cli).await?;
    Ok(Some(post_view(post, viewer.as_ref(), &mut db_cli).await?))
}

/// Only the author may edit; omitted fields keep their value.
pub async fn update_req(
    req: HttpRequest,
    ctx: &AppContext,
    post_id: Uuid,
    request_data: UpdatePostRequest,
) -> BackendRes<PostView> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let post = find_post(&post_id, &mut db_cli).await?.into_inner();
    if post.author_id != user.id {
        Err(PostError::PermissionDenied("edit this post"))?;
    }
    let media = request_data
        .media
        .map(|media| media.trim().to_string())
        .unwrap_or(post.media);
    let caption = request_data.caption.unwrap_or(post.caption);
    check_content(&media, &caption)?;

    Post::update_single(
        PostUpdater::Content {
            media: &media,
            caption: &caption,
        },
        PostFilter::ById(&post_id),
        &mut db_cli,
    )
    .await?;
    let post = find_post(&post_id, &mut db_cli).await?;
    Ok(Some(post_view(post, Some(&user.id), &mut db_cli).await?))
}

/// Removes the post with all of its comments and likes.
pub async fn delete_req(req: HttpRequest, ctx: &AppContext, post_id: Uuid) -> BackendRes<String> {
    let mut db_cli = ctx.db_cli().await?;
    let user = get_current_user(&req, ctx, &mut db_cli).await?;
    let post = find_post(&post_id, &mut db_cli).await?.into_inner();
    if post.author_id != user.id {
        Err(PostError::PermissionDenied("delete this post"))?;
    }
    Post::delete(PostFilter::ById(&post_id), &mut db_cli).await?;
    info!("user {} deleted post {}", user.id, post_id);
    Ok(None)
}
