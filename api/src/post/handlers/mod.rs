pub mod comment;
pub mod like;
pub mod post;

use common::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use common::data_structures::post::{Post, PostComment};
use common::error_code::{BackendError, PostError};
use models::comment::CommentFilter;
use models::post::PostFilter;
use models::{DbError, Entity, PgLocalCli, PsqlOp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::post::PageQuery;

/// One page of a listing. `count` is the total over all pages.
#[derive(Serialize, Deserialize, Debug)]
pub struct PageResponse<T> {
    pub count: u64,
    pub page: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

/// `(page, page_size, offset)` of a listing query. Page numbers start at 1,
/// oversized pages are capped and the offset must fit a postgres bigint.
pub(crate) fn page_bounds(query: &PageQuery) -> Result<(u64, u64, u64), BackendError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE);
    if page == 0 || page_size == 0 {
        Err(BackendError::RequestParamInvalid(
            "page and page_size must be positive".to_string(),
        ))?;
    }
    let offset = (page - 1)
        .checked_mul(page_size)
        .filter(|offset| *offset <= i64::MAX as u64)
        .ok_or_else(|| {
            BackendError::RequestParamInvalid(format!("page {} is out of range", page))
        })?;
    Ok((page, page_size, offset))
}

pub(crate) fn not_found(what: &'static str) -> impl FnOnce(DbError) -> BackendError {
    move |err| match err {
        DbError::DataNotFound(_) => PostError::NotFound(what).into(),
        other => other.into(),
    }
}

pub(crate) async fn find_post(
    post_id: &Uuid,
    cli: &mut PgLocalCli<'_>,
) -> Result<Entity<Post>, BackendError> {
    Post::find_single(PostFilter::ById(post_id), cli)
        .await
        .map_err(not_found("post"))
}

pub(crate) async fn find_comment(
    comment_id: &Uuid,
    cli: &mut PgLocalCli<'_>,
) -> Result<Entity<PostComment>, BackendError> {
    PostComment::find_single(CommentFilter::ById(comment_id), cli)
        .await
        .map_err(not_found("comment"))
}
