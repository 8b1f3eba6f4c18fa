//! In-process tables backing `PgLocalCli::Memory`, used in local and test mode.

use std::sync::{Arc, Mutex};

use common::data_structures::account_manager::UserInfo;
use common::data_structures::post::{CommentLike, Post, PostComment, PostLike};
use common::data_structures::token::BlacklistedToken;
use common::data_structures::verification::VerificationAttempt;
use uuid::Uuid;

use crate::{lock_err, DbRes, Entity};

#[derive(Default, Debug)]
pub struct Tables {
    pub(crate) users: Mutex<Vec<Entity<UserInfo>>>,
    pub(crate) verification_attempts: Mutex<Vec<Entity<VerificationAttempt>>>,
    pub(crate) posts: Mutex<Vec<Entity<Post>>>,
    pub(crate) comments: Mutex<Vec<Entity<PostComment>>>,
    pub(crate) post_likes: Mutex<Vec<Entity<PostLike>>>,
    pub(crate) comment_likes: Mutex<Vec<Entity<CommentLike>>>,
    pub(crate) token_blacklist: Mutex<Vec<Entity<BlacklistedToken>>>,
}

/// Cloning shares the same tables.
#[derive(Default, Debug, Clone)]
pub struct MemoryDb(Arc<Tables>);

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn tables(&self) -> &Tables {
        &self.0
    }

    /// rows referencing the removed accounts
    pub(crate) fn remove_user_rows(&self, user_ids: &[Uuid]) -> DbRes<()> {
        if user_ids.is_empty() {
            return Ok(());
        }
        let tables = self.tables();
        remove_where(&tables.verification_attempts, |a| user_ids.contains(&a.user_id))?;
        remove_where(&tables.token_blacklist, |t| user_ids.contains(&t.user_id))?;
        remove_where(&tables.post_likes, |l| user_ids.contains(&l.author_id))?;
        remove_where(&tables.comment_likes, |l| user_ids.contains(&l.author_id))?;
        let comments = remove_where(&tables.comments, |c| user_ids.contains(&c.author_id))?;
        self.remove_comment_rows(&comments.iter().map(|c| c.id).collect::<Vec<_>>())?;
        let posts = remove_where(&tables.posts, |p| user_ids.contains(&p.author_id))?;
        self.remove_post_rows(&posts.iter().map(|p| p.id).collect::<Vec<_>>())
    }

    /// likes and comments of the removed posts
    pub(crate) fn remove_post_rows(&self, post_ids: &[Uuid]) -> DbRes<()> {
        if post_ids.is_empty() {
            return Ok(());
        }
        let tables = self.tables();
        remove_where(&tables.post_likes, |l| post_ids.contains(&l.post_id))?;
        let comments = remove_where(&tables.comments, |c| post_ids.contains(&c.post_id))?;
        self.remove_comment_rows(&comments.iter().map(|c| c.id).collect::<Vec<_>>())
    }

    /// likes of the removed comments and every reply below them
    pub(crate) fn remove_comment_rows(&self, comment_ids: &[Uuid]) -> DbRes<()> {
        let tables = self.tables();
        let mut pending = comment_ids.to_vec();
        while let Some(id) = pending.pop() {
            remove_where(&tables.comment_likes, |l| l.comment_id == id)?;
            let replies = remove_where(&tables.comments, |c| c.parent_id == Some(id))?;
            pending.extend(replies.iter().map(|c| c.id));
        }
        Ok(())
    }
}

fn remove_where<T, P>(table: &Mutex<Vec<Entity<T>>>, predicate: P) -> DbRes<Vec<T>>
where
    P: Fn(&T) -> bool,
{
    let mut rows = table.lock().map_err(lock_err)?;
    let (removed, kept): (Vec<_>, Vec<_>) = rows.drain(..).partition(|row| predicate(&row.inner));
    *rows = kept;
    Ok(removed.into_iter().map(Entity::into_inner).collect())
}
