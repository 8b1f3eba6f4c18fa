use std::fmt;
use std::sync::Mutex;

use common::data_structures::post::{CommentLike, PostLike};
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_uuid, DbRes, Entity, FormatSql, Immutable, MemFilter, PsqlOp};

pub type PostLikeEntity = Entity<PostLike>;
pub type CommentLikeEntity = Entity<CommentLike>;

#[derive(Clone, Debug)]
pub enum LikeFilter<'a> {
    ById(&'a Uuid),
    /// likes on the post or comment with this id
    ByTarget(&'a Uuid),
    ByAuthorAndTarget(&'a Uuid, &'a Uuid),
}

impl LikeFilter<'_> {
    fn render(&self, target_column: &str) -> String {
        match self {
            LikeFilter::ById(id) => format!("id={}", id.string4sql()),
            LikeFilter::ByTarget(target) => format!("{}={}", target_column, target.string4sql()),
            LikeFilter::ByAuthorAndTarget(author, target) => format!(
                "author_id={} and {}={}",
                author.string4sql(),
                target_column,
                target.string4sql()
            ),
        }
    }

    fn matches_row(&self, id: &Uuid, author_id: &Uuid, target: &Uuid) -> bool {
        match self {
            LikeFilter::ById(want) => id == *want,
            LikeFilter::ByTarget(want) => target == *want,
            LikeFilter::ByAuthorAndTarget(author, want) => author_id == *author && target == *want,
        }
    }
}

/// [`LikeFilter`] over `post_likes`
#[derive(Clone, Debug)]
pub struct PostLikeFilter<'a>(pub LikeFilter<'a>);

/// [`LikeFilter`] over `comment_likes`
#[derive(Clone, Debug)]
pub struct CommentLikeFilter<'a>(pub LikeFilter<'a>);

impl fmt::Display for PostLikeFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.render("post_id"))
    }
}

impl fmt::Display for CommentLikeFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.render("comment_id"))
    }
}

impl MemFilter<PostLike> for PostLikeFilter<'_> {
    fn matches(&self, row: &PostLike) -> bool {
        self.0.matches_row(&row.id, &row.author_id, &row.post_id)
    }
}

impl MemFilter<CommentLike> for CommentLikeFilter<'_> {
    fn matches(&self, row: &CommentLike) -> bool {
        self.0.matches_row(&row.id, &row.author_id, &row.comment_id)
    }
}

impl PsqlOp for PostLike {
    type UpdaterContent<'a> = Immutable;
    type FilterContent<'b> = PostLikeFilter<'b>;

    const TABLE: &'static str = "post_likes";
    const COLUMNS: &'static str = "id,author_id,post_id";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(PostLike {
            id: parse_uuid(row.try_get(0)?)?,
            author_id: parse_uuid(row.try_get(1)?)?,
            post_id: parse_uuid(row.try_get(2)?)?,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{})",
            Self::COLUMNS,
            self.id.string4sql(),
            self.author_id.string4sql(),
            self.post_id.string4sql()
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().post_likes
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.author_id == other.author_id && self.post_id == other.post_id
    }
}

impl PsqlOp for CommentLike {
    type UpdaterContent<'a> = Immutable;
    type FilterContent<'b> = CommentLikeFilter<'b>;

    const TABLE: &'static str = "comment_likes";
    const COLUMNS: &'static str = "id,author_id,comment_id";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(CommentLike {
            id: parse_uuid(row.try_get(0)?)?,
            author_id: parse_uuid(row.try_get(1)?)?,
            comment_id: parse_uuid(row.try_get(2)?)?,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{})",
            Self::COLUMNS,
            self.id.string4sql(),
            self.author_id.string4sql(),
            self.comment_id.string4sql()
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().comment_likes
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.author_id == other.author_id && self.comment_id == other.comment_id
    }
}
