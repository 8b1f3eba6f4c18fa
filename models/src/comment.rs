use std::fmt;
use std::sync::Mutex;

use common::data_structures::post::PostComment;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_uuid, DbRes, Entity, FormatSql, Immutable, MemFilter, PsqlOp};

pub type CommentEntity = Entity<PostComment>;

#[derive(Clone, Debug)]
pub enum CommentFilter<'a> {
    ById(&'a Uuid),
    /// every comment of the post, replies included, oldest first
    ByPost(&'a Uuid),
}

impl fmt::Display for CommentFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            CommentFilter::ById(id) => format!("id={}", id.string4sql()),
            CommentFilter::ByPost(post_id) => format!("post_id={}", post_id.string4sql()),
        };
        write!(f, "{}", description)
    }
}

impl MemFilter<PostComment> for CommentFilter<'_> {
    fn matches(&self, row: &PostComment) -> bool {
        match self {
            CommentFilter::ById(id) => row.id == **id,
            CommentFilter::ByPost(post_id) => row.post_id == **post_id,
        }
    }
}

impl PsqlOp for PostComment {
    //comments are immutable once written
    type UpdaterContent<'a> = Immutable;
    type FilterContent<'b> = CommentFilter<'b>;

    const TABLE: &'static str = "comments";
    const COLUMNS: &'static str = "id,author_id,post_id,comment,parent_id";

    fn from_row(row: &Row) -> DbRes<Self> {
        let parent_id: Option<&str> = row.try_get(4)?;
        Ok(PostComment {
            id: parse_uuid(row.try_get(0)?)?,
            author_id: parse_uuid(row.try_get(1)?)?,
            post_id: parse_uuid(row.try_get(2)?)?,
            comment: row.try_get(3)?,
            parent_id: parent_id.map(parse_uuid).transpose()?,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{},{},{})",
            Self::COLUMNS,
            self.id.string4sql(),
            self.author_id.string4sql(),
            self.post_id.string4sql(),
            self.comment.string4sql(),
            self.parent_id.string4sql()
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().comments
    }

    fn cascade_delete(db: &MemoryDb, removed: &[Self]) -> DbRes<()> {
        db.remove_comment_rows(&removed.iter().map(|c| c.id).collect::<Vec<_>>())
    }
}
