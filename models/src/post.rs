use std::fmt;
use std::sync::Mutex;

use common::data_structures::post::Post;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::memory::MemoryDb;
use crate::{parse_uuid, DbRes, Entity, FormatSql, MemFilter, MemUpdater, PsqlOp};

pub type PostEntity = Entity<Post>;

#[derive(Clone, Debug)]
pub enum PostFilter<'a> {
    /// newest first
    All,
    ById(&'a Uuid),
}

impl fmt::Display for PostFilter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            PostFilter::All => "true".to_string(),
            PostFilter::ById(id) => format!("id={}", id.string4sql()),
        };
        write!(f, "{}", description)
    }
}

impl MemFilter<Post> for PostFilter<'_> {
    fn matches(&self, row: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::ById(id) => row.id == **id,
        }
    }

    fn newest_first(&self) -> bool {
        true
    }
}

#[derive(Clone, Debug)]
pub enum PostUpdater<'a> {
    Content { media: &'a str, caption: &'a str },
}

impl fmt::Display for PostUpdater<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let description = match self {
            PostUpdater::Content { media, caption } => format!(
                "media={},caption={}",
                media.string4sql(),
                caption.string4sql()
            ),
        };
        write!(f, "{}", description)
    }
}

impl MemUpdater<Post> for PostUpdater<'_> {
    fn apply(&self, row: &mut Post) {
        match self {
            PostUpdater::Content { media, caption } => {
                row.media = media.to_string();
                row.caption = caption.to_string();
            }
        }
    }
}

impl PsqlOp for Post {
    type UpdaterContent<'a> = PostUpdater<'a>;
    type FilterContent<'b> = PostFilter<'b>;

    const TABLE: &'static str = "posts";
    const COLUMNS: &'static str = "id,author_id,media,caption";

    fn from_row(row: &Row) -> DbRes<Self> {
        Ok(Post {
            id: parse_uuid(row.try_get(0)?)?,
            author_id: parse_uuid(row.try_get(1)?)?,
            media: row.try_get(2)?,
            caption: row.try_get(3)?,
        })
    }

    fn insert_sql(&self) -> String {
        format!(
            "({}) values ({},{},{},{})",
            Self::COLUMNS,
            self.id.string4sql(),
            self.author_id.string4sql(),
            self.media.string4sql(),
            self.caption.string4sql()
        )
    }

    fn row_id(&self) -> Uuid {
        self.id
    }

    fn memory_table(db: &MemoryDb) -> &Mutex<Vec<Entity<Self>>> {
        &db.tables().posts
    }

    fn cascade_delete(db: &MemoryDb, removed: &[Self]) -> DbRes<()> {
        db.remove_post_rows(&removed.iter().map(|p| p.id).collect::<Vec<_>>())
    }
}
