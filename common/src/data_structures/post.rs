use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub media: String,
    pub caption: String,
}

/// A comment on a post. `parent_id` points at the comment being replied to.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PostComment {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
    pub comment: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct PostLike {
    pub id: Uuid,
    pub author_id: Uuid,
    pub post_id: Uuid,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct CommentLike {
    pub id: Uuid,
    pub author_id: Uuid,
    pub comment_id: Uuid,
}
