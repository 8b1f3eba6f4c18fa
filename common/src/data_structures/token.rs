use serde_derive::{Deserialize, Serialize};
use uuid::Uuid;

/// Refresh token revoked by logout, keyed by its `jti`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct BlacklistedToken {
    pub jti: Uuid,
    pub user_id: Uuid,
    //unix seconds
    pub expires_at: u64,
}
