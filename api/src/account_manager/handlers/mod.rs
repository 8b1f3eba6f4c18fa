pub mod change_user_info;
pub mod change_user_photo;
pub mod delete_user;
pub mod forgot_password;
pub mod login;
pub mod logout;
pub mod new_verify;
pub mod refresh;
pub mod reset_password;
pub mod signup;
pub mod user_info;
pub mod validation;
pub mod verify;

use common::constants::AUTO_USERNAME_PREFIX;
use common::data_structures::account_manager::UserInfo;
use common::error_code::BackendError;
use models::account_manager::UserFilter;
use models::{PgLocalCli, PsqlOp};
use uuid::Uuid;

use crate::utils::AppContext;

/// Last group of a v4 uuid (twelve hex digits).
pub(crate) fn last_uuid_group(id: &Uuid) -> String {
    let id = id.to_string();
    id.rsplit('-').next().unwrap_or_default().to_owned()
}

/// `insta-<uuid group>`, extended with random digits until nobody owns it.
pub(crate) async fn gen_unique_username(
    ctx: &AppContext,
    cli: &mut PgLocalCli<'_>,
) -> Result<String, BackendError> {
    let mut username = format!("{}{}", AUTO_USERNAME_PREFIX, last_uuid_group(&Uuid::new_v4()));
    while UserInfo::count(UserFilter::ByUsername(&username), cli).await? > 0 {
        username.push(ctx.gen_digit()?);
    }
    Ok(username)
}
