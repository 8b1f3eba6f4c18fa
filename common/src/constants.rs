use crate::utils::time::{DAY15, HOUR1, MINUTE15, MINUTE2, MINUTE5};

//验证码取值范围(四位数字)
pub const VERIFY_CODE_MIN: u32 = 1000;
pub const VERIFY_CODE_MAX: u32 = 9999;
//邮箱验证码有效时间
pub const EMAIL_CODE_EXPIRE_TIME: u64 = MINUTE5;
//短信验证码有效时间
pub const PHONE_CODE_EXPIRE_TIME: u64 = MINUTE2;
//同一验证码允许输错的次数
pub const MAX_CODE_FAILURES: u32 = 5;

//token 默认有效时间
pub const ACCESS_TOKEN_EXPIRE_TIME: u64 = HOUR1;
pub const REFRESH_TOKEN_EXPIRE_TIME: u64 = DAY15;
//找回密码token只能用于验证和重置密码
pub const RESET_TOKEN_EXPIRE_TIME: u64 = MINUTE15;

pub const USERNAME_MIN_LEN: usize = 4;
pub const USERNAME_MAX_LEN: usize = 32;
pub const NAME_MIN_LEN: usize = 1;
pub const NAME_MAX_LEN: usize = 50;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const AUTO_USERNAME_PREFIX: &str = "insta-";

//密码哈希默认迭代次数
pub const PASSWORD_HASH_ITERATIONS: u32 = 260_000;

pub const CAPTION_MAX_LEN: usize = 2000;
pub const COMMENT_MAX_LEN: usize = 2000;
pub const POST_MEDIA_EXTENSIONS: [&str; 9] =
    ["png", "jpg", "jpeg", "gif", "mp4", "avi", "mov", "mkv", "heic"];
pub const PHOTO_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "heic"];

//分页
pub const DEFAULT_PAGE_SIZE: u64 = 10;
pub const MAX_PAGE_SIZE: u64 = 100;

//通知队列
pub const NOTIFY_QUEUE_CAPACITY: usize = 256;
pub const NOTIFY_WORKER_NUM: usize = 4;
