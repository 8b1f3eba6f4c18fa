pub mod account_manager;
pub mod post;
pub mod token;
pub mod verification;

/// True when `name` ends with one of `extensions`, compared case-insensitively.
pub fn has_allowed_extension(name: &str, extensions: &[&str]) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => extensions
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}
