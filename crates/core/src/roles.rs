//! Well-known role name constants.
//!
//! Roles are derived from the `users.is_admin` flag; they are not stored.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// Role name carried in access tokens for a user with the given admin flag.
pub fn role_for(is_admin: bool) -> &'static str {
    if is_admin {
        ROLE_ADMIN
    } else {
        ROLE_USER
    }
}
