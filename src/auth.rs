//! Session tokens, password hashing, role gating and OTP delivery.

pub mod middleware;
pub mod notifier;
pub mod password;
pub mod session;

use model::entities::user::UserRole;

/// The authenticated caller, placed into request extensions by the role
/// middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: i32,
    pub role: UserRole,
}
