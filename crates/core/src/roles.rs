//! Well-known user type constants.
//!
//! These must match the `CHECK` constraint on `users.user_type` in
//! `20240101000001_create_users_and_sites.sql`.

pub const USER_TYPE_ADMIN: &str = "admin";
pub const USER_TYPE_SUPERVISOR: &str = "supervisor";
pub const USER_TYPE_WORKER: &str = "worker";

/// All valid user types.
pub const VALID_USER_TYPES: &[&str] = &[USER_TYPE_ADMIN, USER_TYPE_SUPERVISOR, USER_TYPE_WORKER];

/// Whether the user type may assign, authorize or cancel work.
pub fn can_supervise(user_type: &str) -> bool {
    user_type == USER_TYPE_SUPERVISOR || user_type == USER_TYPE_ADMIN
}

/// Whether a user type string is one of the known values.
pub fn is_valid_user_type(user_type: &str) -> bool {
    VALID_USER_TYPES.contains(&user_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supervisors_and_admins_supervise() {
        assert!(can_supervise(USER_TYPE_SUPERVISOR));
        assert!(can_supervise(USER_TYPE_ADMIN));
        assert!(!can_supervise(USER_TYPE_WORKER));
        assert!(!can_supervise(""));
    }

    #[test]
    fn user_type_validation() {
        assert!(is_valid_user_type("worker"));
        assert!(!is_valid_user_type("Worker"));
        assert!(!is_valid_user_type("contractor"));
    }
}
