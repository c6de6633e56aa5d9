//! crates/tutor_core/src/access.rs
//!
//! Authorization rules applied to the current user record on every protected
//! operation. The record is re-read per request, so a ban or role change takes
//! effect on the next call of an already signed-in user.

use crate::domain::{Role, UserRecord};
use crate::ports::{PortError, PortResult};

pub const BANNED_MESSAGE: &str = "This account has been disabled by an administrator.";

/// Rejects banned accounts.
pub fn ensure_active(user: &UserRecord) -> PortResult<()> {
    if user.is_banned {
        return Err(PortError::Forbidden(BANNED_MESSAGE.to_string()));
    }
    Ok(())
}

/// Rejects banned accounts and anyone without the admin role.
pub fn ensure_admin(user: &UserRecord) -> PortResult<()> {
    ensure_active(user)?;
    if user.role != Role::Admin {
        return Err(PortError::Forbidden("Admin access required.".to_string()));
    }
    Ok(())
}
