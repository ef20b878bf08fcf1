//! Login checks for console users.
//!
//! Authentication is a plain function over the generic user store rather
//! than a specialized store subtype.

use tracing::debug;

use crate::application::entity_store::EntityStore;
use crate::application::store::StoreError;
use crate::domain::credentials;
use crate::domain::entities::UserRecord;

/// Check an email/password pair against the `users` collection.
///
/// Reads the user document directly (the key index only maps email to id)
/// and compares digests in constant time. `Ok(None)` covers both unknown
/// email and wrong password; callers cannot tell which failed.
pub async fn authenticate(
    users: &EntityStore<UserRecord>,
    email: &str,
    password: &str,
) -> Result<Option<UserRecord>, StoreError> {
    let Some(user) = users.find_by_key(email.trim()).await? else {
        debug!("login rejected: unknown email");
        return Ok(None);
    };
    if credentials::verify_password(password, &user.password_digest) {
        Ok(Some(user))
    } else {
        debug!("login rejected: digest mismatch");
        Ok(None)
    }
}
