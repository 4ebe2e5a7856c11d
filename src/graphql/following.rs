//! Follow operations.
//!
//! The follow endpoint predates the GraphQL migration: it accepts only user
//! ids, takes a form-encoded body, and lives on the legacy REST host. Its
//! transport conventions are preserved exactly.

use log::info;

use super::profiles;
use crate::error::ClientError;
use crate::http::Executor;

/// Follows an account by username.
///
/// The username is first resolved to an id through the profile-fetch
/// operation, then posted form-encoded to the legacy friendships endpoint.
/// The CSRF header rides along with the standard auth headers.
pub(crate) async fn follow(exec: &Executor, username: &str) -> Result<(), ClientError> {
    let user_id = profiles::user_id_for(exec, username).await?;
    info!("Following @{} ({})", username, user_id);
    let url = format!("{}/friendships/create.json", exec.endpoints.legacy_base);
    exec.execute_form(
        &url,
        &[("user_id", user_id.as_str()), ("follow", "true")],
        &[("referer", "https://twitter.com/")],
    )
    .await?;
    Ok(())
}
