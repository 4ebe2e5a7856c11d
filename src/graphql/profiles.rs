//! Profile lookup by username.

use log::info;
use reqwest::Method;
use serde_json::json;

use super::{features, query_url, Operation};
use crate::error::ClientError;
use crate::http::Executor;
use crate::normalize;
use crate::types::Profile;

const USER_BY_SCREEN_NAME: Operation = ("G3KGOASz96M-Qu0nwmGXNg", "UserByScreenName");

/// Fetches a profile by username.
///
/// Profiles are reconstructed on every fetch and never cached by this
/// layer.
pub(crate) async fn get_profile(exec: &Executor, username: &str) -> Result<Profile, ClientError> {
    info!("Fetching profile @{}", username);
    let variables = json!({
        "screen_name": username,
        "withSafetyModeUserFields": true,
    });
    let url = query_url(
        &exec.endpoints,
        USER_BY_SCREEN_NAME,
        &variables,
        Some(&features::user_by_screen_name()),
    );
    let response = exec.execute(Method::GET, &url, None, &[]).await?;
    normalize::profile_from_graphql(&response)
}

/// Resolves a username to its user id.
pub(crate) async fn user_id_for(exec: &Executor, username: &str) -> Result<String, ClientError> {
    let profile = get_profile(exec, username).await?;
    if profile.id.is_empty() {
        return Err(ClientError::NotFound(format!(
            "no user id for @{}",
            username
        )));
    }
    Ok(profile.id)
}
