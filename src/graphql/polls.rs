//! Poll card creation.
//!
//! Polls are not part of the tweet-creation payload. A card is created
//! first on its own endpoint, form-encoded like the other legacy calls,
//! and the returned opaque reference is injected into the creation call.

use log::info;

use crate::error::ClientError;
use crate::http::Executor;
use crate::types::PollRequest;

/// Creates a poll card and returns its opaque `card_uri`.
///
/// Card templates exist for two to four choices only; other counts are
/// rejected before any network call.
pub(crate) async fn create_card(exec: &Executor, poll: &PollRequest) -> Result<String, ClientError> {
    let choices = poll.options.len();
    if !(2..=4).contains(&choices) {
        return Err(ClientError::Configuration(format!(
            "polls take 2 to 4 choices, got {}",
            choices
        )));
    }
    info!(
        "Creating {}-choice poll card ({} minutes)",
        choices, poll.duration_minutes
    );

    let mut card_data = serde_json::Map::new();
    card_data.insert(
        "twitter:card".to_string(),
        serde_json::json!(format!("poll{}choice_text_only", choices)),
    );
    card_data.insert(
        "twitter:api:api:endpoint".to_string(),
        serde_json::json!("1"),
    );
    card_data.insert(
        "twitter:long:duration_minutes".to_string(),
        serde_json::json!(poll.duration_minutes),
    );
    for (i, label) in poll.options.iter().enumerate() {
        card_data.insert(
            format!("twitter:string:choice{}_label", i + 1),
            serde_json::json!(label),
        );
    }
    let encoded = serde_json::to_string(&card_data)?;

    let response = exec
        .execute_form(&exec.endpoints.cards, &[("card_data", &encoded)], &[])
        .await?;
    response
        .get("card_uri")
        .and_then(|uri| uri.as_str())
        .map(str::to_string)
        .ok_or_else(|| ClientError::NotFound("card creation returned no card_uri".to_string()))
}
