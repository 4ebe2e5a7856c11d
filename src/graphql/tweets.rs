//! Tweet operations: creation (standard and long-form), fetch, like, and
//! retweet.

use futures::future::try_join_all;
use log::{debug, info};
use reqwest::Method;
use serde_json::json;

use super::{features, operation_url, polls, query_url, Operation};
use crate::error::ClientError;
use crate::http::Executor;
use crate::media;
use crate::normalize;
use crate::types::{Tweet, TweetOptions};

const CREATE_TWEET: Operation = ("a1p9RWpkYKBjWv_I3WzS-A", "CreateTweet");
const CREATE_NOTE_TWEET: Operation = ("0Hf4rcVnJOmuhcEbVj8FJQ", "CreateNoteTweet");
const TWEET_RESULT_BY_REST_ID: Operation = ("DJS3BdhUhcaEpZ7B7irJDg", "TweetResultByRestId");
const FAVORITE_TWEET: Operation = ("lI07N6Otwv1PhnEgXILM7A", "FavoriteTweet");
const CREATE_RETWEET: Operation = ("ojPdsZsimiJrUGLR1sjUtA", "CreateRetweet");

/// Standard tweets are limited to 280 units; anything longer must go
/// through the long-form creation path.
const MAX_TWEET_LENGTH: usize = 280;

/// True when the text must be routed to the long-form creation path.
/// Exactly 280 units still routes to the standard path.
pub(crate) fn uses_long_form(text: &str) -> bool {
    text.chars().count() > MAX_TWEET_LENGTH
}

/// Posts a tweet.
///
/// Attachments are uploaded first (separate attachments concurrently, each
/// upload internally sequential) and their media ids referenced in the
/// creation call. A requested poll is created as a card beforehand and its
/// opaque reference injected. The creation call itself routes to exactly
/// one of the standard or long-form operations depending on text length.
///
/// # Parameters
///
/// - `text`: the tweet text
/// - `options`: reply target, quote target, attachments, and poll
///
/// # Returns
///
/// - `Ok(Tweet)`: the created tweet, normalized
/// - `Err(ClientError)`: upload, transport, or normalization failure
pub(crate) async fn send_tweet(
    exec: &Executor,
    text: &str,
    options: &TweetOptions,
) -> Result<Tweet, ClientError> {
    info!("Posting tweet ({} chars)", text.chars().count());

    let media_ids: Vec<String> = if options.media.is_empty() {
        Vec::new()
    } else {
        let uploads = options.media.iter().map(|m| media::upload_media(exec, m));
        try_join_all(uploads).await?
    };

    let card_uri = match &options.poll {
        Some(poll) => Some(polls::create_card(exec, poll).await?),
        None => None,
    };

    let media_entities: Vec<serde_json::Value> = media_ids
        .iter()
        .map(|id| json!({ "media_id": id, "tagged_users": [] }))
        .collect();

    let mut variables = json!({
        "tweet_text": text,
        "dark_request": false,
        "media": {
            "media_entities": media_entities,
            "possibly_sensitive": false,
        },
        "semantic_annotation_ids": [],
    });
    if let Some(reply_to) = &options.reply_to {
        variables["reply"] = json!({
            "in_reply_to_tweet_id": reply_to,
            "exclude_reply_user_ids": [],
        });
    }
    if let Some(quote_id) = &options.quote_id {
        // Quotes reference the quoted tweet by permalink, not by id.
        variables["attachment_url"] =
            json!(format!("https://twitter.com/twitter/status/{}", quote_id));
    }
    if let Some(card_uri) = card_uri {
        variables["card_uri"] = json!(card_uri);
    }

    let (operation, flags) = if uses_long_form(text) {
        debug!("Routing to long-form creation path");
        (CREATE_NOTE_TWEET, features::create_note_tweet())
    } else {
        (CREATE_TWEET, features::create_tweet())
    };

    let body = json!({
        "variables": variables,
        "features": flags,
        "queryId": operation.0,
    });
    let response = exec
        .execute(
            Method::POST,
            &operation_url(&exec.endpoints, operation),
            Some(&body),
            &[],
        )
        .await?;
    normalize::tweet_from_graphql(&response)
}

/// Fetches a single tweet by id.
pub(crate) async fn get_tweet(exec: &Executor, id: &str) -> Result<Tweet, ClientError> {
    info!("Fetching tweet {}", id);
    let variables = json!({
        "tweetId": id,
        "withCommunity": false,
        "includePromotedContent": false,
        "withVoice": false,
    });
    let url = query_url(
        &exec.endpoints,
        TWEET_RESULT_BY_REST_ID,
        &variables,
        Some(&features::tweet_result_by_rest_id()),
    );
    let response = exec.execute(Method::GET, &url, None, &[]).await?;
    normalize::tweet_from_graphql(&response)
}

/// Likes a tweet. Liking an already-liked tweet is an error on the server
/// side and surfaces as a transport error.
pub(crate) async fn like_tweet(exec: &Executor, id: &str) -> Result<(), ClientError> {
    info!("Liking tweet {}", id);
    let body = json!({
        "variables": { "tweet_id": id },
        "queryId": FAVORITE_TWEET.0,
    });
    exec.execute(
        Method::POST,
        &operation_url(&exec.endpoints, FAVORITE_TWEET),
        Some(&body),
        &[],
    )
    .await?;
    Ok(())
}

/// Retweets a tweet.
pub(crate) async fn retweet(exec: &Executor, id: &str) -> Result<(), ClientError> {
    info!("Retweeting tweet {}", id);
    let body = json!({
        "variables": { "tweet_id": id, "dark_request": false },
        "queryId": CREATE_RETWEET.0,
    });
    exec.execute(
        Method::POST,
        &operation_url(&exec.endpoints, CREATE_RETWEET),
        Some(&body),
        &[],
    )
    .await?;
    Ok(())
}
