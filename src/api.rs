//! Official versioned API strategy.
//!
//! Used when app-level credentials are configured instead of a session
//! cookie. The same public capability set is served from the documented v2
//! endpoints; responses are normalized into the same domain records as the
//! GraphQL strategy's. Write operations resolve the authenticated user id
//! once and reuse it.

use log::info;
use reqwest::Method;
use serde_json::json;
use tokio::sync::OnceCell;

use crate::error::ClientError;
use crate::http::Executor;
use crate::normalize;
use crate::types::{Profile, SearchPage, SearchOptions, Tweet, TweetOptions};

const TWEET_FIELDS: &str =
    "attachments,author_id,conversation_id,created_at,entities,public_metrics,possibly_sensitive,referenced_tweets";
const MEDIA_FIELDS: &str = "media_key,type,url,preview_image_url,alt_text,variants";
const USER_FIELDS: &str =
    "id,name,username,created_at,description,location,profile_image_url,public_metrics,url,verified";

pub(crate) struct ApiStrategy {
    exec: Executor,
    user_id: OnceCell<String>,
}

impl ApiStrategy {
    pub(crate) fn new(exec: Executor) -> Self {
        ApiStrategy {
            exec,
            user_id: OnceCell::new(),
        }
    }

    pub(crate) fn executor(&self) -> &Executor {
        &self.exec
    }

    /// The authenticated user's id, resolved once per client.
    async fn me_id(&self) -> Result<&String, ClientError> {
        self.user_id
            .get_or_try_init(|| async {
                let url = format!("{}/users/me", self.exec.endpoints.api_base);
                let response = self.exec.execute(Method::GET, &url, None, &[]).await?;
                response
                    .pointer("/data/id")
                    .and_then(|id| id.as_str())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ClientError::Configuration(
                            "could not resolve the authenticated user; write operations need a user-context access token"
                                .to_string(),
                        )
                    })
            })
            .await
    }

    pub(crate) async fn send_tweet(
        &self,
        text: &str,
        options: &TweetOptions,
    ) -> Result<Tweet, ClientError> {
        if !options.media.is_empty() {
            return Err(ClientError::Configuration(
                "media attachments require cookie authentication".to_string(),
            ));
        }
        info!("Posting tweet via the official API");

        let mut body = json!({ "text": text });
        if let Some(reply_to) = &options.reply_to {
            body["reply"] = json!({ "in_reply_to_tweet_id": reply_to });
        }
        if let Some(quote_id) = &options.quote_id {
            body["quote_tweet_id"] = json!(quote_id);
        }
        if let Some(poll) = &options.poll {
            body["poll"] = json!({
                "options": poll.options,
                "duration_minutes": poll.duration_minutes,
            });
        }

        let url = format!("{}/tweets", self.exec.endpoints.api_base);
        let response = self.exec.execute(Method::POST, &url, Some(&body), &[]).await?;
        let id = response
            .pointer("/data/id")
            .and_then(|id| id.as_str())
            .ok_or_else(|| {
                ClientError::NotFound("tweet creation returned no id".to_string())
            })?
            .to_string();
        self.get_tweet(&id).await
    }

    pub(crate) async fn get_tweet(&self, id: &str) -> Result<Tweet, ClientError> {
        info!("Fetching tweet {} via the official API", id);
        let url = format!(
            "{}/tweets/{}?tweet.fields={}&expansions=author_id,attachments.media_keys,referenced_tweets.id&media.fields={}&user.fields=id,name,username",
            self.exec.endpoints.api_base, id, TWEET_FIELDS, MEDIA_FIELDS
        );
        let response = self.exec.execute(Method::GET, &url, None, &[]).await?;
        normalize::tweet_from_v2(&response)
    }

    pub(crate) async fn like_tweet(&self, id: &str) -> Result<(), ClientError> {
        let me = self.me_id().await?;
        info!("Liking tweet {} via the official API", id);
        let url = format!("{}/users/{}/likes", self.exec.endpoints.api_base, me);
        self.exec
            .execute(Method::POST, &url, Some(&json!({ "tweet_id": id })), &[])
            .await?;
        Ok(())
    }

    pub(crate) async fn retweet(&self, id: &str) -> Result<(), ClientError> {
        let me = self.me_id().await?;
        info!("Retweeting tweet {} via the official API", id);
        let url = format!("{}/users/{}/retweets", self.exec.endpoints.api_base, me);
        self.exec
            .execute(Method::POST, &url, Some(&json!({ "tweet_id": id })), &[])
            .await?;
        Ok(())
    }

    pub(crate) async fn follow(&self, username: &str) -> Result<(), ClientError> {
        let target = self.get_profile(username).await?;
        let me = self.me_id().await?;
        info!("Following @{} via the official API", username);
        let url = format!("{}/users/{}/following", self.exec.endpoints.api_base, me);
        self.exec
            .execute(
                Method::POST,
                &url,
                Some(&json!({ "target_user_id": target.id })),
                &[],
            )
            .await?;
        Ok(())
    }

    pub(crate) async fn search_tweets(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchPage, ClientError> {
        // The recent-search endpoint accepts page sizes from 10 to 100.
        let count = options.max_results.unwrap_or(20).clamp(10, 100);
        info!("Searching '{}' via the official API", query);
        let mut url = format!(
            "{}/tweets/search/recent?query={}&max_results={}&tweet.fields={}&expansions=author_id,attachments.media_keys&media.fields={}&user.fields=id,name,username",
            self.exec.endpoints.api_base,
            urlencoding::encode(query),
            count,
            TWEET_FIELDS,
            MEDIA_FIELDS
        );
        if let Some(cursor) = &options.cursor {
            url.push_str(&format!("&pagination_token={}", urlencoding::encode(cursor)));
        }
        let response = self.exec.execute(Method::GET, &url, None, &[]).await?;
        normalize::search_page_from_v2(&response)
    }

    pub(crate) async fn get_profile(&self, username: &str) -> Result<Profile, ClientError> {
        info!("Fetching profile @{} via the official API", username);
        let url = format!(
            "{}/users/by/username/{}?user.fields={}",
            self.exec.endpoints.api_base,
            urlencoding::encode(username),
            USER_FIELDS
        );
        let response = self.exec.execute(Method::GET, &url, None, &[]).await?;
        normalize::profile_from_v2(&response)
    }
}
