//! The public client façade.
//!
//! A [`Client`] binds the full capability set to one concrete strategy at
//! construction: the undocumented web API driven by a cookie session, or
//! the official versioned API driven by app credentials. Every call site is
//! strategy-agnostic; the branch lives here, once.

use log::info;

use crate::api::ApiStrategy;
use crate::auth::{AppAuth, AuthStrategy, CookieAuth};
use crate::config::{AppCredentials, CookieRecord, Credentials};
use crate::error::ClientError;
use crate::graphql;
use crate::http::{Endpoints, Executor};
use crate::types::{Profile, SearchOptions, SearchPage, Tweet, TweetOptions};

enum Strategy {
    Graphql(Executor),
    Api(ApiStrategy),
}

/// A Twitter/X client bound to one authentication strategy.
pub struct Client {
    strategy: Strategy,
}

impl Client {
    /// Constructs a client from browser session cookies.
    ///
    /// Fails with [`ClientError::Configuration`] before any network call
    /// when the session token, CSRF token, or user id cookie is missing.
    pub fn from_cookies(records: Vec<CookieRecord>) -> Result<Self, ClientError> {
        Self::from_cookies_with_endpoints(records, Endpoints::default())
    }

    /// Constructs a client from a browser-style cookie header string, e.g.
    /// `"auth_token=…; ct0=…; twid=…"`.
    pub fn from_cookie_string(cookies: &str) -> Result<Self, ClientError> {
        let records = cookies
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse)
            .collect::<Result<Vec<CookieRecord>, ClientError>>()?;
        Self::from_cookies(records)
    }

    /// Constructs a client from official app credentials.
    pub fn from_app_credentials(credentials: AppCredentials) -> Result<Self, ClientError> {
        Self::from_app_credentials_with_endpoints(credentials, Endpoints::default())
    }

    /// Constructs a client from either credential kind.
    pub fn from_credentials(credentials: Credentials) -> Result<Self, ClientError> {
        match credentials {
            Credentials::Cookies(records) => Self::from_cookies(records),
            Credentials::App(app) => Self::from_app_credentials(app),
        }
    }

    /// Constructs a client from the environment; see
    /// [`Credentials::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_credentials(Credentials::from_env()?)
    }

    pub(crate) fn from_cookies_with_endpoints(
        records: Vec<CookieRecord>,
        endpoints: Endpoints,
    ) -> Result<Self, ClientError> {
        let auth = AuthStrategy::Cookie(CookieAuth::new(records)?);
        let exec = Executor::new(auth, endpoints)?;
        info!("Client ready (web session strategy)");
        Ok(Client {
            strategy: Strategy::Graphql(exec),
        })
    }

    pub(crate) fn from_app_credentials_with_endpoints(
        credentials: AppCredentials,
        endpoints: Endpoints,
    ) -> Result<Self, ClientError> {
        let auth = AuthStrategy::App(AppAuth::new(credentials, endpoints.token.clone()));
        let exec = Executor::new(auth, endpoints)?;
        info!("Client ready (official API strategy)");
        Ok(Client {
            strategy: Strategy::Api(ApiStrategy::new(exec)),
        })
    }

    /// Posts a tweet. See [`TweetOptions`] for replies, quotes, media, and
    /// polls.
    pub async fn send_tweet(
        &self,
        text: &str,
        options: &TweetOptions,
    ) -> Result<Tweet, ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::tweets::send_tweet(exec, text, options).await,
            Strategy::Api(api) => api.send_tweet(text, options).await,
        }
    }

    /// Fetches a single tweet by id.
    pub async fn get_tweet(&self, id: &str) -> Result<Tweet, ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::tweets::get_tweet(exec, id).await,
            Strategy::Api(api) => api.get_tweet(id).await,
        }
    }

    /// Likes a tweet by id.
    pub async fn like_tweet(&self, id: &str) -> Result<(), ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::tweets::like_tweet(exec, id).await,
            Strategy::Api(api) => api.like_tweet(id).await,
        }
    }

    /// Retweets a tweet by id.
    pub async fn retweet(&self, id: &str) -> Result<(), ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::tweets::retweet(exec, id).await,
            Strategy::Api(api) => api.retweet(id).await,
        }
    }

    /// Posts a quote tweet of `quoted_id`.
    pub async fn send_quote_tweet(
        &self,
        text: &str,
        quoted_id: &str,
        options: &TweetOptions,
    ) -> Result<Tweet, ClientError> {
        let mut options = options.clone();
        options.quote_id = Some(quoted_id.to_string());
        self.send_tweet(text, &options).await
    }

    /// Follows an account by username.
    pub async fn follow(&self, username: &str) -> Result<(), ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::following::follow(exec, username).await,
            Strategy::Api(api) => api.follow(username).await,
        }
    }

    /// Runs one page of a tweet search. Pass the returned cursor back via
    /// [`SearchOptions::cursor`] to fetch the next page.
    pub async fn search_tweets(
        &self,
        query: &str,
        options: &SearchOptions,
    ) -> Result<SearchPage, ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::search::search_tweets(exec, query, options).await,
            Strategy::Api(api) => api.search_tweets(query, options).await,
        }
    }

    /// Fetches a profile by username.
    pub async fn get_profile(&self, username: &str) -> Result<Profile, ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => graphql::profiles::get_profile(exec, username).await,
            Strategy::Api(api) => api.get_profile(username).await,
        }
    }

    /// Best-effort, non-throwing authentication probe.
    pub fn is_authenticated(&self) -> bool {
        match &self.strategy {
            Strategy::Graphql(exec) => exec.auth().is_authenticated(),
            Strategy::Api(api) => api.executor().auth().is_authenticated(),
        }
    }

    /// Replaces the session cookies, e.g. after the caller re-ran its login
    /// flow. Only meaningful on the cookie strategy.
    pub fn update_cookies(&self, records: &[CookieRecord]) -> Result<(), ClientError> {
        match &self.strategy {
            Strategy::Graphql(exec) => match exec.auth() {
                AuthStrategy::Cookie(auth) => {
                    auth.set_cookies(records);
                    Ok(())
                }
                AuthStrategy::App(_) => Err(ClientError::Configuration(
                    "client is not cookie-authenticated".to_string(),
                )),
            },
            Strategy::Api(_) => Err(ClientError::Configuration(
                "client is not cookie-authenticated".to_string(),
            )),
        }
    }
}
