//! # birdwire
//!
//! Protocol client for the undocumented, reverse-engineered Twitter/X web
//! API. Authenticates with browser session cookies supplied by an external
//! login flow, or alternately with official app credentials against the
//! versioned API. Lets a calling application post, fetch, search, and react
//! to tweets, including chunked media upload with server-side processing
//! and normalization of the service's divergent nested response shapes.
//!
//! ## Features
//!
//! - Cookie-session authentication with CSRF mirroring across the service's
//!   domain aliases
//! - Tweet creation (standard and long-form), replies, quotes, polls
//! - Single-shot image and four-phase chunked video upload
//! - Cursor-based search and profile lookup
//! - One canonical domain model reconciled from the divergent response
//!   shapes
//!
//! ## Example
//!
//! ```rust,no_run
//! use birdwire::{Client, TweetOptions};
//!
//! # async fn example() -> Result<(), birdwire::ClientError> {
//! let client = Client::from_cookie_string("auth_token=…; ct0=…; twid=…")?;
//! let tweet = client.send_tweet("Hello!", &TweetOptions::default()).await?;
//! println!("Posted tweet {}", tweet.id);
//! # Ok(())
//! # }
//! ```
//!
//! This crate performs no retries and no rate limiting; both are the
//! caller's concern. The only unbounded wait is the media-processing poll,
//! which callers can bound with `tokio::time::timeout`.

mod api;
mod auth;
mod client;
pub mod config;
mod error;
mod graphql;
mod http;
mod media;
mod normalize;
pub mod types;

// Re-export the public surface
pub use client::Client;
pub use config::{AppCredentials, CookieRecord, Credentials};
pub use error::{ClientError, UploadPhase};
pub use types::{
    MediaAttachment, Photo, Poll, PollOption, PollRequest, Profile, SearchMode, SearchOptions,
    SearchPage, Tweet, TweetOptions, Video,
};

#[cfg(test)]
mod tests;
