//! Domain model for the Twitter/X client.
//!
//! These are the canonical records the normalizer produces from the
//! service's divergent response shapes. They are reconstructed on every
//! fetch and never cached by this layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    /// User ID.
    pub id: String,
    /// Username (handle without @).
    pub username: String,
    /// Display name.
    pub name: String,
    /// Bio/description.
    pub biography: Option<String>,
    /// Legacy verified badge.
    pub verified: bool,
    /// Blue-subscription verified badge.
    pub is_blue_verified: bool,
    /// Follower count.
    pub followers_count: u64,
    /// Following count.
    pub following_count: u64,
    /// Tweet count.
    pub tweets_count: u64,
    /// Avatar image URL.
    pub avatar: Option<String>,
    /// Banner image URL.
    pub banner: Option<String>,
    /// Location field.
    pub location: Option<String>,
    /// Website URL.
    pub website: Option<String>,
    /// Account creation time.
    pub joined: Option<DateTime<Utc>>,
}

/// An attached photo.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Photo {
    /// Media ID.
    pub id: String,
    /// Image URL.
    pub url: String,
    /// Accessibility alt text, when the author provided one.
    pub alt_text: Option<String>,
}

/// An attached video or animated GIF.
///
/// `url` is the playable variant with the highest bitrate among the MP4
/// entries; when the service offers no MP4 variant there is no playable URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Video {
    /// Media ID.
    pub id: String,
    /// Playable MP4 URL, highest bitrate available.
    pub url: Option<String>,
    /// Preview (thumbnail) image URL.
    pub preview: String,
}

/// One choice in a poll.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollOption {
    /// Choice label.
    pub label: String,
    /// Vote count, absent while the service withholds it.
    pub votes: Option<u64>,
}

/// A poll attached to a tweet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Poll {
    /// Card ID, when the service exposes one.
    pub id: Option<String>,
    /// Ordered choices.
    pub options: Vec<PollOption>,
    /// End of the voting window.
    pub end_datetime: Option<DateTime<Utc>>,
    /// Configured duration in minutes.
    pub duration_minutes: Option<u64>,
    /// Voting status, e.g. "open" or "closed".
    pub voting_status: Option<String>,
}

/// The service's atomic public post.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tweet {
    /// Tweet ID.
    pub id: String,
    /// Author's user ID.
    pub user_id: String,
    /// Author's username.
    pub username: String,
    /// Author's display name.
    pub name: String,
    /// Text content. When the service carries a long-form override it takes
    /// precedence over the standard field.
    pub text: String,
    /// Creation time.
    pub created_at: Option<DateTime<Utc>>,
    /// Conversation (thread root) ID.
    pub conversation_id: Option<String>,
    /// Like count.
    pub likes: u64,
    /// Retweet count.
    pub retweets: u64,
    /// Reply count.
    pub replies: u64,
    /// View count.
    pub views: u64,
    /// Bookmark count.
    pub bookmark_count: u64,
    /// Attached photos.
    pub photos: Vec<Photo>,
    /// Attached videos.
    pub videos: Vec<Video>,
    /// Attached poll.
    pub poll: Option<Poll>,
    /// Hashtags mentioned in the text.
    pub hashtags: Vec<String>,
    /// Expanded URLs mentioned in the text.
    pub urls: Vec<String>,
    /// Usernames mentioned in the text.
    pub mentions: Vec<String>,
    /// ID of the tweet this one replies to.
    pub in_reply_to_status_id: Option<String>,
    /// ID of the quoted tweet.
    pub quoted_status_id: Option<String>,
    /// ID of the retweeted tweet.
    pub retweeted_status_id: Option<String>,
    /// The quoted tweet, embedded one level deep by the server.
    pub quoted_tweet: Option<Box<Tweet>>,
    /// The retweeted tweet, embedded one level deep by the server.
    pub retweeted_tweet: Option<Box<Tweet>>,
    /// Whether this tweet quotes another.
    pub is_quoted: bool,
    /// Whether this tweet is a reply.
    pub is_reply: bool,
    /// Whether this tweet is a retweet.
    pub is_retweet: bool,
    /// Whether this tweet is pinned to the author's profile.
    pub is_pin: bool,
    /// Whether this tweet continues the author's own thread.
    pub is_self_thread: bool,
    /// Whether the service flagged the content as possibly sensitive.
    pub sensitive_content: bool,
}

/// One page of search results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// Tweets on this page, in the order the service returned them.
    pub tweets: Vec<Tweet>,
    /// Opaque cursor for the next page; absent when no further pages exist.
    pub next_cursor: Option<String>,
}

/// Search ranking/filter mode, mapped to the search operation's `product`
/// parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SearchMode {
    /// Top-ranked results.
    #[default]
    Top,
    /// Most recent results.
    Latest,
    /// Photo results.
    Photos,
    /// Video results.
    Videos,
    /// Account results.
    Users,
}

impl SearchMode {
    /// The `product` value the search timeline operation expects.
    pub(crate) fn product(self) -> &'static str {
        match self {
            SearchMode::Top => "Top",
            SearchMode::Latest => "Latest",
            SearchMode::Photos => "Photos",
            SearchMode::Videos => "Videos",
            SearchMode::Users => "People",
        }
    }
}

/// Options for [`crate::Client::search_tweets`].
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Requested page size. Defaults to 20, capped at 50 by the service.
    pub max_results: Option<u32>,
    /// Cursor from a previous page.
    pub cursor: Option<String>,
    /// Ranking/filter mode.
    pub mode: SearchMode,
}

/// A binary media attachment to upload alongside a tweet.
#[derive(Clone)]
pub struct MediaAttachment {
    /// Raw file bytes.
    pub data: Vec<u8>,
    /// MIME type, e.g. `image/jpeg` or `video/mp4`.
    pub media_type: String,
}

impl std::fmt::Debug for MediaAttachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaAttachment")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

/// A poll to attach to a new tweet.
#[derive(Debug, Clone)]
pub struct PollRequest {
    /// Choice labels, in display order. The service accepts two to four.
    pub options: Vec<String>,
    /// Voting window in minutes.
    pub duration_minutes: u64,
}

/// Options for [`crate::Client::send_tweet`].
#[derive(Debug, Clone, Default)]
pub struct TweetOptions {
    /// Tweet ID to reply to.
    pub reply_to: Option<String>,
    /// Tweet ID to quote.
    pub quote_id: Option<String>,
    /// Media attachments to upload before posting.
    pub media: Vec<MediaAttachment>,
    /// Poll to attach.
    pub poll: Option<PollRequest>,
}
