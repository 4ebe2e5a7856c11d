//! Response normalization.
//!
//! The service nests the real tweet payload under different paths depending
//! on which operation produced it: a direct creation result, a detail-view
//! result, or a deeply nested timeline entry. The functions here try each
//! known path in a fixed priority order and reconcile the divergent shapes
//! into the canonical [`Tweet`], [`Profile`], and [`SearchPage`] records.
//! Numeric fields sometimes arrive as strings and are coerced; missing
//! metrics default to zero, never null.

use chrono::{DateTime, Utc};
use log::warn;
use serde_json::Value;

use crate::error::ClientError;
use crate::types::{Photo, Poll, PollOption, Profile, SearchPage, Tweet, Video};

/// Quoted/retweeted content is embedded at most one level deep by the
/// server; the walk is still capped in case that ever stops holding.
const MAX_NESTING_DEPTH: u8 = 2;

/// Creation timestamps on the web API use the legacy format, e.g.
/// `Wed Oct 10 20:19:24 +0000 2018`.
const LEGACY_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %z %Y";

/// Recovers a tweet from any of the known GraphQL response shapes.
///
/// Paths are tried in priority order: standard creation result, long-form
/// creation result, detail-view result, then the first tweet entry of a
/// threaded-conversation timeline. Only when none match does this fail with
/// [`ClientError::NotFound`].
pub(crate) fn tweet_from_graphql(payload: &Value) -> Result<Tweet, ClientError> {
    let data = payload.get("data");
    let result = data
        .and_then(|d| d.pointer("/create_tweet/tweet_results/result"))
        .or_else(|| data.and_then(|d| d.pointer("/notetweet_create/tweet_results/result")))
        .or_else(|| data.and_then(|d| d.pointer("/tweetResult/result")))
        .or_else(|| data.and_then(first_conversation_entry));
    match result {
        Some(result) => parse_tweet_result(result, 0),
        None => Err(ClientError::NotFound(
            "no tweet found in any known response shape".to_string(),
        )),
    }
}

/// Finds the first `tweet-…` entry of a threaded-conversation timeline.
fn first_conversation_entry(data: &Value) -> Option<&Value> {
    let instructions = data
        .pointer("/threaded_conversation_with_injections_v2/instructions")?
        .as_array()?;
    for instruction in instructions {
        let entries = match instruction.get("entries").and_then(|e| e.as_array()) {
            Some(entries) => entries,
            None => continue,
        };
        for entry in entries {
            let entry_id = entry.get("entryId").and_then(|id| id.as_str()).unwrap_or("");
            if !entry_id.starts_with("tweet-") {
                continue;
            }
            if let Some(result) = entry.pointer("/content/itemContent/tweet_results/result") {
                return Some(result);
            }
        }
    }
    None
}

/// Normalizes one tweet result object.
///
/// Handles the `TweetWithVisibilityResults` wrapper, prefers the long-form
/// text override, and recursively normalizes embedded quoted and retweeted
/// content up to [`MAX_NESTING_DEPTH`].
pub(crate) fn parse_tweet_result(result: &Value, depth: u8) -> Result<Tweet, ClientError> {
    // Limited-visibility tweets wrap the real result one level down.
    let result = result.get("tweet").unwrap_or(result);

    let legacy = result
        .get("legacy")
        .ok_or_else(|| ClientError::NotFound("tweet result carries no legacy data".to_string()))?;

    let mut tweet = Tweet::default();

    tweet.id = opt_str(legacy, "id_str")
        .or_else(|| opt_str(result, "rest_id"))
        .unwrap_or_default();

    if let Some(user) = result.pointer("/core/user_results/result") {
        tweet.user_id = opt_str(user, "rest_id").unwrap_or_default();
        if let Some(user_legacy) = user.get("legacy") {
            tweet.username = opt_str(user_legacy, "screen_name").unwrap_or_default();
            tweet.name = opt_str(user_legacy, "name").unwrap_or_default();
        }
    }
    if tweet.user_id.is_empty() {
        tweet.user_id = opt_str(legacy, "user_id_str").unwrap_or_default();
    }

    // The long-form override takes precedence over the standard field.
    tweet.text = result
        .pointer("/note_tweet/note_tweet_results/result/text")
        .and_then(|t| t.as_str())
        .or_else(|| legacy.get("full_text").and_then(|t| t.as_str()))
        .unwrap_or_default()
        .to_string();

    tweet.created_at = opt_str(legacy, "created_at")
        .as_deref()
        .and_then(parse_legacy_time);
    tweet.conversation_id = opt_str(legacy, "conversation_id_str");

    tweet.likes = metric(legacy.get("favorite_count"));
    tweet.retweets = metric(legacy.get("retweet_count"));
    tweet.replies = metric(legacy.get("reply_count"));
    tweet.bookmark_count = metric(legacy.get("bookmark_count"));
    tweet.views = metric(result.pointer("/views/count"));

    if let Some(entities) = legacy.get("entities") {
        tweet.hashtags = collect_strs(entities.get("hashtags"), "text");
        tweet.urls = collect_strs(entities.get("urls"), "expanded_url");
        tweet.mentions = collect_strs(entities.get("user_mentions"), "screen_name");
    }

    if let Some(media) = legacy
        .pointer("/extended_entities/media")
        .and_then(|m| m.as_array())
    {
        let (photos, videos) = split_media(media);
        tweet.photos = photos;
        tweet.videos = videos;
    }

    if let Some(card) = result.get("card") {
        tweet.poll = parse_poll_card(card);
    }

    tweet.in_reply_to_status_id = opt_str(legacy, "in_reply_to_status_id_str");
    tweet.quoted_status_id = opt_str(legacy, "quoted_status_id_str");
    tweet.is_reply = tweet.in_reply_to_status_id.is_some();
    tweet.is_quoted = legacy
        .get("is_quote_status")
        .and_then(|q| q.as_bool())
        .unwrap_or(false)
        || tweet.quoted_status_id.is_some();
    tweet.is_self_thread = legacy.pointer("/self_thread/id_str").is_some();
    tweet.sensitive_content = legacy
        .get("possibly_sensitive")
        .and_then(|s| s.as_bool())
        .unwrap_or(false);

    if depth < MAX_NESTING_DEPTH {
        if let Some(quoted) = result.pointer("/quoted_status_result/result") {
            match parse_tweet_result(quoted, depth + 1) {
                Ok(parsed) => tweet.quoted_tweet = Some(Box::new(parsed)),
                Err(e) => warn!("Failed to normalize quoted tweet: {}", e),
            }
        }
        if let Some(retweeted) = legacy.pointer("/retweeted_status_result/result") {
            match parse_tweet_result(retweeted, depth + 1) {
                Ok(parsed) => {
                    tweet.retweeted_status_id = Some(parsed.id.clone());
                    tweet.retweeted_tweet = Some(Box::new(parsed));
                    tweet.is_retweet = true;
                }
                Err(e) => warn!("Failed to normalize retweeted tweet: {}", e),
            }
        }
    }

    Ok(tweet)
}

/// Splits raw media entries into photos and videos by their type
/// discriminator. Video entries with no playable MP4 variant are discarded.
fn split_media(media: &[Value]) -> (Vec<Photo>, Vec<Video>) {
    let mut photos = Vec::new();
    let mut videos = Vec::new();
    for item in media {
        let id = opt_str(item, "id_str").unwrap_or_default();
        let preview = opt_str(item, "media_url_https").unwrap_or_default();
        match item.get("type").and_then(|t| t.as_str()) {
            Some("photo") => photos.push(Photo {
                id,
                url: preview,
                alt_text: opt_str(item, "ext_alt_text"),
            }),
            Some("video") | Some("animated_gif") => {
                if let Some(url) = best_variant(item) {
                    videos.push(Video {
                        id,
                        url: Some(url),
                        preview,
                    });
                }
            }
            _ => {}
        }
    }
    (photos, videos)
}

/// Picks the highest-bitrate MP4 variant of a video entry.
fn best_variant(item: &Value) -> Option<String> {
    item.pointer("/video_info/variants")
        .and_then(|v| v.as_array())?
        .iter()
        .filter(|v| v.get("content_type").and_then(|c| c.as_str()) == Some("video/mp4"))
        .max_by_key(|v| v.get("bitrate").and_then(|b| b.as_u64()).unwrap_or(0))
        .and_then(|v| opt_str(v, "url"))
}

/// Parses a poll out of a card attachment. Non-poll cards yield `None`.
fn parse_poll_card(card: &Value) -> Option<Poll> {
    let legacy = card.get("legacy")?;
    let name = legacy.get("name").and_then(|n| n.as_str())?;
    if !name.contains("poll") {
        return None;
    }
    let bindings = legacy.get("binding_values").and_then(|b| b.as_array())?;
    let string_binding = |key: &str| -> Option<String> {
        bindings
            .iter()
            .find(|b| b.get("key").and_then(|k| k.as_str()) == Some(key))
            .and_then(|b| b.pointer("/value/string_value"))
            .and_then(|v| v.as_str())
            .map(str::to_string)
    };

    let mut options = Vec::new();
    for i in 1..=4 {
        let label = match string_binding(&format!("choice{}_label", i)) {
            Some(label) => label,
            None => break,
        };
        let votes = string_binding(&format!("choice{}_count", i)).and_then(|c| c.parse().ok());
        options.push(PollOption { label, votes });
    }
    if options.is_empty() {
        return None;
    }

    let counts_are_final = bindings
        .iter()
        .find(|b| b.get("key").and_then(|k| k.as_str()) == Some("counts_are_final"))
        .and_then(|b| b.pointer("/value/boolean_value"))
        .and_then(|v| v.as_bool());

    Some(Poll {
        id: opt_str(card, "rest_id").or_else(|| opt_str(legacy, "url")),
        options,
        end_datetime: string_binding("end_datetime_utc")
            .as_deref()
            .and_then(parse_rfc3339),
        duration_minutes: string_binding("duration_minutes").and_then(|d| d.parse().ok()),
        voting_status: counts_are_final.map(|done| {
            if done {
                "closed".to_string()
            } else {
                "open".to_string()
            }
        }),
    })
}

/// Normalizes a `UserByScreenName` response into a [`Profile`].
pub(crate) fn profile_from_graphql(payload: &Value) -> Result<Profile, ClientError> {
    let result = payload
        .pointer("/data/user/result")
        .ok_or_else(|| ClientError::NotFound("no user in response".to_string()))?;
    let legacy = result
        .get("legacy")
        .ok_or_else(|| ClientError::NotFound("user result carries no legacy data".to_string()))?;

    Ok(Profile {
        id: opt_str(result, "rest_id").unwrap_or_default(),
        username: opt_str(legacy, "screen_name").unwrap_or_default(),
        name: opt_str(legacy, "name").unwrap_or_default(),
        biography: opt_str(legacy, "description").filter(|d| !d.is_empty()),
        verified: legacy
            .get("verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        is_blue_verified: result
            .get("is_blue_verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        followers_count: metric(legacy.get("followers_count")),
        following_count: metric(legacy.get("friends_count")),
        tweets_count: metric(legacy.get("statuses_count")),
        avatar: opt_str(legacy, "profile_image_url_https"),
        banner: opt_str(legacy, "profile_banner_url"),
        location: opt_str(legacy, "location").filter(|l| !l.is_empty()),
        website: legacy
            .pointer("/entities/url/urls")
            .and_then(|u| u.as_array())
            .and_then(|u| u.first())
            .and_then(|u| opt_str(u, "expanded_url"))
            .or_else(|| opt_str(legacy, "url")),
        joined: opt_str(legacy, "created_at")
            .as_deref()
            .and_then(parse_legacy_time),
    })
}

/// Walks a `SearchTimeline` response into tweets plus the bottom cursor.
///
/// The cursor comes from a sentinel entry in the result stream; when no
/// sentinel is present there are no further pages.
pub(crate) fn search_page_from_graphql(payload: &Value) -> Result<SearchPage, ClientError> {
    let instructions = payload
        .pointer("/data/search_by_raw_query/search_timeline/timeline/instructions")
        .and_then(|i| i.as_array())
        .ok_or_else(|| ClientError::NotFound("no search timeline in response".to_string()))?;

    let mut page = SearchPage::default();
    for instruction in instructions {
        if let Some(entries) = instruction.get("entries").and_then(|e| e.as_array()) {
            for entry in entries {
                collect_timeline_entry(entry, &mut page, false);
            }
        }
        // Pinned and replaced entries arrive as single-entry instructions.
        if let Some(entry) = instruction.get("entry") {
            let pinned = instruction.get("type").and_then(|t| t.as_str())
                == Some("TimelinePinEntry");
            collect_timeline_entry(entry, &mut page, pinned);
        }
    }
    Ok(page)
}

fn collect_timeline_entry(entry: &Value, page: &mut SearchPage, pinned: bool) {
    let entry_id = entry.get("entryId").and_then(|id| id.as_str()).unwrap_or("");
    if entry_id.starts_with("tweet-") {
        if let Some(result) = entry.pointer("/content/itemContent/tweet_results/result") {
            match parse_tweet_result(result, 0) {
                Ok(mut tweet) => {
                    tweet.is_pin = pinned;
                    page.tweets.push(tweet);
                }
                Err(e) => warn!("Skipping unparseable timeline entry {}: {}", entry_id, e),
            }
        }
    } else if entry_id.starts_with("cursor-bottom") {
        page.next_cursor = entry
            .pointer("/content/value")
            .or_else(|| entry.pointer("/content/itemContent/value"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
    }
}

/// Normalizes an official v2 tweet payload (`data` plus `includes`).
pub(crate) fn tweet_from_v2(payload: &Value) -> Result<Tweet, ClientError> {
    let data = payload
        .get("data")
        .ok_or_else(|| ClientError::NotFound("no tweet data in response".to_string()))?;
    let includes = payload.get("includes");
    parse_v2_tweet(data, includes, 0)
}

fn parse_v2_tweet(data: &Value, includes: Option<&Value>, depth: u8) -> Result<Tweet, ClientError> {
    let mut tweet = Tweet::default();
    tweet.id = opt_str(data, "id")
        .ok_or_else(|| ClientError::NotFound("tweet data carries no id".to_string()))?;
    tweet.text = opt_str(data, "text").unwrap_or_default();
    tweet.user_id = opt_str(data, "author_id").unwrap_or_default();
    tweet.conversation_id = opt_str(data, "conversation_id");
    tweet.created_at = opt_str(data, "created_at").as_deref().and_then(parse_rfc3339);
    tweet.sensitive_content = data
        .get("possibly_sensitive")
        .and_then(|s| s.as_bool())
        .unwrap_or(false);

    if let Some(metrics) = data.get("public_metrics") {
        tweet.likes = metric(metrics.get("like_count"));
        tweet.retweets = metric(metrics.get("retweet_count"));
        tweet.replies = metric(metrics.get("reply_count"));
        tweet.views = metric(metrics.get("impression_count"));
        tweet.bookmark_count = metric(metrics.get("bookmark_count"));
    }

    if let Some(entities) = data.get("entities") {
        tweet.hashtags = collect_strs(entities.get("hashtags"), "tag");
        tweet.urls = collect_strs(entities.get("urls"), "expanded_url");
        tweet.mentions = collect_strs(entities.get("mentions"), "username");
    }

    if let Some(user) = lookup_include(includes, "users", "id", &tweet.user_id) {
        tweet.username = opt_str(user, "username").unwrap_or_default();
        tweet.name = opt_str(user, "name").unwrap_or_default();
    }

    if let Some(keys) = data.pointer("/attachments/media_keys").and_then(|k| k.as_array()) {
        for key in keys.iter().filter_map(|k| k.as_str()) {
            if let Some(media) = lookup_include(includes, "media", "media_key", key) {
                attach_v2_media(&mut tweet, media, key);
            }
        }
    }

    if let Some(referenced) = data.get("referenced_tweets").and_then(|r| r.as_array()) {
        for reference in referenced {
            let kind = reference.get("type").and_then(|t| t.as_str()).unwrap_or("");
            let id = opt_str(reference, "id").unwrap_or_default();
            match kind {
                "replied_to" => {
                    tweet.is_reply = true;
                    tweet.in_reply_to_status_id = Some(id);
                }
                "quoted" => {
                    tweet.is_quoted = true;
                    tweet.quoted_status_id = Some(id.clone());
                    if depth < MAX_NESTING_DEPTH {
                        if let Some(nested) = lookup_include(includes, "tweets", "id", &id) {
                            if let Ok(parsed) = parse_v2_tweet(nested, includes, depth + 1) {
                                tweet.quoted_tweet = Some(Box::new(parsed));
                            }
                        }
                    }
                }
                "retweeted" => {
                    tweet.is_retweet = true;
                    tweet.retweeted_status_id = Some(id.clone());
                    if depth < MAX_NESTING_DEPTH {
                        if let Some(nested) = lookup_include(includes, "tweets", "id", &id) {
                            if let Ok(parsed) = parse_v2_tweet(nested, includes, depth + 1) {
                                tweet.retweeted_tweet = Some(Box::new(parsed));
                            }
                        }
                    }
                }
                _ => {}
            }
        }
    }

    Ok(tweet)
}

fn attach_v2_media(tweet: &mut Tweet, media: &Value, key: &str) {
    match media.get("type").and_then(|t| t.as_str()) {
        Some("photo") => tweet.photos.push(Photo {
            id: key.to_string(),
            url: opt_str(media, "url").unwrap_or_default(),
            alt_text: opt_str(media, "alt_text"),
        }),
        Some("video") | Some("animated_gif") => {
            let url = media
                .get("variants")
                .and_then(|v| v.as_array())
                .and_then(|variants| {
                    variants
                        .iter()
                        .filter(|v| {
                            v.get("content_type").and_then(|c| c.as_str()) == Some("video/mp4")
                        })
                        .max_by_key(|v| v.get("bit_rate").and_then(|b| b.as_u64()).unwrap_or(0))
                        .and_then(|v| opt_str(v, "url"))
                });
            if let Some(url) = url {
                tweet.videos.push(Video {
                    id: key.to_string(),
                    url: Some(url),
                    preview: opt_str(media, "preview_image_url").unwrap_or_default(),
                });
            }
        }
        _ => {}
    }
}

/// Normalizes an official v2 recent-search response into a [`SearchPage`].
/// The cursor is the `meta.next_token` field when present.
pub(crate) fn search_page_from_v2(payload: &Value) -> Result<SearchPage, ClientError> {
    let includes = payload.get("includes");
    let mut page = SearchPage::default();
    if let Some(items) = payload.get("data").and_then(|d| d.as_array()) {
        for item in items {
            match parse_v2_tweet(item, includes, 0) {
                Ok(tweet) => page.tweets.push(tweet),
                Err(e) => warn!("Skipping unparseable search result: {}", e),
            }
        }
    }
    page.next_cursor = payload
        .pointer("/meta/next_token")
        .and_then(|t| t.as_str())
        .map(str::to_string);
    Ok(page)
}

/// Normalizes an official v2 user payload into a [`Profile`].
pub(crate) fn profile_from_v2(payload: &Value) -> Result<Profile, ClientError> {
    let data = payload
        .get("data")
        .ok_or_else(|| ClientError::NotFound("no user data in response".to_string()))?;
    let metrics = data.get("public_metrics");
    Ok(Profile {
        id: opt_str(data, "id").unwrap_or_default(),
        username: opt_str(data, "username").unwrap_or_default(),
        name: opt_str(data, "name").unwrap_or_default(),
        biography: opt_str(data, "description").filter(|d| !d.is_empty()),
        verified: data
            .get("verified")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
        is_blue_verified: false,
        followers_count: metric(metrics.and_then(|m| m.get("followers_count"))),
        following_count: metric(metrics.and_then(|m| m.get("following_count"))),
        tweets_count: metric(metrics.and_then(|m| m.get("tweet_count"))),
        avatar: opt_str(data, "profile_image_url"),
        banner: None,
        location: opt_str(data, "location").filter(|l| !l.is_empty()),
        website: opt_str(data, "url").filter(|u| !u.is_empty()),
        joined: opt_str(data, "created_at").as_deref().and_then(parse_rfc3339),
    })
}

/// Finds an `includes` entry whose `key_field` equals `value`.
fn lookup_include<'a>(
    includes: Option<&'a Value>,
    section: &str,
    key_field: &str,
    value: &str,
) -> Option<&'a Value> {
    includes?
        .get(section)?
        .as_array()?
        .iter()
        .find(|item| item.get(key_field).and_then(|k| k.as_str()) == Some(value))
}

/// Coerces a metric that may arrive as a number or a numeric string.
/// Anything missing or unparseable counts as zero.
fn metric(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.parse().unwrap_or(0),
        _ => 0,
    }
}

fn opt_str(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

fn collect_strs(list: Option<&Value>, key: &str) -> Vec<String> {
    list.and_then(|l| l.as_array())
        .map(|items| items.iter().filter_map(|item| opt_str(item, key)).collect())
        .unwrap_or_default()
}

fn parse_legacy_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_str(raw, LEGACY_TIME_FORMAT) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Failed to parse created_at '{}': {}", raw, e);
            None
        }
    }
}

fn parse_rfc3339(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("Failed to parse timestamp '{}': {}", raw, e);
            None
        }
    }
}
