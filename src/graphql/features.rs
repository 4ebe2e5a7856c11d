//! Feature-flag maps for the GraphQL operations.
//!
//! The service validates the shape of the flag set on every call, not just
//! individual values, so each operation must send its full map including
//! flags irrelevant to it. Related operations share a common base with
//! targeted overrides; the maps are composed here rather than rebuilt ad
//! hoc at call sites.

use serde_json::{Map, Value};

/// Flags common to every operation.
fn base() -> Map<String, Value> {
    let mut map = Map::new();
    for (flag, enabled) in [
        ("responsive_web_graphql_exclude_directive_enabled", true),
        ("verified_phone_label_enabled", false),
        ("creator_subscriptions_tweet_preview_api_enabled", true),
        ("responsive_web_graphql_timeline_navigation_enabled", true),
        (
            "responsive_web_graphql_skip_user_profile_image_extensions_enabled",
            false,
        ),
        ("communities_web_enable_tweet_community_results_fetch", true),
        ("c9s_tweet_anatomy_moderator_badge_enabled", true),
        ("tweetypie_unmention_optimization_enabled", true),
        ("responsive_web_edit_tweet_api_enabled", true),
        (
            "graphql_is_translatable_rweb_tweet_is_translatable_enabled",
            true,
        ),
        ("view_counts_everywhere_api_enabled", true),
        ("longform_notetweets_consumption_enabled", true),
        ("responsive_web_twitter_article_tweet_consumption_enabled", true),
        ("tweet_awards_web_tipping_enabled", false),
        ("freedom_of_speech_not_reach_fetch_enabled", true),
        ("standardized_nudges_misinfo", true),
        (
            "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled",
            true,
        ),
        ("rweb_video_timestamps_enabled", true),
        ("longform_notetweets_rich_text_read_enabled", true),
        ("longform_notetweets_inline_media_enabled", true),
        ("responsive_web_enhance_cards_enabled", false),
    ] {
        map.insert(flag.to_string(), Value::Bool(enabled));
    }
    map
}

/// Composes the base map with per-operation overrides and additions.
fn with_overrides(overrides: &[(&str, bool)]) -> Value {
    let mut map = base();
    for (flag, enabled) in overrides {
        map.insert(flag.to_string(), Value::Bool(*enabled));
    }
    Value::Object(map)
}

/// Flags for the standard `CreateTweet` operation.
pub(crate) fn create_tweet() -> Value {
    with_overrides(&[
        ("interactive_text_enabled", true),
        ("vibe_api_enabled", false),
        ("articles_preview_enabled", true),
    ])
}

/// Flags for the long-form `CreateNoteTweet` operation.
pub(crate) fn create_note_tweet() -> Value {
    with_overrides(&[
        ("interactive_text_enabled", true),
        ("vibe_api_enabled", false),
        ("articles_preview_enabled", true),
        ("subscriptions_verification_info_enabled", true),
    ])
}

/// Flags for `TweetResultByRestId`.
pub(crate) fn tweet_result_by_rest_id() -> Value {
    with_overrides(&[("creator_subscriptions_quote_tweet_preview_enabled", false)])
}

/// Flags for `SearchTimeline`.
pub(crate) fn search_timeline() -> Value {
    with_overrides(&[
        ("rweb_lists_timeline_redesign_enabled", true),
        ("blue_business_profile_image_shape_enabled", false),
    ])
}

/// Flags for `UserByScreenName`.
pub(crate) fn user_by_screen_name() -> Value {
    with_overrides(&[
        ("hidden_profile_likes_enabled", false),
        ("hidden_profile_subscriptions_enabled", false),
        ("subscriptions_verification_info_is_identity_verified_enabled", false),
        ("subscriptions_verification_info_verified_since_enabled", true),
        ("highlights_tweets_tab_ui_enabled", true),
    ])
}
