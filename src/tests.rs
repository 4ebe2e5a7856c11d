//! # Tests Module
//!
//! Unit tests for header assembly, creation-path routing, and the response
//! normalizer, plus transport-level tests that run the executor, the legacy
//! form endpoints, and the chunked upload protocol against a local mock
//! server.

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::auth::{assemble_cookie_headers, AuthStrategy, CookieAuth, CookieStore};
use crate::config::{AppCredentials, CookieRecord, Credentials};
use crate::error::{ClientError, UploadPhase};
use crate::graphql::tweets::uses_long_form;
use crate::http::{Endpoints, Executor};
use crate::media;
use crate::normalize;
use crate::types::{PollRequest, SearchOptions, TweetOptions};
use crate::Client;

/// A complete session cookie set with all three critical cookies.
fn session_cookies() -> Vec<CookieRecord> {
    vec![
        CookieRecord::new("auth_token", "deadbeefcafe"),
        CookieRecord::new("ct0", "csrf-token-value"),
        CookieRecord::new("twid", "u%3D501"),
    ]
}

/// Endpoint table pointing every endpoint family at the mock server.
fn test_endpoints(base: &str) -> Endpoints {
    Endpoints {
        graphql_base: format!("{}/graphql", base),
        upload: format!("{}/upload.json", base),
        legacy_base: format!("{}/1.1", base),
        cards: format!("{}/cards/create.json", base),
        api_base: format!("{}/2", base),
        token: format!("{}/oauth2/token", base),
    }
}

fn graphql_client(server: &MockServer) -> Client {
    Client::from_cookies_with_endpoints(session_cookies(), test_endpoints(&server.uri())).unwrap()
}

fn test_executor(server: &MockServer) -> Executor {
    let auth = AuthStrategy::Cookie(CookieAuth::new(session_cookies()).unwrap());
    Executor::new(auth, test_endpoints(&server.uri())).unwrap()
}

/// A normalizable tweet result object as the GraphQL endpoints embed it.
fn tweet_result_fixture(id: &str, text: &str) -> Value {
    json!({
        "rest_id": id,
        "core": { "user_results": { "result": {
            "rest_id": "501",
            "legacy": { "screen_name": "wren", "name": "Wren" }
        }}},
        "views": { "count": "42" },
        "legacy": {
            "id_str": id,
            "full_text": text,
            "created_at": "Wed Oct 10 20:19:24 +0000 2018",
            "conversation_id_str": id,
            "favorite_count": 7,
            "retweet_count": "3",
            "reply_count": 1,
            "bookmark_count": 2,
            "user_id_str": "501",
            "entities": {
                "hashtags": [{ "text": "rust" }],
                "urls": [],
                "user_mentions": []
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Credential validation and header assembly
// ---------------------------------------------------------------------------

/// Construction must fail before any network call when any of the three
/// critical session cookies is missing.
#[test]
fn test_construction_requires_critical_cookies() {
    for missing in ["auth_token", "ct0", "twid"] {
        let records: Vec<CookieRecord> = session_cookies()
            .into_iter()
            .filter(|c| c.name != missing)
            .collect();
        let result = Client::from_cookies(records);
        match result {
            Err(ClientError::Configuration(message)) => {
                assert!(message.contains(missing), "message should name {}", missing)
            }
            other => panic!("expected configuration error, got {:?}", other.is_ok()),
        }
    }
    assert!(Client::from_cookies(session_cookies()).is_ok());
}

/// The CSRF header is present exactly when a `ct0` cookie exists.
#[test]
fn test_csrf_header_mirrors_csrf_cookie() {
    let store = CookieStore::new();
    store.set_cookies(&session_cookies());
    let headers = assemble_cookie_headers(&store);
    assert_eq!(
        headers.get("x-csrf-token").map(String::as_str),
        Some("csrf-token-value")
    );

    let no_csrf = CookieStore::new();
    no_csrf.set_cookies(&[CookieRecord::new("auth_token", "deadbeefcafe")]);
    let headers = assemble_cookie_headers(&no_csrf);
    assert!(headers.get("x-csrf-token").is_none());
    assert!(headers.contains_key("authorization"));
}

/// Cookies are replicated across every domain alias but appear once in the
/// assembled cookie header.
#[test]
fn test_cookie_header_lists_each_cookie_once() {
    let store = CookieStore::new();
    store.set_cookies(&session_cookies());
    let header = store.cookie_header();
    assert_eq!(header.matches("auth_token=").count(), 1);
    assert!(header.contains("ct0=csrf-token-value"));
    assert!(store.get("x.com", "auth_token").is_some());
    assert!(store.get(".twitter.com", "auth_token").is_some());
}

/// Secrets never appear in full in Debug output.
#[test]
fn test_debug_output_masks_secrets() {
    let record = CookieRecord::new("auth_token", "very-secret-session-token");
    let debug = format!("{:?}", record);
    assert!(!debug.contains("very-secret-session-token"));

    let creds = AppCredentials::new("consumer-key-value", "consumer-secret-value")
        .access_token("user-access-token-value");
    let debug = format!("{:?}", creds);
    assert!(!debug.contains("consumer-secret-value"));
    assert!(!debug.contains("user-access-token-value"));
}

/// Browser-style cookie strings parse into records.
#[test]
fn test_cookie_record_from_str() {
    let record: CookieRecord = "ct0=abc123; Domain=.twitter.com; Secure"
        .parse()
        .unwrap();
    assert_eq!(record.name, "ct0");
    assert_eq!(record.value, "abc123");
    assert_eq!(record.domain.as_deref(), Some(".twitter.com"));
    assert!(record.secure);

    let client = Client::from_cookie_string("auth_token=a; ct0=b; twid=u%3D1");
    assert!(client.is_ok());
    assert!(client.unwrap().is_authenticated());
}

/// Cookie credentials win over app credentials when both are configured in
/// the environment.
#[test]
fn test_credentials_from_env() {
    std::env::set_var(
        "BIRDWIRE_COOKIES",
        r#"[{"key": "auth_token", "value": "a"}, {"name": "ct0", "value": "b"}]"#,
    );
    match Credentials::from_env() {
        Ok(Credentials::Cookies(records)) => {
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].name, "auth_token");
        }
        other => panic!("expected cookie credentials, got {:?}", other),
    }
    std::env::remove_var("BIRDWIRE_COOKIES");
}

// ---------------------------------------------------------------------------
// Creation-path routing
// ---------------------------------------------------------------------------

/// Exactly 280 units routes to the standard path; 281 routes long-form.
#[test]
fn test_long_form_routing_boundary() {
    let at_limit: String = "a".repeat(280);
    let over_limit: String = "a".repeat(281);
    assert!(!uses_long_form(&at_limit));
    assert!(uses_long_form(&over_limit));
    assert!(!uses_long_form(""));
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// The normalizer recovers a tweet from the direct-creation result shape.
#[test]
fn test_normalizer_direct_creation_shape() {
    let payload = json!({ "data": { "create_tweet": { "tweet_results": {
        "result": tweet_result_fixture("900", "hello #rust")
    }}}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.id, "900");
    assert_eq!(tweet.text, "hello #rust");
    assert_eq!(tweet.username, "wren");
    assert_eq!(tweet.likes, 7);
    // String-typed metrics are coerced to numbers.
    assert_eq!(tweet.retweets, 3);
    assert_eq!(tweet.views, 42);
    assert_eq!(tweet.hashtags, vec!["rust".to_string()]);
    assert!(tweet.created_at.is_some());
}

/// The normalizer recovers a tweet from the detail-view result shape.
#[test]
fn test_normalizer_detail_view_shape() {
    let payload = json!({ "data": { "tweetResult": {
        "result": tweet_result_fixture("901", "detail view")
    }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.id, "901");
    assert_eq!(tweet.text, "detail view");
}

/// The normalizer recovers a tweet from the nested timeline-entry shape.
#[test]
fn test_normalizer_timeline_entry_shape() {
    let payload = json!({ "data": { "threaded_conversation_with_injections_v2": {
        "instructions": [{
            "type": "TimelineAddEntries",
            "entries": [
                { "entryId": "who-to-follow-1", "content": {} },
                { "entryId": "tweet-902", "content": { "itemContent": {
                    "tweet_results": { "result": tweet_result_fixture("902", "from the timeline") }
                }}}
            ]
        }]
    }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.id, "902");
}

/// When no known shape matches, the normalizer raises a not-found error.
#[test]
fn test_normalizer_unknown_shape_is_not_found() {
    let payload = json!({ "data": { "something_else": {} } });
    assert!(matches!(
        normalize::tweet_from_graphql(&payload),
        Err(ClientError::NotFound(_))
    ));
}

/// Missing metrics default to zero rather than failing or staying null.
#[test]
fn test_normalizer_missing_metrics_default_to_zero() {
    let payload = json!({ "data": { "tweetResult": { "result": {
        "rest_id": "903",
        "legacy": { "id_str": "903", "full_text": "bare" }
    }}}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.likes, 0);
    assert_eq!(tweet.views, 0);
    assert_eq!(tweet.bookmark_count, 0);
}

/// The long-form text override takes precedence over the standard field.
#[test]
fn test_normalizer_prefers_long_form_text() {
    let mut result = tweet_result_fixture("904", "truncated…");
    result["note_tweet"] = json!({ "note_tweet_results": { "result": {
        "text": "the full long-form text"
    }}});
    let payload = json!({ "data": { "tweetResult": { "result": result }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.text, "the full long-form text");
}

/// Video selection picks the highest-bitrate MP4 variant; entries with only
/// non-MP4 variants yield no video descriptor.
#[test]
fn test_normalizer_video_variant_selection() {
    let mut result = tweet_result_fixture("905", "watch this");
    result["legacy"]["extended_entities"] = json!({ "media": [{
        "id_str": "m1",
        "type": "video",
        "media_url_https": "https://pbs.example/preview.jpg",
        "video_info": { "variants": [
            { "bitrate": 500000, "content_type": "video/mp4", "url": "https://video.example/low.mp4" },
            { "bitrate": 1200000, "content_type": "video/mp4", "url": "https://video.example/high.mp4" },
            { "content_type": "application/x-mpegURL", "url": "https://video.example/playlist.m3u8" }
        ]}
    }]});
    let payload = json!({ "data": { "tweetResult": { "result": result }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.videos.len(), 1);
    assert_eq!(
        tweet.videos[0].url.as_deref(),
        Some("https://video.example/high.mp4")
    );
    assert_eq!(tweet.videos[0].preview, "https://pbs.example/preview.jpg");

    let mut result = tweet_result_fixture("906", "stream only");
    result["legacy"]["extended_entities"] = json!({ "media": [{
        "id_str": "m2",
        "type": "video",
        "media_url_https": "https://pbs.example/preview.jpg",
        "video_info": { "variants": [
            { "content_type": "application/x-mpegURL", "url": "https://video.example/playlist.m3u8" }
        ]}
    }]});
    let payload = json!({ "data": { "tweetResult": { "result": result }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert!(tweet.videos.is_empty());
}

/// Photos and videos are split by the type discriminator.
#[test]
fn test_normalizer_splits_photos_and_videos() {
    let mut result = tweet_result_fixture("907", "mixed media");
    result["legacy"]["extended_entities"] = json!({ "media": [
        {
            "id_str": "p1",
            "type": "photo",
            "media_url_https": "https://pbs.example/photo.jpg",
            "ext_alt_text": "a bird"
        },
        {
            "id_str": "v1",
            "type": "animated_gif",
            "media_url_https": "https://pbs.example/gif-preview.jpg",
            "video_info": { "variants": [
                { "bitrate": 0, "content_type": "video/mp4", "url": "https://video.example/clip.mp4" }
            ]}
        }
    ]});
    let payload = json!({ "data": { "tweetResult": { "result": result }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert_eq!(tweet.photos.len(), 1);
    assert_eq!(tweet.photos[0].alt_text.as_deref(), Some("a bird"));
    assert_eq!(tweet.videos.len(), 1);
}

/// A fixture embedding a quoted tweet normalizes with `is_quoted` set and a
/// nested quoted tweet equal to the fixture's independently normalized form.
#[test]
fn test_normalizer_quoted_tweet() {
    let inner = tweet_result_fixture("908", "the quoted original");
    let mut outer = tweet_result_fixture("909", "my commentary");
    outer["legacy"]["is_quote_status"] = json!(true);
    outer["legacy"]["quoted_status_id_str"] = json!("908");
    outer["quoted_status_result"] = json!({ "result": inner });

    let payload = json!({ "data": { "tweetResult": { "result": outer }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert!(tweet.is_quoted);
    assert_eq!(tweet.quoted_status_id.as_deref(), Some("908"));

    let independently = normalize::parse_tweet_result(&inner, 0).unwrap();
    let nested = tweet.quoted_tweet.expect("quoted tweet should be embedded");
    assert_eq!(
        serde_json::to_value(&*nested).unwrap(),
        serde_json::to_value(&independently).unwrap()
    );
}

/// Retweets embed the original and set the retweet flag.
#[test]
fn test_normalizer_retweet() {
    let original = tweet_result_fixture("910", "the original");
    let mut wrapper = tweet_result_fixture("911", "RT @wren: the original");
    wrapper["legacy"]["retweeted_status_result"] = json!({ "result": original });
    let payload = json!({ "data": { "tweetResult": { "result": wrapper }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    assert!(tweet.is_retweet);
    assert_eq!(tweet.retweeted_status_id.as_deref(), Some("910"));
    assert_eq!(tweet.retweeted_tweet.unwrap().text, "the original");
}

/// Poll cards normalize into options with labels and optional vote counts.
#[test]
fn test_normalizer_poll_card() {
    let mut result = tweet_result_fixture("912", "which one?");
    result["card"] = json!({
        "rest_id": "card://4242",
        "legacy": {
            "name": "poll2choice_text_only",
            "binding_values": [
                { "key": "choice1_label", "value": { "string_value": "tabs" } },
                { "key": "choice1_count", "value": { "string_value": "17" } },
                { "key": "choice2_label", "value": { "string_value": "spaces" } },
                { "key": "choice2_count", "value": { "string_value": "23" } },
                { "key": "end_datetime_utc", "value": { "string_value": "2024-05-01T12:00:00Z" } },
                { "key": "duration_minutes", "value": { "string_value": "1440" } },
                { "key": "counts_are_final", "value": { "boolean_value": false } }
            ]
        }
    });
    let payload = json!({ "data": { "tweetResult": { "result": result }}});
    let tweet = normalize::tweet_from_graphql(&payload).unwrap();
    let poll = tweet.poll.expect("card should normalize to a poll");
    assert_eq!(poll.options.len(), 2);
    assert_eq!(poll.options[0].label, "tabs");
    assert_eq!(poll.options[1].votes, Some(23));
    assert_eq!(poll.duration_minutes, Some(1440));
    assert_eq!(poll.voting_status.as_deref(), Some("open"));
}

/// The search walker surfaces the cursor sentinel value; without a sentinel
/// there is no next cursor.
#[test]
fn test_search_cursor_sentinel() {
    let with_sentinel = json!({ "data": { "search_by_raw_query": { "search_timeline": { "timeline": {
        "instructions": [{
            "type": "TimelineAddEntries",
            "entries": [
                { "entryId": "tweet-913", "content": { "itemContent": {
                    "tweet_results": { "result": tweet_result_fixture("913", "match") }
                }}},
                { "entryId": "cursor-bottom-0", "content": { "value": "CURSOR123" } }
            ]
        }]
    }}}}});
    let page = normalize::search_page_from_graphql(&with_sentinel).unwrap();
    assert_eq!(page.tweets.len(), 1);
    assert_eq!(page.next_cursor.as_deref(), Some("CURSOR123"));

    let without_sentinel = json!({ "data": { "search_by_raw_query": { "search_timeline": { "timeline": {
        "instructions": [{
            "type": "TimelineAddEntries",
            "entries": [
                { "entryId": "tweet-914", "content": { "itemContent": {
                    "tweet_results": { "result": tweet_result_fixture("914", "last page") }
                }}}
            ]
        }]
    }}}}});
    let page = normalize::search_page_from_graphql(&without_sentinel).unwrap();
    assert!(page.next_cursor.is_none());
}

/// Profiles normalize from the user-by-screen-name shape.
#[test]
fn test_normalizer_profile() {
    let payload = json!({ "data": { "user": { "result": {
        "rest_id": "123",
        "is_blue_verified": true,
        "legacy": {
            "screen_name": "alice",
            "name": "Alice",
            "description": "systems tinkerer",
            "verified": false,
            "followers_count": 10,
            "friends_count": 5,
            "statuses_count": 99,
            "profile_image_url_https": "https://pbs.example/avatar.jpg",
            "location": "",
            "created_at": "Mon Jan 02 08:00:00 +0000 2017",
            "entities": { "url": { "urls": [{ "expanded_url": "https://alice.example" }] } }
        }
    }}}});
    let profile = normalize::profile_from_graphql(&payload).unwrap();
    assert_eq!(profile.id, "123");
    assert_eq!(profile.username, "alice");
    assert!(profile.is_blue_verified);
    assert!(!profile.verified);
    assert_eq!(profile.followers_count, 10);
    assert_eq!(profile.website.as_deref(), Some("https://alice.example"));
    assert!(profile.location.is_none());
    assert!(profile.joined.is_some());
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Non-2xx responses surface the first nested server error message along
/// with the status and raw payload.
#[tokio::test]
async fn test_transport_error_surfaces_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/graphql/[^/]+/FavoriteTweet$"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "errors": [{ "message": "Bad guest token", "code": 239 }]
        })))
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    match client.like_tweet("1").await {
        Err(ClientError::Transport {
            status,
            message,
            body,
        }) => {
            assert_eq!(status, 403);
            assert_eq!(message, "Bad guest token");
            assert!(body.unwrap().contains("239"));
        }
        other => panic!("expected transport error, got ok={}", other.is_ok()),
    }
}

/// A non-JSON error body is carried verbatim with a generic message.
#[tokio::test]
async fn test_transport_error_with_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/graphql/[^/]+/CreateRetweet$"))
        .respond_with(ResponseTemplate::new(503).set_body_string("over capacity"))
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    match client.retweet("1").await {
        Err(ClientError::Transport { status, body, .. }) => {
            assert_eq!(status, 503);
            assert_eq!(body.as_deref(), Some("over capacity"));
        }
        other => panic!("expected transport error, got ok={}", other.is_ok()),
    }
}

/// The follow operation resolves the username to an id, then posts
/// form-encoded to the legacy endpoint with the CSRF header attached.
#[tokio::test]
async fn test_follow_uses_legacy_form_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/graphql/[^/]+/UserByScreenName$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "user": { "result": {
                "rest_id": "123",
                "legacy": { "screen_name": "alice", "name": "Alice" }
            }}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/1.1/friendships/create.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 123 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    client.follow("alice").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let follow_request = requests
        .iter()
        .find(|r| r.url.path() == "/1.1/friendships/create.json")
        .expect("follow request should be sent");
    let body = String::from_utf8_lossy(&follow_request.body);
    assert!(body.contains("user_id=123"));
    assert_eq!(
        follow_request
            .headers
            .get("content-type")
            .map(|v| v.to_str().unwrap()),
        Some("application/x-www-form-urlencoded")
    );
    assert_eq!(
        follow_request
            .headers
            .get("x-csrf-token")
            .map(|v| v.to_str().unwrap()),
        Some("csrf-token-value")
    );
}

/// Long text routes to the long-form creation operation.
#[tokio::test]
async fn test_send_tweet_routes_long_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/graphql/[^/]+/CreateNoteTweet$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "notetweet_create": { "tweet_results": {
                "result": tweet_result_fixture("920", "long")
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    let text = "a".repeat(281);
    let tweet = client.send_tweet(&text, &TweetOptions::default()).await.unwrap();
    assert_eq!(tweet.id, "920");
}

/// A requested poll becomes a card first, and its opaque reference is
/// injected into the creation call.
#[tokio::test]
async fn test_poll_flows_through_card_creation() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/cards/create.json"))
        .and(body_string_contains("poll2choice_text_only"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "card_uri": "card://999" })),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/graphql/[^/]+/CreateTweet$"))
        .and(body_string_contains("card://999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "create_tweet": { "tweet_results": {
                "result": tweet_result_fixture("921", "which one?")
            }}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    let options = TweetOptions {
        poll: Some(PollRequest {
            options: vec!["tabs".to_string(), "spaces".to_string()],
            duration_minutes: 1440,
        }),
        ..TweetOptions::default()
    };
    let tweet = client.send_tweet("which one?", &options).await.unwrap();
    assert_eq!(tweet.id, "921");
}

/// Polls with fewer than two or more than four choices are rejected before
/// any network call.
#[tokio::test]
async fn test_poll_choice_count_is_validated() {
    let server = MockServer::start().await;
    let client = graphql_client(&server);
    let options = TweetOptions {
        poll: Some(PollRequest {
            options: vec!["only one".to_string()],
            duration_minutes: 60,
        }),
        ..TweetOptions::default()
    };
    assert!(matches!(
        client.send_tweet("?", &options).await,
        Err(ClientError::Configuration(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// Search requests decode a timeline page end to end.
#[tokio::test]
async fn test_search_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/graphql/[^/]+/SearchTimeline$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "search_by_raw_query": { "search_timeline": { "timeline": {
                "instructions": [{
                    "type": "TimelineAddEntries",
                    "entries": [
                        { "entryId": "tweet-930", "content": { "itemContent": {
                            "tweet_results": { "result": tweet_result_fixture("930", "found") }
                        }}},
                        { "entryId": "cursor-bottom-0", "content": { "value": "NEXT" } }
                    ]
                }]
            }}}}
        })))
        .mount(&server)
        .await;

    let client = graphql_client(&server);
    let page = client
        .search_tweets("found", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(page.tweets.len(), 1);
    assert_eq!(page.next_cursor.as_deref(), Some("NEXT"));
}

// ---------------------------------------------------------------------------
// Media upload protocol
// ---------------------------------------------------------------------------

async fn mount_upload_init(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=INIT"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "555" })),
        )
        .mount(server)
        .await;
}

async fn mount_upload_append(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("APPEND"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// APPEND segment indices are zero-based, strictly increasing, and
/// contiguous, and the phases arrive in protocol order.
#[tokio::test]
async fn test_chunked_upload_segments_are_contiguous() {
    let _ = env_logger::builder().is_test(true).try_init();
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    mount_upload_append(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "555" })),
        )
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let media_id = media::upload_chunked(&exec, b"0123456789", "video/mp4", 4)
        .await
        .unwrap();
    assert_eq!(media_id, "555");

    let requests = server.received_requests().await.unwrap();
    let append_bodies: Vec<String> = requests
        .iter()
        .filter(|r| {
            r.url.path() == "/upload.json"
                && String::from_utf8_lossy(&r.body).contains("APPEND")
        })
        .map(|r| String::from_utf8_lossy(&r.body).to_string())
        .collect();
    assert_eq!(append_bodies.len(), 3, "10 bytes in 4-byte chunks is 3 appends");
    for (index, body) in append_bodies.iter().enumerate() {
        assert!(
            body.contains(&format!("\r\n\r\n{}\r\n", index)),
            "append {} should carry segment_index {}",
            index,
            index
        );
    }

    // INIT must precede the first APPEND, FINALIZE must follow the last.
    let order: Vec<&str> = requests
        .iter()
        .map(|r| {
            let body = String::from_utf8_lossy(&r.body).to_string();
            if body.contains("command=INIT") {
                "init"
            } else if body.contains("APPEND") {
                "append"
            } else {
                "finalize"
            }
        })
        .collect();
    assert_eq!(order, vec!["init", "append", "append", "append", "finalize"]);
}

/// The STATUS poll terminates successfully on `succeeded`.
#[tokio::test]
async fn test_processing_poll_succeeds() {
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    mount_upload_append(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media_id_string": "555",
            "processing_info": { "state": "pending", "check_after_secs": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload.json"))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processing_info": { "state": "succeeded" }
        })))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let media_id = media::upload_chunked(&exec, b"0123456789", "video/mp4", 4)
        .await
        .unwrap();
    assert_eq!(media_id, "555");
}

/// The STATUS poll raises on `failed`.
#[tokio::test]
async fn test_processing_poll_raises_on_failure() {
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    mount_upload_append(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media_id_string": "555",
            "processing_info": { "state": "pending", "check_after_secs": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload.json"))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "processing_info": {
                "state": "failed",
                "error": { "message": "InvalidMedia" }
            }
        })))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    match media::upload_chunked(&exec, b"0123456789", "video/mp4", 4).await {
        Err(ClientError::Upload { phase, message, .. }) => {
            assert_eq!(phase, UploadPhase::Status);
            assert_eq!(message, "InvalidMedia");
        }
        other => panic!("expected upload error, got ok={}", other.is_ok()),
    }
}

/// A STATUS response with no processing state means the media is already
/// usable; the loop terminates immediately.
#[tokio::test]
async fn test_processing_poll_treats_missing_state_as_ready() {
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    mount_upload_append(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "media_id_string": "555",
            "processing_info": { "state": "pending", "check_after_secs": 0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload.json"))
        .and(query_param("command", "STATUS"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    assert!(media::upload_chunked(&exec, b"0123456789", "video/mp4", 4)
        .await
        .is_ok());
}

/// A FINALIZE response without processing info skips the STATUS poll
/// entirely.
#[tokio::test]
async fn test_finalize_without_processing_info_skips_poll() {
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    mount_upload_append(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("command=FINALIZE"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "media_id_string": "555" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/upload.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    assert!(media::upload_chunked(&exec, b"0123456789", "video/mp4", 4)
        .await
        .is_ok());
}

/// An APPEND rejection abandons the upload with an append-phase error.
#[tokio::test]
async fn test_append_rejection_aborts_upload() {
    let server = MockServer::start().await;
    mount_upload_init(&server).await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .and(body_string_contains("APPEND"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{ "message": "Segment size out of range" }]
        })))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    match media::upload_chunked(&exec, b"0123456789", "video/mp4", 4).await {
        Err(ClientError::Upload { phase, status, .. }) => {
            assert_eq!(phase, UploadPhase::Append);
            assert_eq!(status, Some(400));
        }
        other => panic!("expected upload error, got ok={}", other.is_ok()),
    }
    // No FINALIZE after a failed APPEND.
    let requests = server.received_requests().await.unwrap();
    assert!(requests
        .iter()
        .all(|r| !String::from_utf8_lossy(&r.body).contains("command=FINALIZE")));
}

/// An image upload response without a media id fails the upload.
#[tokio::test]
async fn test_image_upload_requires_media_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let exec = test_executor(&server);
    let attachment = crate::types::MediaAttachment {
        data: vec![0xFF, 0xD8, 0xFF],
        media_type: "image/jpeg".to_string(),
    };
    assert!(matches!(
        media::upload_media(&exec, &attachment).await,
        Err(ClientError::Upload {
            phase: UploadPhase::Init,
            ..
        })
    ));
}

// ---------------------------------------------------------------------------
// Official API strategy
// ---------------------------------------------------------------------------

/// The app strategy lazily fetches an app-only bearer once and reuses it.
#[tokio::test]
async fn test_app_bearer_fetched_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token_type": "bearer",
            "access_token": "APPTOKEN"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2/users/by/username/alice"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "id": "123",
                "username": "alice",
                "name": "Alice",
                "public_metrics": { "followers_count": 10, "following_count": 5, "tweet_count": 99 },
                "created_at": "2017-01-02T08:00:00.000Z"
            }
        })))
        .mount(&server)
        .await;

    let client = Client::from_app_credentials_with_endpoints(
        AppCredentials::new("key", "secret"),
        test_endpoints(&server.uri()),
    )
    .unwrap();

    let profile = client.get_profile("alice").await.unwrap();
    assert_eq!(profile.id, "123");
    assert_eq!(profile.followers_count, 10);
    // Second call reuses the cached bearer; the token mock expects one hit.
    client.get_profile("alice").await.unwrap();

    let requests = server.received_requests().await.unwrap();
    let user_request = requests
        .iter()
        .find(|r| r.url.path() == "/2/users/by/username/alice")
        .unwrap();
    assert_eq!(
        user_request
            .headers
            .get("authorization")
            .map(|v| v.to_str().unwrap()),
        Some("Bearer APPTOKEN")
    );
}

/// Media attachments are rejected on the app strategy before any request.
#[tokio::test]
async fn test_app_strategy_rejects_media() {
    let server = MockServer::start().await;
    let client = Client::from_app_credentials_with_endpoints(
        AppCredentials::new("key", "secret").access_token("usertoken"),
        test_endpoints(&server.uri()),
    )
    .unwrap();
    let options = TweetOptions {
        media: vec![crate::types::MediaAttachment {
            data: vec![1, 2, 3],
            media_type: "image/png".to_string(),
        }],
        ..TweetOptions::default()
    };
    assert!(matches!(
        client.send_tweet("hi", &options).await,
        Err(ClientError::Configuration(_))
    ));
    assert!(server.received_requests().await.unwrap().is_empty());
}

/// v2 search pages normalize with author expansion and the next token.
#[tokio::test]
async fn test_v2_search_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/2/tweets/search/recent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{
                "id": "940",
                "text": "hello",
                "author_id": "123",
                "public_metrics": { "like_count": 4, "retweet_count": 1, "reply_count": 0 }
            }],
            "includes": { "users": [{ "id": "123", "username": "alice", "name": "Alice" }] },
            "meta": { "next_token": "NEXT456", "result_count": 1 }
        })))
        .mount(&server)
        .await;

    let client = Client::from_app_credentials_with_endpoints(
        AppCredentials::new("key", "secret").access_token("usertoken"),
        test_endpoints(&server.uri()),
    )
    .unwrap();
    let page = client
        .search_tweets("hello", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(page.tweets.len(), 1);
    assert_eq!(page.tweets[0].username, "alice");
    assert_eq!(page.tweets[0].likes, 4);
    assert_eq!(page.next_cursor.as_deref(), Some("NEXT456"));
}
