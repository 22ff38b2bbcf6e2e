//! In-memory stand-in for the Bing Webmaster JSON API.
//!
//! Serves `GetUrlInfo`, `GetUrlTrafficInfo` and `SubmitUrl` under
//! `/webmaster/api.svc/json`. Application errors are answered the way the
//! upstream does it: a JSON body with `ErrorCode` and `Message`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing::debug;

pub const API_PREFIX: &str = "/webmaster/api.svc/json";

pub const ERROR_INVALID_API_KEY: u32 = 3;
pub const ERROR_INVALID_URL: u32 = 7;
pub const ERROR_INVALID_PARAMETER: u32 = 8;

/// Milliseconds since epoch reported as `DiscoveryDate` (2021-01-01).
pub const DISCOVERY_MILLIS: i64 = 1_609_459_200_000;
/// Milliseconds since epoch reported as `LastCrawledDate` (2021-02-01).
pub const LAST_CRAWLED_MILLIS: i64 = 1_612_137_600_000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmittedUrl {
    #[serde(rename = "siteUrl")]
    pub site_url: String,
    pub url: String,
}

#[derive(Debug)]
pub struct MockState {
    api_key: String,
    submitted: RwLock<Vec<SubmittedUrl>>,
    requests: AtomicUsize,
}

pub type SharedState = Arc<MockState>;

impl MockState {
    pub fn new(api_key: &str) -> SharedState {
        Arc::new(MockState {
            api_key: api_key.to_string(),
            submitted: RwLock::new(Vec::new()),
            requests: AtomicUsize::new(0),
        })
    }

    /// Requests received so far, rejected ones included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn submitted(&self) -> Vec<SubmittedUrl> {
        self.submitted
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiQuery {
    #[serde(rename = "apiKey")]
    pub api_key: Option<String>,
    #[serde(rename = "siteUrl")]
    pub site_url: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SubmitUrlBody {
    #[serde(rename = "siteUrl")]
    site_url: Option<String>,
    url: Option<String>,
}

type ApiReply = (StatusCode, Json<Value>);

pub fn app(state: SharedState) -> Router {
    let api = Router::new()
        .route("/GetUrlInfo", get(get_url_info))
        .route("/GetUrlTrafficInfo", get(get_url_traffic_info))
        .route("/SubmitUrl", post(submit_url));
    Router::new().nest(API_PREFIX, api).with_state(state)
}

pub async fn run(listener: TcpListener, state: SharedState) -> Result<(), std::io::Error> {
    axum::serve(listener, app(state)).await
}

fn api_error(code: u32, message: &str) -> ApiReply {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "ErrorCode": code, "Message": message })),
    )
}

/// Count the request, check the key and pull out `siteUrl` and `url`.
fn admit(
    state: &MockState,
    api_key: Option<&str>,
    site_url: Option<String>,
    url: Option<String>,
) -> Result<(String, String), ApiReply> {
    state.requests.fetch_add(1, Ordering::SeqCst);

    if api_key != Some(state.api_key.as_str()) {
        return Err(api_error(ERROR_INVALID_API_KEY, "ERROR!!! InvalidApiKey"));
    }
    let (Some(site_url), Some(url)) = (site_url, url) else {
        return Err(api_error(ERROR_INVALID_PARAMETER, "ERROR!!! InvalidParameter"));
    };
    if !url.starts_with(&site_url) {
        return Err(api_error(ERROR_INVALID_URL, "ERROR!!! InvalidUrl"));
    }
    Ok((site_url, url))
}

fn wcf_date(millis: i64) -> String {
    format!("/Date({millis})/")
}

async fn get_url_info(State(state): State<SharedState>, Query(q): Query<ApiQuery>) -> ApiReply {
    let url = match admit(&state, q.api_key.as_deref(), q.site_url, q.url) {
        Ok((_, url)) => url,
        Err(reply) => return reply,
    };
    debug!(%url, "GetUrlInfo");
    (
        StatusCode::OK,
        Json(json!({
            "d": {
                "__type": "UrlInfo:#Microsoft.Bing.Webmaster.Api",
                "AnchorCount": 3,
                "DiscoveryDate": wcf_date(DISCOVERY_MILLIS),
                "DocumentSize": 18204,
                "HttpStatus": 200,
                "IsPage": true,
                "LastCrawledDate": wcf_date(LAST_CRAWLED_MILLIS),
                "TotalChildUrlCount": 0,
                "Url": url,
            }
        })),
    )
}

async fn get_url_traffic_info(
    State(state): State<SharedState>,
    Query(q): Query<ApiQuery>,
) -> ApiReply {
    let url = match admit(&state, q.api_key.as_deref(), q.site_url, q.url) {
        Ok((_, url)) => url,
        Err(reply) => return reply,
    };
    debug!(%url, "GetUrlTrafficInfo");
    (
        StatusCode::OK,
        Json(json!({
            "d": {
                "__type": "UrlTrafficInfo:#Microsoft.Bing.Webmaster.Api",
                "Clicks": 12,
                "Impressions": 340,
                "IsPage": true,
                "Url": url,
            }
        })),
    )
}

async fn submit_url(
    State(state): State<SharedState>,
    Query(q): Query<ApiQuery>,
    body: Bytes,
) -> ApiReply {
    let body: SubmitUrlBody = serde_json::from_slice(&body).unwrap_or_default();
    let (site_url, url) = match admit(&state, q.api_key.as_deref(), body.site_url, body.url) {
        Ok(pair) => pair,
        Err(reply) => return reply,
    };
    debug!(%url, "SubmitUrl");
    state
        .submitted
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .push(SubmittedUrl { site_url, url });
    (StatusCode::OK, Json(json!({ "d": null })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submitted_url_uses_upstream_field_names() {
        let submitted = SubmittedUrl {
            site_url: "https://example.com/".to_string(),
            url: "https://example.com/hello".to_string(),
        };
        let json = serde_json::to_value(&submitted).unwrap();
        assert_eq!(json["siteUrl"], "https://example.com/");
        assert_eq!(json["url"], "https://example.com/hello");
    }

    #[test]
    fn query_accepts_upstream_parameter_names() {
        let q: ApiQuery =
            serde_json::from_str(r#"{"apiKey":"k","siteUrl":"s","url":"u"}"#).unwrap();
        assert_eq!(q.api_key.as_deref(), Some("k"));
        assert_eq!(q.site_url.as_deref(), Some("s"));
        assert_eq!(q.url.as_deref(), Some("u"));
    }

    #[test]
    fn wrong_key_is_rejected_and_counted() {
        let state = MockState::new("secret");
        let err = admit(&state, Some("nope"), Some("s".into()), Some("s/u".into())).unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        assert_eq!(err.1 .0["ErrorCode"], ERROR_INVALID_API_KEY);
        assert_eq!(state.request_count(), 1);
    }

    #[test]
    fn url_outside_site_is_rejected() {
        let state = MockState::new("secret");
        let err = admit(
            &state,
            Some("secret"),
            Some("https://example.com/".into()),
            Some("https://other.org/".into()),
        )
        .unwrap_err();
        assert_eq!(err.1 .0["ErrorCode"], ERROR_INVALID_URL);
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let state = MockState::new("secret");
        let err = admit(&state, Some("secret"), None, Some("u".into())).unwrap_err();
        assert_eq!(err.1 .0["ErrorCode"], ERROR_INVALID_PARAMETER);
    }
}
