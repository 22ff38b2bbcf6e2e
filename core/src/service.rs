//! Validation, caching and submission on top of `WebmasterClient`.
//!
//! # Design
//! The read path (`fetch_info`) consults the cache first; a hit skips both the
//! precondition checks and the network. On a miss it needs an API key and a
//! published URL, then calls `GetUrlInfo` and `GetUrlTrafficInfo`, merges the
//! two `d` records (traffic info wins on a key collision) and caches the merge
//! for four hours. Date fields are rewritten on the way out, never in the
//! cache.
//!
//! The write path (`submit_url`) needs the key, a URL, submission enabled and
//! a public site before it sends `SubmitUrl`. Only transport failures are
//! reported; the upstream acknowledgement is not read.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::cache::{MemoryCache, ResponseCache};
use crate::client::{ApiResponse, WebmasterClient, GET_URL_INFO, GET_URL_TRAFFIC_INFO};
use crate::error::ServiceError;
use crate::http::{HttpRequest, Transport, UreqTransport};
use crate::sanitize::sanitize_record;
use crate::settings::Settings;
use crate::types::{Post, PostStatus, Record, SubmitReadiness};

/// How long a merged record is served from the cache.
pub const CACHE_TTL: Duration = Duration::from_secs(4 * 60 * 60);

const CACHE_KEY_PREFIX: &str = "wordlift_for_bing_core_response_";

pub const REASON_KEY_OK: &str = "Bing Webmaster API Key available.";
pub const REASON_KEY_MISSING: &str = "Bing Webmaster API Key not saved in Writing Settings page.";
pub const REASON_ENABLED: &str = "Post to Bing enabled globally.";
pub const REASON_DISABLED: &str = "Post to Bing disabled globally in Writing Settings page.";
pub const REASON_PUBLIC: &str = "Search engines are encouraged to index this site.";
pub const REASON_NOT_PUBLIC: &str =
    "Search engines discouraged from indexing this site (Reading Settings page).";

/// Cache key for the merged record of a post.
pub fn cache_key(post_id: u64) -> String {
    format!("{CACHE_KEY_PREFIX}{post_id}")
}

/// Merge `overlay` into `base`; on a shared key the overlay value is kept.
pub fn merge_records(mut base: Record, overlay: Record) -> Record {
    base.extend(overlay);
    base
}

pub struct WebmasterService<T, C> {
    settings: Settings,
    client: WebmasterClient,
    transport: T,
    cache: C,
}

impl WebmasterService<UreqTransport, MemoryCache> {
    /// Service with the `ureq` transport and an in-memory cache.
    pub fn from_settings(settings: Settings) -> Self {
        let transport = UreqTransport::new(settings.timeout());
        Self::new(settings, transport, MemoryCache::new())
    }
}

impl<T: Transport, C: ResponseCache> WebmasterService<T, C> {
    pub fn new(settings: Settings, transport: T, cache: C) -> Self {
        let client = WebmasterClient::with_base(settings.api_key.trim(), &settings.api_base);
        Self {
            settings,
            client,
            transport,
            cache,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn client(&self) -> &WebmasterClient {
        &self.client
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Merged URL and traffic info for `post`, with dates formatted.
    pub fn fetch_info(&self, post: &Post) -> Result<Record, ServiceError> {
        let key = cache_key(post.id);
        if let Some(record) = self.cache.get(&key) {
            debug!(post_id = post.id, "url info served from cache");
            return Ok(self.sanitize(&record));
        }

        if !self.settings.has_api_key() {
            return Err(ServiceError::NoKey);
        }
        let url = post.published_url().ok_or(ServiceError::NoUrl)?;

        let site_url = &self.settings.site_url;
        let url_info = self.read(GET_URL_INFO, self.client.build_get_url_info(site_url, url)?)?;
        let traffic_info = self.read(
            GET_URL_TRAFFIC_INFO,
            self.client.build_get_url_traffic_info(site_url, url)?,
        )?;

        let merged = merge_records(url_info, traffic_info);
        self.cache.set(&key, merged.clone(), CACHE_TTL);
        info!(post_id = post.id, fields = merged.len(), "url info fetched");
        Ok(self.sanitize(&merged))
    }

    /// Submit the post's URL to Bing.
    pub fn submit_url(&self, post: &Post) -> Result<(), ServiceError> {
        if !self.settings.has_api_key() {
            return Err(ServiceError::NoKey);
        }
        let url = post.submit_url().ok_or(ServiceError::NoUrl)?;
        if !self.settings.post_enabled {
            return Err(ServiceError::NotEnabled);
        }
        if !self.settings.blog_public {
            return Err(ServiceError::NotPublic);
        }

        let request = self.client.build_submit_url(&self.settings.site_url, url)?;
        self.client
            .perform(&self.transport, &request)
            .map_err(|e| {
                warn!(post_id = post.id, error = %e, "url submission failed");
                ServiceError::from(e)
            })?;
        info!(post_id = post.id, "url submitted");
        Ok(())
    }

    /// What would happen on publish, for posts that are not published yet.
    ///
    /// Returns `None` for any other status.
    pub fn before_submit(&self, status: &PostStatus) -> Option<SubmitReadiness> {
        if !status.awaits_publication() {
            return None;
        }

        let checks = [
            (self.settings.has_api_key(), REASON_KEY_OK, REASON_KEY_MISSING),
            (self.settings.post_enabled, REASON_ENABLED, REASON_DISABLED),
            (self.settings.blog_public, REASON_PUBLIC, REASON_NOT_PUBLIC),
        ];
        let failures: Vec<String> = checks
            .iter()
            .filter(|(ok, _, _)| !ok)
            .map(|(_, _, no)| no.to_string())
            .collect();

        if failures.is_empty() {
            Some(SubmitReadiness {
                status: true,
                reasons: checks.iter().map(|(_, yes, _)| yes.to_string()).collect(),
            })
        } else {
            Some(SubmitReadiness {
                status: false,
                reasons: failures,
            })
        }
    }

    fn read(&self, operation: &str, request: HttpRequest) -> Result<Record, ServiceError> {
        let response = self.client.perform(&self.transport, &request).map_err(|e| {
            warn!(operation, error = %e, "webmaster request failed");
            ServiceError::from(e)
        })?;

        if let Some(code) = response.error_code() {
            let code = match code {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            let message = response.message().unwrap_or_default().to_string();
            warn!(operation, code = %code, "webmaster api returned an error");
            return Err(ServiceError::Response { code, message });
        }

        match response {
            ApiResponse::Json(_) => Ok(response.data().cloned().unwrap_or_default()),
            ApiResponse::Raw(_) => {
                warn!(operation, "webmaster api returned a non-json body");
                Ok(Record::new())
            }
        }
    }

    fn sanitize(&self, record: &Record) -> Record {
        sanitize_record(record, &self.settings.date_format)
    }
}
