//! Domain types shared by the service and its hosts.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A merged upstream record: the union of the `d` objects of the read calls.
pub type Record = Map<String, Value>;

/// Fields a host shows in its URL traffic table, in display order.
pub const DISPLAY_FIELDS: [&str; 8] = [
    "DiscoveryDate",
    "LastCrawledDate",
    "DocumentSize",
    "HttpStatus",
    "TotalChildUrlCount",
    "AnchorCount",
    "Clicks",
    "Impressions",
];

/// Publication status of a post, as reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostStatus {
    Publish,
    Future,
    Draft,
    Pending,
    Private,
    Trash,
    AutoDraft,
    Inherit,
    Other(String),
}

impl PostStatus {
    /// Statuses for which the pre-publish readiness report is shown.
    pub fn awaits_publication(&self) -> bool {
        matches!(
            self,
            PostStatus::Pending | PostStatus::Draft | PostStatus::AutoDraft | PostStatus::Future
        )
    }
}

impl From<&str> for PostStatus {
    fn from(s: &str) -> Self {
        match s {
            "publish" => PostStatus::Publish,
            "future" => PostStatus::Future,
            "draft" => PostStatus::Draft,
            "pending" => PostStatus::Pending,
            "private" => PostStatus::Private,
            "trash" => PostStatus::Trash,
            "auto-draft" => PostStatus::AutoDraft,
            "inherit" => PostStatus::Inherit,
            other => PostStatus::Other(other.to_string()),
        }
    }
}

/// The post a read or write is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub id: u64,
    pub permalink: Option<String>,
    pub status: PostStatus,
}

impl Post {
    pub fn new(id: u64, permalink: impl Into<String>, status: PostStatus) -> Self {
        Self {
            id,
            permalink: Some(permalink.into()),
            status,
        }
    }

    /// The URL to look up traffic for. Only published posts have one.
    pub fn published_url(&self) -> Option<&str> {
        if self.status != PostStatus::Publish {
            return None;
        }
        self.submit_url()
    }

    /// The URL to submit, whatever the current status.
    pub fn submit_url(&self) -> Option<&str> {
        self.permalink
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

/// Outcome of the pre-publish checks, with the reasons behind it.
///
/// When any check fails only the failures are listed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitReadiness {
    pub status: bool,
    pub reasons: Vec<String>,
}

/// Render the display fields of `record` as label/value rows.
///
/// Strings are shown without quotes; missing fields render empty.
pub fn display_rows(record: &Record) -> Vec<(&'static str, String)> {
    DISPLAY_FIELDS
        .iter()
        .map(|field| {
            let value = match record.get(*field) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
            };
            (*field, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parses_host_strings() {
        assert_eq!(PostStatus::from("auto-draft"), PostStatus::AutoDraft);
        assert_eq!(PostStatus::from("publish"), PostStatus::Publish);
        assert_eq!(
            PostStatus::from("archived"),
            PostStatus::Other("archived".to_string())
        );
    }

    #[test]
    fn only_unpublished_statuses_await_publication() {
        assert!(PostStatus::Draft.awaits_publication());
        assert!(PostStatus::Future.awaits_publication());
        assert!(!PostStatus::Publish.awaits_publication());
        assert!(!PostStatus::Private.awaits_publication());
    }

    #[test]
    fn published_url_requires_publish_status() {
        let draft = Post::new(1, "https://example.com/?p=1", PostStatus::Draft);
        assert_eq!(draft.published_url(), None);
        assert_eq!(draft.submit_url(), Some("https://example.com/?p=1"));

        let published = Post::new(1, "https://example.com/hello", PostStatus::Publish);
        assert_eq!(published.published_url(), Some("https://example.com/hello"));
    }

    #[test]
    fn blank_permalink_counts_as_missing() {
        let post = Post::new(1, "  ", PostStatus::Publish);
        assert_eq!(post.submit_url(), None);
    }

    #[test]
    fn display_rows_follow_field_order() {
        let record = json!({
            "Clicks": 12,
            "DiscoveryDate": "January 1, 2021",
            "HttpStatus": 200,
        });
        let rows = display_rows(record.as_object().unwrap());
        assert_eq!(rows[0], ("DiscoveryDate", "January 1, 2021".to_string()));
        assert_eq!(rows[1], ("LastCrawledDate", String::new()));
        assert_eq!(rows[3], ("HttpStatus", "200".to_string()));
        assert_eq!(rows[6], ("Clicks", "12".to_string()));
    }
}
