//! Request builder and response parser for the Bing Webmaster JSON API.
//!
//! # Design
//! `WebmasterClient` holds only the API key and base URL. Each call is split
//! into a `build_*` method that produces an `HttpRequest` and
//! `parse_response`, which consumes an `HttpResponse`. `perform` glues the two
//! around a `Transport` for callers that do not need the split.
//!
//! Every operation is addressed as `<base><Operation>?apiKey=<key>`. GET
//! parameters are appended to the query string, POST parameters become a JSON
//! object body.

use serde_json::{Map, Value};
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport};

pub const DEFAULT_API_BASE: &str = "https://ssl.bing.com/webmaster/api.svc/json/";

pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

pub const GET_URL_INFO: &str = "GetUrlInfo";
pub const GET_URL_TRAFFIC_INFO: &str = "GetUrlTrafficInfo";
pub const SUBMIT_URL: &str = "SubmitUrl";

/// A parsed upstream body.
///
/// The API answers in JSON, but a body that does not parse is handed back
/// verbatim rather than failing the call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    Json(Value),
    Raw(String),
}

impl ApiResponse {
    /// The `ErrorCode` field of an error payload, if present and not null.
    pub fn error_code(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(Value::Object(map)) => {
                map.get("ErrorCode").filter(|code| !code.is_null())
            }
            _ => None,
        }
    }

    /// The `Message` field of an error payload, if present.
    pub fn message(&self) -> Option<&str> {
        match self {
            ApiResponse::Json(Value::Object(map)) => map.get("Message").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The record wrapped under `d`, when it is an object.
    pub fn data(&self) -> Option<&Map<String, Value>> {
        match self {
            ApiResponse::Json(Value::Object(map)) => map.get("d").and_then(Value::as_object),
            _ => None,
        }
    }
}

/// Synchronous client for the Webmaster API.
#[derive(Debug, Clone)]
pub struct WebmasterClient {
    api_key: String,
    api_base: String,
}

impl WebmasterClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base(api_key, DEFAULT_API_BASE)
    }

    pub fn with_base(api_key: &str, api_base: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Build a request for any operation.
    pub fn build_request(
        &self,
        method: HttpMethod,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<HttpRequest, ApiError> {
        let operation = operation.trim();
        if operation.is_empty() {
            return Err(ApiError::InvalidOperation(operation.to_string()));
        }

        let mut url = Url::parse(&format!("{}/{operation}", self.api_base))?;
        url.query_pairs_mut().append_pair("apiKey", &self.api_key);

        let body = match method {
            HttpMethod::Get => {
                if !params.is_empty() {
                    let mut pairs = url.query_pairs_mut();
                    for (key, value) in params {
                        pairs.append_pair(key, value);
                    }
                }
                None
            }
            HttpMethod::Post if params.is_empty() => None,
            HttpMethod::Post => {
                let object: Map<String, Value> = params
                    .iter()
                    .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                    .collect();
                let body = serde_json::to_string(&Value::Object(object))
                    .map_err(|e| ApiError::Serialization(e.to_string()))?;
                Some(body)
            }
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers: vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())],
            body,
        })
    }

    pub fn build_get_url_info(&self, site_url: &str, url: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Get,
            GET_URL_INFO,
            &[("siteUrl", site_url), ("url", url)],
        )
    }

    pub fn build_get_url_traffic_info(
        &self,
        site_url: &str,
        url: &str,
    ) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Get,
            GET_URL_TRAFFIC_INFO,
            &[("siteUrl", site_url), ("url", url)],
        )
    }

    pub fn build_submit_url(&self, site_url: &str, url: &str) -> Result<HttpRequest, ApiError> {
        self.build_request(
            HttpMethod::Post,
            SUBMIT_URL,
            &[("siteUrl", site_url), ("url", url)],
        )
    }

    /// Parse a body as JSON, falling back to the raw text.
    ///
    /// The status code is not consulted.
    pub fn parse_response(&self, response: HttpResponse) -> ApiResponse {
        match serde_json::from_str(&response.body) {
            Ok(value) => ApiResponse::Json(value),
            Err(_) => ApiResponse::Raw(response.body),
        }
    }

    /// Execute `request` over `transport` and parse the result.
    pub fn perform<T: Transport>(
        &self,
        transport: &T,
        request: &HttpRequest,
    ) -> Result<ApiResponse, ApiError> {
        let response = transport.execute(request)?;
        Ok(self.parse_response(response))
    }
}
