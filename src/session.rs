//! Session context for the Weibo web API
//!
//! Provides:
//! - The fixed browser header profile every API call carries
//! - Cookie credential injection into outbound requests
//! - File-based session locking to prevent parallel broadcasts

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;

use fs2::FileExt;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, CONTENT_TYPE,
    COOKIE, ORIGIN, PRAGMA, REFERER, USER_AGENT,
};
use reqwest::{Client, RequestBuilder};

use crate::cookies::SessionCredential;
use crate::error::{Error, Result};

pub const API_BASE_URL: &str = "https://api.weibo.com";
pub const LOCK_FILE: &str = "weibo_session.lock";

const CHAT_ORIGIN: &str = "https://api.weibo.com";
const CHAT_REFERER: &str = "https://api.weibo.com/chat";
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/142.0.0.0 Safari/537.36";
const SEC_CH_UA: &str = r#""Chromium";v="142", "Google Chrome";v="142", "Not_A Brand";v="99""#;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers the chat web client sends on same-origin API calls.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("zh-CN,zh;q=0.9"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        HeaderName::from_static("priority"),
        HeaderValue::from_static("u=1, i"),
    );
    headers.insert(REFERER, HeaderValue::from_static(CHAT_REFERER));
    headers.insert(
        HeaderName::from_static("sec-ch-ua"),
        HeaderValue::from_static(SEC_CH_UA),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-mobile"),
        HeaderValue::from_static("?0"),
    );
    headers.insert(
        HeaderName::from_static("sec-ch-ua-platform"),
        HeaderValue::from_static("\"macOS\""),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("empty"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("cors"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers
}

/// Authenticated HTTP calling convention shared by search and send.
#[derive(Debug, Clone)]
pub struct SessionClient {
    http: Client,
    cookie: HeaderValue,
    base_url: String,
}

impl SessionClient {
    /// Create a client against the production API.
    pub fn new(credential: &SessionCredential) -> Result<Self> {
        Self::with_base_url(credential, API_BASE_URL)
    }

    /// Create a client with a custom base url (primarily for tests).
    pub fn with_base_url<S: Into<String>>(
        credential: &SessionCredential,
        base_url: S,
    ) -> Result<Self> {
        let mut cookie = HeaderValue::from_str(credential.as_str()).map_err(|e| {
            Error::InvalidArgument(format!("Cookie string is not a valid header value: {}", e))
        })?;
        cookie.set_sensitive(true);

        let base_url = base_url.into().trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url)
            .map_err(|e| Error::InvalidArgument(format!("Invalid base url '{}': {}", base_url, e)))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| Error::InvalidArgument(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            http,
            cookie,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authenticated(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .headers(browser_headers())
            .header(COOKIE, self.cookie.clone())
    }

    /// GET `path` with the browser profile and session cookie.
    pub fn get(&self, path: &str) -> RequestBuilder {
        self.authenticated(self.http.get(self.url(path)))
    }

    /// Form POST to `path` with the browser profile and session cookie.
    ///
    /// The caller attaches the body with `.form(..)`.
    pub fn post_form(&self, path: &str) -> RequestBuilder {
        self.authenticated(self.http.post(self.url(path)))
            .header(ORIGIN, CHAT_ORIGIN)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
    }
}

/// Session lock guard that ensures only one process broadcasts per session.
pub struct SessionLock {
    path: PathBuf,
    lock_file: Option<File>,
}

impl SessionLock {
    /// Acquire an exclusive lock on the default lock file.
    pub fn acquire() -> Result<Self> {
        Self::acquire_at(LOCK_FILE)
    }

    /// Acquire an exclusive lock on `path`.
    pub fn acquire_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::LockError(format!("Failed to open lock file: {}", e)))?;

        match lock_file.try_lock_exclusive() {
            Ok(()) => Ok(Self {
                path,
                lock_file: Some(lock_file),
            }),
            Err(_) => {
                eprintln!(
                    r#"
⚠️  The Weibo session is already in use by another process.

Sending from one session in parallel looks like abuse to the platform.
Wait for the other run to finish and try again.
"#
                );
                Err(Error::SessionLocked)
            }
        }
    }

    /// Release the lock manually
    pub fn release(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = file.unlock();
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        self.release();
    }
}
