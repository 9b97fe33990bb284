//! Client configuration.
//!
//! | Variable                | Meaning                                                            | Default                    |
//! |-------------------------|--------------------------------------------------------------------|----------------------------|
//! | `PAY_API_URL`           | Base URL of the payment demo service                               | `http://127.0.0.1:8000`    |
//! | `PAY_STREAM_URL`        | Base URL of the order push stream. The order id is appended to it. | derived from `PAY_API_URL` |
//! | `PAY_REQUEST_TIMEOUT`   | Request timeout in seconds. Unset means the transport default.     | unset                      |
//! | `PAY_TERMINAL_STATUSES` | Comma-separated order statuses after which no updates are expected | `FINISHED,CANCELLED`       |
use std::{env, time::Duration};

use log::*;
use url::Url;

use crate::errors::SessionError;

const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_STREAM_PATH: &str = "/ws/orders/";
const DEFAULT_TERMINAL_STATUSES: [&str; 2] = ["FINISHED", "CANCELLED"];

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub api_url: Url,
    /// Always ends in a `/`, so that joining an order id appends a path segment.
    pub stream_url: Url,
    pub request_timeout: Option<Duration>,
    pub terminal_statuses: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let api_url = Url::parse(DEFAULT_API_URL).expect("Default API URL is not valid");
        let stream_url = stream_url_for(&api_url).expect("Default stream URL is not valid");
        Self {
            api_url,
            stream_url,
            request_timeout: None,
            terminal_statuses: DEFAULT_TERMINAL_STATUSES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ClientConfig {
    /// Points both the API and the push stream at the given service, using the default stream path.
    pub fn new(api_url: Url) -> Result<Self, SessionError> {
        let stream_url = stream_url_for(&api_url)?;
        Ok(Self { api_url, stream_url, ..Default::default() })
    }

    pub fn with_stream_url(mut self, stream_url: Url) -> Self {
        self.stream_url = with_trailing_slash(stream_url);
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn from_env_or_default() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Invalid values are logged and replaced by
    /// their defaults.
    pub fn from_vars<F>(var: F) -> Self
    where F: Fn(&str) -> Option<String> {
        let defaults = Self::default();
        let api_url = var("PAY_API_URL")
            .and_then(|s| {
                Url::parse(&s)
                    .map_err(|e| {
                        error!("🪛️ {s} is not a valid URL for PAY_API_URL. {e} Using the default, {DEFAULT_API_URL}.")
                    })
                    .ok()
            })
            .unwrap_or_else(|| defaults.api_url.clone());
        let derived = || {
            stream_url_for(&api_url).unwrap_or_else(|e| {
                warn!("🪛️ Could not derive the order stream URL. {e} Using {}.", defaults.stream_url);
                defaults.stream_url.clone()
            })
        };
        let stream_url = match var("PAY_STREAM_URL") {
            Some(s) => match Url::parse(&s) {
                Ok(url) if !url.cannot_be_a_base() => with_trailing_slash(url),
                Ok(_) => {
                    warn!("🪛️ {s} cannot take an order id for PAY_STREAM_URL. Deriving it from {api_url} instead.");
                    derived()
                },
                Err(e) => {
                    warn!("🪛️ {s} is not a valid URL for PAY_STREAM_URL. {e} Deriving it from {api_url} instead.");
                    derived()
                },
            },
            None => derived(),
        };
        let request_timeout = var("PAY_REQUEST_TIMEOUT").and_then(|s| match s.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(secs) => Some(Duration::from_secs(secs)),
            Err(e) => {
                warn!("🪛️ {s} is not a valid number of seconds for PAY_REQUEST_TIMEOUT. {e} No timeout will be set.");
                None
            },
        });
        let terminal_statuses = var("PAY_TERMINAL_STATUSES")
            .map(|s| s.split(',').map(|v| v.trim().to_string()).filter(|v| !v.is_empty()).collect::<Vec<String>>())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.terminal_statuses);
        debug!("🪛️ Client configured for {api_url} (stream: {stream_url})");
        Self { api_url, stream_url, request_timeout, terminal_statuses }
    }
}

/// Derives the push stream base from the API URL: `http` becomes `ws`, `https` becomes `wss`, and the path is
/// replaced with the order stream path.
pub fn stream_url_for(api_url: &Url) -> Result<Url, SessionError> {
    let scheme = match api_url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(SessionError::Configuration(format!("Unsupported URL scheme '{other}' in {api_url}"))),
    };
    let mut url = api_url.clone();
    url.set_scheme(scheme).map_err(|_| SessionError::Configuration(format!("Cannot use {scheme} for {api_url}")))?;
    url.set_path(DEFAULT_STREAM_PATH);
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn with_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
