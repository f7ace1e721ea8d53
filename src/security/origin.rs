//! Request provenance checks: origin allow-list and browser user-agent.

use axum::http::HeaderMap;
use axum::http::header::{ORIGIN, REFERER, USER_AGENT};

/// Substring every mainstream browser user-agent carries.
pub const BROWSER_UA_MARKER: &str = "Mozilla";

/// Allow-list of origins permitted to call the relay.
///
/// An empty list matches nothing: the check fails closed rather than
/// degrading to "allow all".
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    allowed: Vec<String>,
}

impl OriginPolicy {
    /// Build a policy, discarding blank entries.
    ///
    /// A blank entry would be a prefix of every `Referer`.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .map(Into::into)
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
        }
    }

    /// Configured origins, in configuration order.
    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    /// True iff `Origin` equals an allowed origin, or `Referer` starts with one.
    pub fn validate_origin(&self, headers: &HeaderMap) -> bool {
        let origin = header_str(headers, ORIGIN.as_str());
        let referer = header_str(headers, REFERER.as_str());

        self.allowed.iter().any(|allowed| {
            origin.is_some_and(|o| o == allowed)
                || referer.is_some_and(|r| r.starts_with(allowed.as_str()))
        })
    }
}

/// Crude browser heuristic: the `User-Agent` must be present and mention
/// "Mozilla".
///
/// Trivially spoofable. It filters naive scripts, nothing more.
pub fn validate_user_agent(headers: &HeaderMap) -> bool {
    header_str(headers, USER_AGENT.as_str()).is_some_and(|ua| ua.contains(BROWSER_UA_MARKER))
}

/// Header value as `&str`; non-UTF-8 values are treated as absent.
pub(crate) fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
