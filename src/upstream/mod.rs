//! Upstream targets and mount resolution.
//!
//! The immutable per-process description of the two proxied services, plus
//! the pure path arithmetic the dispatcher relies on: which public mount an
//! inbound path belongs to, and what the path looks like on the wire to the
//! upstream. No I/O happens here.

use std::fmt;

use thiserror::Error;

/// Errors from mount resolution.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No upstream is configured at the given mount. Unreachable through the
    /// router, which only hands over mounts it matched itself, but kept as a
    /// guard so a bad wiring change surfaces as a 404 instead of a panic.
    #[error("no upstream mounted at {0}")]
    UnknownMount(String),
}

/// Which downstream service a request is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamName {
    /// The tenant API (traction).
    Primary,
    /// The cloud agent admin API (acapy).
    Agent,
}

impl fmt::Display for UpstreamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamName::Primary => write!(f, "traction"),
            UpstreamName::Agent => write!(f, "acapy"),
        }
    }
}

/// A single proxied service: where clients reach it and where it lives.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    pub name: UpstreamName,
    base_url: String,
    public_mount: String,
    private_base: String,
}

impl UpstreamTarget {
    /// Build a target from configuration strings.
    ///
    /// `base_url` loses any trailing slash; `public_mount` and
    /// `private_base` are normalized to a leading slash and no trailing
    /// slash, with the root path collapsing to the empty string so path
    /// concatenation never doubles a separator.
    pub fn new(
        name: UpstreamName,
        base_url: impl Into<String>,
        public_mount: impl Into<String>,
        private_base: impl Into<String>,
    ) -> Self {
        Self {
            name,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            public_mount: normalize_prefix(&public_mount.into()),
            private_base: normalize_prefix(&private_base.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn public_mount(&self) -> &str {
        &self.public_mount
    }

    /// Path as the upstream expects it.
    ///
    /// `remainder` is everything after the public mount, including its
    /// leading slash (or empty when the inbound path equals the mount).
    /// Trailing slashes survive untouched: the forwarded path never has a
    /// different segment count than the client supplied.
    pub fn rewrite_path(&self, remainder: &str) -> String {
        if self.private_base.is_empty() && remainder.is_empty() {
            return "/".to_string();
        }
        format!("{}{}", self.private_base, remainder)
    }

    /// Absolute outbound URI with the inbound query string carried over
    /// byte-for-byte.
    pub fn target_uri(&self, remainder: &str, query: Option<&str>) -> String {
        let mut uri = format!("{}{}", self.base_url, self.rewrite_path(remainder));
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            uri.push('?');
            uri.push_str(query);
        }
        uri
    }
}

/// Result of matching an inbound path against the configured mounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountMatch<'a> {
    /// The public mount that claimed the path.
    pub public_mount: &'a str,
    /// The path after the mount, leading slash included (may be empty).
    pub remainder: &'a str,
}

/// The immutable set of proxied upstreams, built once at startup and shared
/// read-only across requests.
#[derive(Debug, Clone)]
pub struct Upstreams {
    agent: UpstreamTarget,
    primary: UpstreamTarget,
}

impl Upstreams {
    pub fn new(agent: UpstreamTarget, primary: UpstreamTarget) -> Self {
        Self { agent, primary }
    }

    pub fn agent(&self) -> &UpstreamTarget {
        &self.agent
    }

    pub fn primary(&self) -> &UpstreamTarget {
        &self.primary
    }

    /// Match an inbound path against the public mounts, first match wins.
    ///
    /// The order is a behavioral contract, not an artifact of registration:
    /// the agent mount is checked before the primary mount, so an agent
    /// mount nested under the primary prefix still reaches the agent
    /// service. Matching is segment-aware (`/api/acapyx` does not match a
    /// mount at `/api/acapy`).
    pub fn match_path<'a>(&'a self, path: &'a str) -> Option<MountMatch<'a>> {
        for target in [&self.agent, &self.primary] {
            if let Some(remainder) = strip_mount(target.public_mount(), path) {
                return Some(MountMatch {
                    public_mount: target.public_mount(),
                    remainder,
                });
            }
        }
        None
    }

    /// Look up the upstream configured at a public mount.
    pub fn resolve(&self, public_mount: &str) -> Result<&UpstreamTarget, UpstreamError> {
        [&self.agent, &self.primary]
            .into_iter()
            .find(|target| target.public_mount() == public_mount)
            .ok_or_else(|| UpstreamError::UnknownMount(public_mount.to_string()))
    }
}

/// Leading slash, no trailing slash; the root path becomes "".
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        return String::new();
    }
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Segment-aware prefix strip: the mount matches itself and any path one
/// separator below it, nothing else.
fn strip_mount<'a>(mount: &str, path: &'a str) -> Option<&'a str> {
    if mount.is_empty() {
        // Mounted at the root: everything matches and nothing is stripped.
        return Some(path);
    }
    let remainder = path.strip_prefix(mount)?;
    if remainder.is_empty() || remainder.starts_with('/') {
        Some(remainder)
    } else {
        None
    }
}
