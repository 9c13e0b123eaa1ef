//! Request URL rewriting, e.g. routing feed fetches through a CORS proxy.

use std::fmt;
use std::sync::Arc;

type RewriteFn = dyn Fn(&str) -> String + Send + Sync;

/// Pure string transform applied to a feed URL before it reaches the transport.
#[derive(Clone)]
pub struct UrlTransform {
    kind: &'static str,
    rewrite: Option<Arc<RewriteFn>>,
}

impl UrlTransform {
    /// Leave URLs untouched.
    pub const fn identity() -> Self {
        Self {
            kind: "identity",
            rewrite: None,
        }
    }

    /// Prepend `prefix` to the percent-encoded feed URL, as expected by
    /// proxies of the form `https://proxy.example/?url=`.
    pub fn proxy_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            kind: "proxy",
            rewrite: Some(Arc::new(move |url| format!("{prefix}{}", encode_component(url)))),
        }
    }

    pub fn custom(rewrite: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self {
            kind: "custom",
            rewrite: Some(Arc::new(rewrite)),
        }
    }

    pub fn apply(&self, url: &str) -> String {
        self.rewrite
            .as_ref()
            .map_or_else(|| url.to_string(), |rewrite| rewrite(url))
    }

    pub const fn is_identity(&self) -> bool {
        self.rewrite.is_none()
    }
}

impl Default for UrlTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for UrlTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlTransform").field("kind", &self.kind).finish()
    }
}

/// Percent-encode everything outside the URI-component unreserved set.
fn encode_component(s: &str) -> String {
    use std::fmt::Write;

    let mut result = String::with_capacity(s.len() * 3);
    for b in s.bytes() {
        match b {
            b'a'..=b'z'
            | b'A'..=b'Z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => result.push(b as char),
            _ => {
                let _ = write!(result, "%{b:02X}");
            }
        }
    }
    result
}
