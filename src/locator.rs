//! Repository locator decomposition.
//!
//! A locator is a repository address that may embed a checkout reference via
//! query syntax, e.g. `https://example.org/repo.git?ref=prod7`. The fragment
//! position (`#...`) is reserved and rejected by the checkout stage; this
//! module only reports what it finds.

/// Parts of a repository locator.
///
/// Produced by splitting on the first `#`, then the first `?` within the
/// remainder. Any further `#` or `?` characters are retained verbatim inside
/// `fragment` and `query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorParts {
    pub resource: String,
    pub query: String,
    pub fragment: String,
}

/// Recognized checkout-reference keys, checked in order.
const REF_KEYS: &[&str] = &["ref=", "h=", "branch=", "tag="];

/// Split a locator into resource, query, and fragment.
///
/// Pure and infallible; callers decide what the parts mean.
pub fn split_locator(locator: &str) -> LocatorParts {
    let (sans_fragment, fragment) = match locator.split_once('#') {
        Some((before, after)) => (before, after),
        None => (locator, ""),
    };
    let (resource, query) = match sans_fragment.split_once('?') {
        Some((before, after)) => (before, after),
        None => (sans_fragment, ""),
    };
    LocatorParts {
        resource: resource.to_string(),
        query: query.to_string(),
        fragment: fragment.to_string(),
    }
}

impl LocatorParts {
    /// Checkout reference encoded in the query.
    ///
    /// `ref=`, `h=`, `branch=` and `tag=` prefixes strip the key; a query
    /// with no recognized key is taken verbatim as a bare branch or tag
    /// name. Empty means no explicit reference, i.e. the remote's default
    /// branch.
    pub fn checkout_ref(&self) -> &str {
        for key in REF_KEYS {
            if let Some(rest) = self.query.strip_prefix(key) {
                return rest;
            }
        }
        &self.query
    }
}
