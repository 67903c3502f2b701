//! Remote addresses: `scheme://bucket/key-prefix`

use std::fmt;

use crate::error::{Result, WikiError};

/// A bucket plus key prefix inside it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteAddress {
    pub bucket: String,
    /// Key prefix without leading or trailing `/` (may be empty)
    pub prefix: String,
}

impl RemoteAddress {
    /// Parse `address` if it starts with `scheme`.
    ///
    /// Returns `Ok(None)` for anything else (a local path). A remote address
    /// with no bucket is a configuration error.
    pub fn parse(address: &str, scheme: &str) -> Result<Option<Self>> {
        let rest = match address.strip_prefix(scheme) {
            Some(rest) if !scheme.is_empty() => rest,
            _ => return Ok(None),
        };

        let (bucket, prefix) = match rest.split_once('/') {
            Some((bucket, prefix)) => (bucket, prefix.trim_matches('/')),
            None => (rest, ""),
        };
        if bucket.is_empty() {
            return Err(WikiError::Configuration(format!(
                "remote address {:?} has no bucket",
                address
            )));
        }

        Ok(Some(Self {
            bucket: bucket.to_string(),
            prefix: prefix.to_string(),
        }))
    }

    /// Key of `name` under this address's prefix
    pub fn key(&self, name: &str) -> String {
        let name = normalize_key(name);
        if self.prefix.is_empty() {
            name
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.prefix.is_empty() {
            write!(f, "{}", self.bucket)
        } else {
            write!(f, "{}/{}", self.bucket, self.prefix)
        }
    }
}

/// Turn a path-like location into an object key.
///
/// Empty, `.` and `..` segments are dropped anywhere, so `/shards/a`,
/// `./shards/a` and `../shards/a` all name the key `shards/a`. Object keys
/// have no parent directory to climb to.
pub fn normalize_key(location: &str) -> String {
    location
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .collect::<Vec<_>>()
        .join("/")
}
