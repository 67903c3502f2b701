//! Location Path Transformer
//!
//! Locations are recorded at build time, usually as paths relative to the
//! directory the builder ran in. A transformer rewrites them into whatever
//! the runtime needs: a path relative to the current working directory, or
//! an object key. The store applies it exactly once per lookup.

use std::fmt;
use std::sync::Arc;

/// A side-effect-free `location -> location` rewrite.
#[derive(Clone)]
pub struct PathTransformer {
    func: Arc<dyn Fn(&str) -> String + Send + Sync>,
}

impl PathTransformer {
    /// Wrap an arbitrary rewrite function.
    pub fn from_fn<F>(func: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self {
            func: Arc::new(func),
        }
    }

    /// Leaves locations untouched.
    pub fn identity() -> Self {
        Self::from_fn(str::to_string)
    }

    /// Rewrites every `..` to `.`.
    ///
    /// Indexes built from a sibling directory record shards as `../data/..`;
    /// this turns them into paths valid from the project root.
    pub fn collapse_parent_dirs() -> Self {
        Self::from_fn(|location| location.replace("..", "."))
    }

    /// Drops a fixed leading prefix when present.
    pub fn strip_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self::from_fn(move |location| {
            location
                .strip_prefix(prefix.as_str())
                .unwrap_or(location)
                .to_string()
        })
    }

    /// Apply the rewrite.
    pub fn apply(&self, location: &str) -> String {
        (self.func)(location)
    }
}

impl Default for PathTransformer {
    fn default() -> Self {
        Self::identity()
    }
}

impl fmt::Debug for PathTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PathTransformer(..)")
    }
}
