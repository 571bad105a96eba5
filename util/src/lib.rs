mod timer;
pub use timer::{format_minutes, Timer};

#[derive(thiserror::Error, Debug)]
#[error("Filesystem path is not valid UTF-8")]
pub struct PathEncodingError;

/// Borrow a path as a `&str`, failing on non-UTF-8 paths.
pub fn path_str(path: &std::path::Path) -> Result<&str, PathEncodingError> {
    path.to_str().ok_or(PathEncodingError)
}

pub type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;
pub type HashMap<K, V> = std::collections::HashMap<K, V, Hasher>;
