//! Build information captured at compile time.

use serde::Serialize;

/// Package version from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Short git commit hash (7 chars).
pub const BUILD_HASH: &str = env!("BUILD_HASH");

/// Whether the build came from a dirty working directory.
pub const BUILD_DIRTY: bool = matches!(env!("BUILD_DIRTY").as_bytes(), b"true");

/// Full version string, e.g. `0.4.0 (abc1234)` or `0.4.0 (abc1234*)` if dirty.
#[must_use]
pub fn version_string() -> String {
    let dirty = if BUILD_DIRTY { "*" } else { "" };
    format!("{VERSION} ({BUILD_HASH}{dirty})")
}

/// Build metadata reported by the HTTP bridge.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct BuildInfo {
    /// Package version.
    pub version: &'static str,
    /// Git commit hash.
    pub hash: &'static str,
    /// Dirty working tree at build time.
    pub dirty: bool,
}

impl BuildInfo {
    /// Metadata of the running binary.
    #[must_use]
    pub const fn current() -> Self {
        Self {
            version: VERSION,
            hash: BUILD_HASH,
            dirty: BUILD_DIRTY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_string_starts_with_package_version() {
        let version = version_string();
        assert!(version.starts_with(VERSION));
        assert!(version.contains(BUILD_HASH));
    }
}
