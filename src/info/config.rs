//! Configuration for structure resolution
//!
//! This module provides the options that control how [`crate::info::StructureInfoService`]
//! walks the file tree and how strictly it treats misbehaving providers.

/// Configuration for resolving structures and fields at a position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Ask files nested in the resolved file for a structure before its own containers
    /// (recommended: always true)
    pub check_nested_files: bool,

    /// Maximum composite nesting descended to find the leaf under a position (default: 64)
    /// A deeper tree is reported as inconsistent and yields no highlight
    pub max_depth: usize,

    /// Additionally `debug_assert!` when a provider returns an invalid grouping
    /// The provider is skipped either way
    pub assert_invalid_indexes: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            check_nested_files: true,
            max_depth: 64,
            assert_invalid_indexes: false,
        }
    }
}

impl ServiceConfig {
    /// Creates a configuration that only looks at the outermost file
    ///
    /// Structures of nested files are not found, lookups stay inside the file resolved for
    /// the position.
    #[must_use]
    pub fn shallow() -> Self {
        Self {
            check_nested_files: false,
            ..Self::default()
        }
    }

    /// Creates a configuration for developing providers
    ///
    /// Invalid groupings trigger a debug assertion in addition to the warning.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            assert_invalid_indexes: true,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets() {
        let default = ServiceConfig::default();
        assert!(default.check_nested_files);
        assert_eq!(default.max_depth, 64);
        assert!(!default.assert_invalid_indexes);

        assert!(!ServiceConfig::shallow().check_nested_files);
        assert!(ServiceConfig::strict().assert_invalid_indexes);
        assert_eq!(ServiceConfig::strict().max_depth, 64);
    }
}
