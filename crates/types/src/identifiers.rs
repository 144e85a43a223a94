//! Newtype identifiers for versions, engines, and platforms.
//!
//! Every name that participates in a download URL or a cache path is a
//! distinct newtype wrapping a `String`, so an [`EngineName`] cannot be passed
//! where a [`BinaryPlatform`] is expected even though both are plain strings on
//! the wire.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub(crate) String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id! {
    /// Name of an engine component (e.g. `"query-engine"`).
    ///
    /// Appears both in the engine download URL and in the installed file name.
    EngineName
}

string_id! {
    /// Platform identifier used by the engine build matrix
    /// (e.g. `"linux-static-x64"`, `"darwin-arm64"`, `"windows"`).
    BinaryPlatform
}

// ---------------------------------------------------------------------------
// Pinned versions
// ---------------------------------------------------------------------------

/// Release version of the packaged CLI this client was generated against.
pub const CLI_VERSION: &str = "4.16.0";

/// Build identifier (commit hash) of the engines this client was generated against.
///
/// Engine builds are listed at <https://github.com/prisma/prisma-engines/commits/main>.
pub const ENGINE_VERSION: &str = "b20ead4d3ab9e78ac112966e242ded703f4a052c";

/// The pair of versions one client build is pinned to.
///
/// Both are fixed at compile time; [`VersionIdentifiers::pinned`] is the only
/// value production code uses. Tests construct others to exercise path and URL
/// resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VersionIdentifiers {
    /// Packaged CLI release (e.g. `"4.16.0"`).
    pub cli: String,
    /// Engine build identifier (40-character commit hash).
    pub engine: String,
}

impl VersionIdentifiers {
    /// Returns the versions compiled into this build.
    pub fn pinned() -> Self {
        Self {
            cli: CLI_VERSION.to_string(),
            engine: ENGINE_VERSION.to_string(),
        }
    }
}

impl Default for VersionIdentifiers {
    fn default() -> Self {
        Self::pinned()
    }
}

// ---------------------------------------------------------------------------
// Engine catalog
// ---------------------------------------------------------------------------

/// One engine component the client may need at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineCatalogEntry {
    /// Component name as used in URLs and file names.
    pub name: &'static str,
    /// Environment variable that, when set, supplies a prebuilt binary path.
    pub env: &'static str,
}

impl EngineCatalogEntry {
    /// Returns the component name as an [`EngineName`].
    pub fn engine_name(&self) -> EngineName {
        EngineName(self.name.to_string())
    }
}

/// Engine that executes queries.
pub const QUERY_ENGINE: EngineCatalogEntry = EngineCatalogEntry {
    name: "query-engine",
    env: "PRISMA_QUERY_ENGINE_BINARY",
};

/// Engine that applies schema migrations.
pub const MIGRATION_ENGINE: EngineCatalogEntry = EngineCatalogEntry {
    name: "migration-engine",
    env: "PRISMA_MIGRATION_ENGINE_BINARY",
};

/// Every engine component fetched by a full provisioning run.
pub const ENGINES: [EngineCatalogEntry; 2] = [QUERY_ENGINE, MIGRATION_ENGINE];
