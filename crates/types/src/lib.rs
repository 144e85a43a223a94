//! Core domain for the engine runtime.
//!
//! This crate contains the wire scalar codec, version identifiers, the engine
//! catalog, and the codec error type used throughout the workspace.
//! Infrastructure crates build on the types defined here; they never add wire
//! rules of their own.
//!
//! ## Architectural Layer
//!
//! **Domain.** This crate has no I/O dependencies.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers, pinned versions, engine catalog |
//! | [`platform`] | Host platform names used in download URLs and file names |
//! | [`scalars`] | Extended scalar types and their wire forms |
//! | [`codec`] | Payload `decode` / `encode` entry points |
//! | [`errors`] | [`CodecError`] |

pub mod codec;
pub mod errors;
pub mod identifiers;
pub mod platform;
pub mod scalars;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use codec::{decode, encode};
pub use errors::CodecError;
pub use identifiers::{
    BinaryPlatform, EngineCatalogEntry, EngineName, VersionIdentifiers, CLI_VERSION, ENGINES,
    ENGINE_VERSION, MIGRATION_ENGINE, QUERY_ENGINE,
};
pub use platform::{check_for_extension, Platform};
pub use scalars::{BatchResult, BigInt, Bytes, DateTime, Decimal, Json, RawRows};
