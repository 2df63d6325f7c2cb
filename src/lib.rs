//! # cutflow
//!
//! Selection bookkeeping and geometric matching for particle physics analyses.
//!
//! This crate provides the two pieces of machinery that every selection or
//! labeling tool ends up reinventing:
//!
//! * [`accept`]: a registry of named boolean cuts ([`CutRegistry`]), a
//!   per-object result bitset ([`CutResult`]), and thread-safe running
//!   pass statistics ([`PassCounters`]) which render as a cut-flow table.
//! * [`matching`]: nearest-candidate association between two particle
//!   collections under a ΔR metric with configurable tie-break policies
//!   ([`match_candidates`]), plus decay-chain deduplication of matched sets
//!   ([`remove_descendants`]).
//!
//! Candidates only need to expose `(η, φ, pT)` through the [`Candidate`]
//! trait; [`Vec4`] and [`Particle`] implement it out of the box.
#![warn(clippy::perf, clippy::style)]
// #![warn(missing_docs)]

use thiserror::Error;

/// Named-cut registration, per-object results, and pass counting.
pub mod accept;
/// Concrete particle candidates and decay-chain storage.
pub mod data;
/// Candidate association under a ΔR metric and descendant filtering.
pub mod matching;
/// Utility functions, enums, and kinematic vector types.
pub mod utils;

pub use crate::accept::{CutFlow, CutRegistry, CutResult, PassCounters};
pub use crate::data::{DecayStore, Particle};
pub use crate::matching::{
    match_candidates, remove_descendants, Candidate, DecayGraph, DescendantConfig, MatchConfig,
    MatchResult,
};
pub use crate::utils::enums::{DuplicatePolicy, MatchPolicy};
pub use crate::utils::vectors::{Vec3, Vec4};
pub use crate::utils::{delta_phi, delta_r};

pub type CutflowResult<T> = Result<T, CutflowError>;

/// The error type used by all `cutflow` methods.
///
/// Every variant is a synchronous, deterministic consequence of caller
/// misconfiguration or API misuse, never of a transient runtime condition, so
/// there is no retry or partial-failure handling anywhere in this crate:
/// either a call fully succeeds or it fails before mutating anything
/// observable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CutflowError {
    /// The registry slot limit was reached on a cut registration.
    #[error("Cut registry is full ({capacity} slots); cannot register \"{name}\"")]
    CapacityExceeded {
        /// The fixed capacity of the registry.
        capacity: usize,
        /// Name of the cut which failed to register.
        name: String,
    },
    /// An error which occurs when the user tries to register two entries by
    /// the same name.
    #[error("A {category} named \"{name}\" is already registered!")]
    DuplicateName {
        /// The kind of entry ("cut", ...).
        category: &'static str,
        /// Name which is already registered.
        name: String,
    },
    /// An error which occurs when the user looks up an unregistered cut.
    #[error("No registered cut with name \"{name}\"!")]
    UnknownCut {
        /// Name of the cut which failed lookup.
        name: String,
    },
    /// A cut position was passed which was not obtained from the registry.
    #[error("Position {index} is out of range for a registry of {len} cuts")]
    IndexOutOfRange {
        /// The offending position.
        index: usize,
        /// Number of registered cuts.
        len: usize,
    },
    /// Matching was invoked without the required maximum ΔR.
    #[error("Matching requires `max_distance` to be set on the MatchConfig")]
    MissingMaxDistance,
    /// An error which occurs when the user tries to parse an invalid string of
    /// text, typically into an enum variant.
    #[error("Failed to parse string: \"{name}\" does not correspond to a valid \"{object}\"!")]
    ParseError {
        /// The string which was parsed.
        name: String,
        /// The name of the object it failed to parse into.
        object: String,
    },
}
