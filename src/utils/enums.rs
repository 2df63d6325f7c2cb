use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::CutflowError;

/// The deterministic rule used to pick a single winning target when multiple
/// targets fall within the ΔR cutoff of the same query candidate.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Pick the target with the smallest ΔR to the query; ties go to the
    /// first target encountered.
    #[default]
    NearestDistance,
    /// Pick the target with the largest transverse momentum among those
    /// within the ΔR cutoff; ties go to the first target encountered.
    HighestTargetPt,
}

impl Display for MatchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchPolicy::NearestDistance => write!(f, "NearestDistance"),
            MatchPolicy::HighestTargetPt => write!(f, "HighestTargetPt"),
        }
    }
}

impl FromStr for MatchPolicy {
    type Err = CutflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nearestdistance" | "nearest-distance" | "nearest" | "dr" | "deltar" => {
                Ok(Self::NearestDistance)
            }
            "highesttargetpt" | "highest-target-pt" | "highestpt" | "maxpt" | "pt" => {
                Ok(Self::HighestTargetPt)
            }
            _ => Err(CutflowError::ParseError {
                name: s.to_string(),
                object: "MatchPolicy".to_string(),
            }),
        }
    }
}

/// What a [`CutRegistry`](crate::accept::CutRegistry) does when a cut is
/// registered under an already-taken name.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Fail the registration with
    /// [`DuplicateName`](crate::CutflowError::DuplicateName).
    #[default]
    Reject,
    /// Silently return the position of the existing cut.
    ReuseSlot,
}

impl Display for DuplicatePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DuplicatePolicy::Reject => write!(f, "Reject"),
            DuplicatePolicy::ReuseSlot => write!(f, "ReuseSlot"),
        }
    }
}

impl FromStr for DuplicatePolicy {
    type Err = CutflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reject" | "error" | "fail" => Ok(Self::Reject),
            "reuseslot" | "reuse-slot" | "reuse" => Ok(Self::ReuseSlot),
            _ => Err(CutflowError::ParseError {
                name: s.to_string(),
                object: "DuplicatePolicy".to_string(),
            }),
        }
    }
}
