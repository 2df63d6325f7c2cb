use std::hash::Hash;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::{
    utils::{delta_r, enums::MatchPolicy, vectors::Vec4},
    CutflowError, CutflowResult,
};

/// A physics object reduced to `(η, φ, pT)` for matching purposes.
///
/// Identity is positional: the matcher refers to candidates by their index in
/// the slice they were passed in.
pub trait Candidate {
    /// Transverse momentum.
    fn pt(&self) -> f64;
    /// Pseudorapidity.
    fn eta(&self) -> f64;
    /// Azimuthal angle.
    fn phi(&self) -> f64;
}

impl Candidate for Vec4 {
    fn pt(&self) -> f64 {
        Vec4::pt(self)
    }
    fn eta(&self) -> f64 {
        Vec4::eta(self)
    }
    fn phi(&self) -> f64 {
        Vec4::phi(self)
    }
}

/// Configuration for [`match_candidates`].
///
/// `max_distance` has no sensible universal default (cone sizes are
/// analysis-specific), so it must be set explicitly; matching fails up front
/// with [`CutflowError::MissingMaxDistance`] otherwise. The pT cuts default
/// to zero, which keeps every candidate.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Exclude query candidates strictly below this pT.
    pub query_min_pt: f64,
    /// Exclude target candidates strictly below this pT.
    pub target_min_pt: f64,
    /// ΔR cutoff beyond which a query/target pair is not a candidate match.
    pub max_distance: Option<f64>,
    /// Tie-break policy used to pick among targets within the cutoff.
    pub policy: MatchPolicy,
}

impl MatchConfig {
    /// A config with the given policy, no pT cuts, and no ΔR cutoff yet.
    pub fn new(policy: MatchPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Set the required ΔR cutoff.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Set the minimum query pT.
    pub fn with_query_min_pt(mut self, query_min_pt: f64) -> Self {
        self.query_min_pt = query_min_pt;
        self
    }

    /// Set the minimum target pT.
    pub fn with_target_min_pt(mut self, target_min_pt: f64) -> Self {
        self.target_min_pt = target_min_pt;
        self
    }
}

/// The outcome of one [`match_candidates`] invocation: for every surviving
/// target index, the list of query indices assigned to it in discovery order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MatchResult {
    assignments: IndexMap<usize, Vec<usize>>,
}

impl MatchResult {
    /// True if the target at `target_index` survived the pT cut.
    pub fn contains_target(&self, target_index: usize) -> bool {
        self.assignments.contains_key(&target_index)
    }

    /// The query indices matched to `target_index`, or `None` if that target
    /// was excluded from matching.
    pub fn matches(&self, target_index: usize) -> Option<&[usize]> {
        self.assignments
            .get(&target_index)
            .map(|queries| queries.as_slice())
    }

    /// Iterate over `(target_index, matched query indices)` in target order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[usize])> {
        self.assignments
            .iter()
            .map(|(&target_index, queries)| (target_index, queries.as_slice()))
    }

    /// Number of targets which survived the pT cut.
    pub fn n_targets(&self) -> usize {
        self.assignments.len()
    }

    /// Total number of query candidates assigned to any target.
    pub fn n_matched(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

/// Associate each query candidate with at most one target candidate.
///
/// Every target passing `target_min_pt` appears in the result, possibly with
/// an empty list. For each query passing `query_min_pt`, every surviving
/// target within `max_distance` (in ΔR) is considered and a single winner is
/// chosen by `config.policy`; the query's index is appended to that target's
/// list. The scan is O(|queries| × |targets|) with no spatial indexing, which
/// is fine at per-event multiplicities of tens to low hundreds.
///
/// # Errors
///
/// Returns [`CutflowError::MissingMaxDistance`] if `config.max_distance` is
/// unset. Empty inputs are not an error and yield trivial results.
pub fn match_candidates<Q: Candidate, T: Candidate>(
    queries: &[Q],
    targets: &[T],
    config: &MatchConfig,
) -> CutflowResult<MatchResult> {
    let max_distance = config.max_distance.ok_or(CutflowError::MissingMaxDistance)?;
    let mut assignments: IndexMap<usize, Vec<usize>> = targets
        .iter()
        .enumerate()
        .filter(|(_, target)| target.pt() >= config.target_min_pt)
        .map(|(target_index, _)| (target_index, Vec::new()))
        .collect();
    for (query_index, query) in queries.iter().enumerate() {
        if query.pt() < config.query_min_pt {
            continue;
        }
        let mut winner: Option<(usize, f64)> = None;
        for &target_index in assignments.keys() {
            let target = &targets[target_index];
            let dr = delta_r(query.eta(), query.phi(), target.eta(), target.phi());
            if dr > max_distance {
                continue;
            }
            // Strict comparisons keep the first-encountered candidate on ties.
            let score = match config.policy {
                MatchPolicy::NearestDistance => dr,
                MatchPolicy::HighestTargetPt => target.pt(),
            };
            let better = match (config.policy, winner) {
                (_, None) => true,
                (MatchPolicy::NearestDistance, Some((_, best))) => score < best,
                (MatchPolicy::HighestTargetPt, Some((_, best))) => score > best,
            };
            if better {
                winner = Some((target_index, score));
            }
        }
        if let Some((target_index, _)) = winner {
            assignments[&target_index].push(query_index);
        }
    }
    Ok(MatchResult { assignments })
}

/// Access to the decay-tree relation of a particle collection.
///
/// Implemented per concrete particle representation so descendant walks never
/// need dynamic downcasting. Decay graphs are trees in practice, but
/// implementations are not trusted to guarantee it; the walk in
/// [`remove_descendants`] guards against cycles.
pub trait DecayGraph {
    /// The identity handed back by walks over this graph.
    type Node: Copy + Eq + Hash;

    /// The direct production parent of `node`, if recorded.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// The direct decay children of `node`.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;
}

/// Configuration for [`remove_descendants`].
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize)]
pub struct DescendantConfig {
    /// When `true`, an ancestor which also appears in the candidate list is
    /// removed along with its descendants; when `false` it survives.
    pub include_self: bool,
}

/// Filter from `candidates` every node which is a transitive decay child of
/// any node in `ancestors`, preserving candidate order.
///
/// This deduplicates a matched set when a target has absorbed both a parent
/// and its decay descendant, e.g. a jet ghost-matched to both a b-hadron and
/// the charm hadron it decays into. The walk is depth-first from each
/// ancestor with a visited set guarding against cycles on malformed input.
pub fn remove_descendants<G: DecayGraph>(
    graph: &G,
    ancestors: &[G::Node],
    candidates: &[G::Node],
    config: DescendantConfig,
) -> Vec<G::Node> {
    let mut doomed: IndexSet<G::Node> = IndexSet::new();
    let mut stack: Vec<G::Node> = Vec::new();
    for &ancestor in ancestors {
        if config.include_self {
            stack.push(ancestor);
        } else {
            stack.extend(graph.children(ancestor));
        }
        while let Some(node) = stack.pop() {
            if doomed.insert(node) {
                stack.extend(graph.children(node));
            }
        }
    }
    candidates
        .iter()
        .copied()
        .filter(|candidate| !doomed.contains(candidate))
        .collect()
}
