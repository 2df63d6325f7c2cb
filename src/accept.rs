use std::fmt::Display;

use indexmap::IndexMap;
use parking_lot::Mutex;
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{utils::enums::DuplicatePolicy, CutflowError, CutflowResult};

/// The default slot limit of a [`CutRegistry`].
///
/// Selection tools historically stored results in a 32-bit mask; the ceiling
/// is kept as a default so a runaway registration loop fails loudly, but it
/// can be raised via [`CutRegistry::with_capacity`].
pub const DEFAULT_CAPACITY: usize = 32;

const WORD_BITS: usize = u64::BITS as usize;

#[derive(Clone, Debug, Serialize, Deserialize)]
struct CutInfo {
    name: String,
    description: String,
}

/// An ordered registry of named boolean cuts.
///
/// A selection tool builds its registry once at initialization by calling
/// [`add_cut`](CutRegistry::add_cut) for each criterion, then treats it as
/// read-only: positions handed out by [`add_cut`](CutRegistry::add_cut) and
/// [`cut_position`](CutRegistry::cut_position) are stable for the lifetime of
/// the registry. Registration is not thread-safe and must happen before any
/// worker thread starts evaluating objects; every accessor after that point
/// takes `&self` and is safe to share.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CutRegistry {
    cuts: Vec<CutInfo>,
    lookup: IndexMap<String, usize>,
    capacity: usize,
    duplicate_policy: DuplicatePolicy,
}

impl Default for CutRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CutRegistry {
    /// Create an empty registry with [`DEFAULT_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create an empty registry with an explicit slot limit.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cuts: Vec::new(),
            lookup: IndexMap::new(),
            capacity,
            duplicate_policy: DuplicatePolicy::default(),
        }
    }

    /// Set the behavior of [`add_cut`](CutRegistry::add_cut) on a duplicate
    /// name (default: [`DuplicatePolicy::Reject`]).
    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    /// Register a new cut and return its position.
    ///
    /// # Errors
    ///
    /// Returns [`CutflowError::CapacityExceeded`] if the registry is full and
    /// [`CutflowError::DuplicateName`] if the name is taken and the registry
    /// was configured with [`DuplicatePolicy::Reject`]. Under
    /// [`DuplicatePolicy::ReuseSlot`] a duplicate registration returns the
    /// existing position and the stored description is left untouched. A
    /// failed call leaves the registry unchanged.
    pub fn add_cut(&mut self, name: &str, description: &str) -> CutflowResult<usize> {
        if let Some(&position) = self.lookup.get(name) {
            return match self.duplicate_policy {
                DuplicatePolicy::ReuseSlot => Ok(position),
                DuplicatePolicy::Reject => Err(CutflowError::DuplicateName {
                    category: "cut",
                    name: name.to_string(),
                }),
            };
        }
        if self.cuts.len() >= self.capacity {
            return Err(CutflowError::CapacityExceeded {
                capacity: self.capacity,
                name: name.to_string(),
            });
        }
        let position = self.cuts.len();
        self.cuts.push(CutInfo {
            name: name.to_string(),
            description: description.to_string(),
        });
        self.lookup.insert(name.to_string(), position);
        Ok(position)
    }

    /// Look up the position of a registered cut.
    ///
    /// # Errors
    ///
    /// Returns [`CutflowError::UnknownCut`] if no cut by that name was
    /// registered.
    pub fn cut_position(&self, name: &str) -> CutflowResult<usize> {
        self.lookup
            .get(name)
            .copied()
            .ok_or_else(|| CutflowError::UnknownCut {
                name: name.to_string(),
            })
    }

    /// The number of registered cuts.
    pub fn n_cuts(&self) -> usize {
        self.cuts.len()
    }

    /// True if no cuts have been registered.
    pub fn is_empty(&self) -> bool {
        self.cuts.is_empty()
    }

    /// The slot limit of this registry.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The name of the cut at `position`, if any.
    pub fn cut_name(&self, position: usize) -> Option<&str> {
        self.cuts.get(position).map(|cut| cut.name.as_str())
    }

    /// The description of the cut at `position`, if any.
    pub fn cut_description(&self, position: usize) -> Option<&str> {
        self.cuts.get(position).map(|cut| cut.description.as_str())
    }

    /// Iterate over `(name, description)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cuts
            .iter()
            .map(|cut| (cut.name.as_str(), cut.description.as_str()))
    }

    /// Allocate a fresh [`CutResult`] bound to this registry with every slot
    /// unset.
    pub fn new_result(&self) -> CutResult<'_> {
        let words = self.cuts.len().div_ceil(WORD_BITS);
        CutResult {
            registry: self,
            bits: vec![0; words],
        }
    }
}

/// The per-object outcome of a selection, one slot per registered cut.
///
/// Slots start out unset and an unset slot counts as failing, so
/// [`overall_pass`](CutResult::overall_pass) only returns `true` once every
/// registered cut has been explicitly set to `true`. This lets a tool grow a
/// feature-flagged cut mid-stream without retroactively passing objects
/// evaluated before the cut existed. Each result is owned by exactly one
/// evaluation call; it is cheap to copy and never shared between threads.
#[derive(Clone, Debug)]
pub struct CutResult<'a> {
    registry: &'a CutRegistry,
    bits: Vec<u64>,
}

impl<'a> CutResult<'a> {
    /// The registry this result was allocated from.
    pub fn registry(&self) -> &'a CutRegistry {
        self.registry
    }

    /// Record the outcome of the cut at `position`.
    ///
    /// # Errors
    ///
    /// Returns [`CutflowError::IndexOutOfRange`] for a position not handed
    /// out by the registry; that is a programming bug in the calling tool,
    /// not a data condition.
    pub fn set_cut_result(&mut self, position: usize, pass: bool) -> CutflowResult<()> {
        if position >= self.registry.n_cuts() {
            return Err(CutflowError::IndexOutOfRange {
                index: position,
                len: self.registry.n_cuts(),
            });
        }
        let (word, bit) = (position / WORD_BITS, position % WORD_BITS);
        if pass {
            self.bits[word] |= 1 << bit;
        } else {
            self.bits[word] &= !(1 << bit);
        }
        Ok(())
    }

    /// Record the outcome of a cut by name.
    ///
    /// # Errors
    ///
    /// Returns [`CutflowError::UnknownCut`] if the name is not registered.
    pub fn set(&mut self, name: &str, pass: bool) -> CutflowResult<()> {
        let position = self.registry.cut_position(name)?;
        self.set_cut_result(position, pass)
    }

    /// The recorded outcome of the cut at `position`; unset or out-of-range
    /// slots read as `false`.
    pub fn get_cut_result(&self, position: usize) -> bool {
        if position >= self.registry.n_cuts() {
            return false;
        }
        let (word, bit) = (position / WORD_BITS, position % WORD_BITS);
        self.bits[word] & (1 << bit) != 0
    }

    /// The recorded outcome of a cut by name.
    ///
    /// # Errors
    ///
    /// Returns [`CutflowError::UnknownCut`] if the name is not registered.
    pub fn get(&self, name: &str) -> CutflowResult<bool> {
        Ok(self.get_cut_result(self.registry.cut_position(name)?))
    }

    /// True iff every registered cut has been set to `true`.
    pub fn overall_pass(&self) -> bool {
        let n_cuts = self.registry.n_cuts();
        for (word_index, word) in self.bits.iter().enumerate() {
            let bits_in_word = (n_cuts - word_index * WORD_BITS).min(WORD_BITS);
            let mask = if bits_in_word == WORD_BITS {
                u64::MAX
            } else {
                (1 << bits_in_word) - 1
            };
            if word & mask != mask {
                return false;
            }
        }
        true
    }
}

#[derive(Clone, Debug, Default)]
struct CounterState {
    per_cut: Vec<u64>,
    processed: u64,
    passed: u64,
}

/// Thread-safe running pass statistics for one selection tool.
///
/// Created once per tool alongside its [`CutRegistry`], mutated on every
/// evaluation through [`record`](PassCounters::record), and read out at
/// finalize through [`snapshot`](PassCounters::snapshot). Counters are
/// monotonic and never reset mid-run. A single mutex serializes concurrent
/// recorders; the critical section is one pass over the registered cuts.
#[derive(Debug)]
pub struct PassCounters {
    names: Vec<String>,
    state: Mutex<CounterState>,
}

impl PassCounters {
    /// Create zeroed counters for every cut in `registry`.
    pub fn new(registry: &CutRegistry) -> Self {
        Self {
            names: registry.iter().map(|(name, _)| name.to_string()).collect(),
            state: Mutex::new(CounterState {
                per_cut: vec![0; registry.n_cuts()],
                ..CounterState::default()
            }),
        }
    }

    /// Fold one evaluated object into the counters: every passing slot
    /// increments its cut counter, the processed total always increments,
    /// and the passed total increments iff
    /// [`overall_pass`](CutResult::overall_pass).
    ///
    /// Recording is a counter increment, not a set insertion: recording the
    /// same result twice counts it twice. Safe to call concurrently from any
    /// number of threads.
    pub fn record(&self, result: &CutResult) {
        debug_assert_eq!(
            result.registry().n_cuts(),
            self.names.len(),
            "result must come from the registry these counters were built for"
        );
        let mut state = self.state.lock();
        state.processed += 1;
        for position in 0..state.per_cut.len() {
            if result.get_cut_result(position) {
                state.per_cut[position] += 1;
            }
        }
        if result.overall_pass() {
            state.passed += 1;
        }
    }

    /// Record a batch of results.
    #[cfg(feature = "rayon")]
    pub fn record_all(&self, results: &[CutResult]) {
        results.par_iter().for_each(|result| self.record(result));
    }

    /// Record a batch of results.
    #[cfg(not(feature = "rayon"))]
    pub fn record_all(&self, results: &[CutResult]) {
        results.iter().for_each(|result| self.record(result));
    }

    /// A consistent copy of the current counters.
    pub fn snapshot(&self) -> CutFlow {
        let state = self.state.lock();
        CutFlow {
            cuts: self
                .names
                .iter()
                .cloned()
                .zip(state.per_cut.iter().copied())
                .collect(),
            processed: state.processed,
            passed: state.passed,
        }
    }
}

/// A point-in-time copy of [`PassCounters`], suitable for end-of-run
/// reporting. The [`Display`] impl renders the classic cut-flow table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CutFlow {
    /// Per-cut pass counts in registration order.
    pub cuts: Vec<(String, u64)>,
    /// Total number of recorded objects.
    pub processed: u64,
    /// Number of recorded objects which passed every cut.
    pub passed: u64,
}

impl CutFlow {
    /// Fraction of processed objects which passed every cut (zero when
    /// nothing has been processed).
    pub fn efficiency(&self) -> f64 {
        if self.processed == 0 {
            0.0
        } else {
            self.passed as f64 / self.processed as f64
        }
    }
}

impl Display for CutFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "Cut flow: {} processed, {} passed ({:.2}%)",
            self.processed,
            self.passed,
            100.0 * self.efficiency()
        )?;
        for (position, (name, count)) in self.cuts.iter().enumerate() {
            writeln!(f, "  [{position:>2}] {name:<24} {count:>12}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eta_pt_registry() -> CutRegistry {
        let mut registry = CutRegistry::new();
        registry
            .add_cut("eta", "Selection on pseudorapidity")
            .unwrap();
        registry
            .add_cut("pt", "Selection on transverse momentum")
            .unwrap();
        registry
    }

    #[test]
    fn registration_assigns_sequential_positions() {
        let mut registry = CutRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.add_cut("eta", "eta window").unwrap(), 0);
        assert_eq!(registry.add_cut("pt", "pt threshold").unwrap(), 1);
        assert_eq!(registry.n_cuts(), 2);
        assert_eq!(registry.cut_position("eta").unwrap(), 0);
        assert_eq!(registry.cut_position("pt").unwrap(), 1);
        assert_eq!(registry.cut_name(1), Some("pt"));
        assert_eq!(registry.cut_description(0), Some("eta window"));
        assert!(matches!(
            registry.cut_position("iso"),
            Err(CutflowError::UnknownCut { .. })
        ));
    }

    #[test]
    fn duplicate_name_rejected_by_default() {
        let mut registry = eta_pt_registry();
        assert!(matches!(
            registry.add_cut("eta", "again"),
            Err(CutflowError::DuplicateName { .. })
        ));
        assert_eq!(registry.n_cuts(), 2);
    }

    #[test]
    fn duplicate_name_reuses_slot_when_configured() {
        let mut registry =
            CutRegistry::new().with_duplicate_policy(DuplicatePolicy::ReuseSlot);
        assert_eq!(registry.add_cut("eta", "eta window").unwrap(), 0);
        assert_eq!(registry.add_cut("eta", "another description").unwrap(), 0);
        assert_eq!(registry.n_cuts(), 1);
        assert_eq!(registry.cut_description(0), Some("eta window"));
    }

    #[test]
    fn capacity_exhaustion_leaves_registry_unchanged() {
        let mut registry = CutRegistry::new();
        for i in 0..DEFAULT_CAPACITY {
            registry.add_cut(&format!("cut{i}"), "").unwrap();
        }
        assert_eq!(registry.n_cuts(), DEFAULT_CAPACITY);
        assert!(matches!(
            registry.add_cut("one-too-many", ""),
            Err(CutflowError::CapacityExceeded { capacity: 32, .. })
        ));
        assert_eq!(registry.n_cuts(), DEFAULT_CAPACITY);
        assert!(registry.cut_position("one-too-many").is_err());
    }

    #[test]
    fn relaxed_capacity_crosses_word_boundaries() {
        let mut registry = CutRegistry::with_capacity(130);
        for i in 0..130 {
            registry.add_cut(&format!("cut{i}"), "").unwrap();
        }
        let mut result = registry.new_result();
        for position in 0..130 {
            assert!(!result.overall_pass());
            result.set_cut_result(position, true).unwrap();
        }
        assert!(result.overall_pass());
        result.set_cut_result(129, false).unwrap();
        assert!(!result.overall_pass());
    }

    #[test]
    fn unset_slot_counts_as_fail() {
        let registry = eta_pt_registry();
        let mut result = registry.new_result();
        result.set("eta", true).unwrap();
        assert!(result.get("eta").unwrap());
        assert!(!result.get("pt").unwrap());
        assert!(!result.overall_pass());
        result.set("pt", true).unwrap();
        assert!(result.overall_pass());
        result.set("eta", false).unwrap();
        assert!(!result.overall_pass());
    }

    #[test]
    fn empty_registry_passes_trivially() {
        let registry = CutRegistry::new();
        assert!(registry.new_result().overall_pass());
    }

    #[test]
    fn out_of_range_position_is_an_error() {
        let registry = eta_pt_registry();
        let mut result = registry.new_result();
        assert!(matches!(
            result.set_cut_result(2, true),
            Err(CutflowError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert!(!result.get_cut_result(17));
        assert!(matches!(
            result.set("iso", true),
            Err(CutflowError::UnknownCut { .. })
        ));
    }

    #[test]
    fn counters_accumulate_per_cut_and_totals() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);

        let mut pass_both = registry.new_result();
        pass_both.set("eta", true).unwrap();
        pass_both.set("pt", true).unwrap();
        let mut pass_eta = registry.new_result();
        pass_eta.set("eta", true).unwrap();
        let fail_all = registry.new_result();

        counters.record(&pass_both);
        counters.record(&pass_eta);
        counters.record(&fail_all);

        let flow = counters.snapshot();
        assert_eq!(flow.processed, 3);
        assert_eq!(flow.passed, 1);
        assert_eq!(flow.cuts[0], ("eta".to_string(), 2));
        assert_eq!(flow.cuts[1], ("pt".to_string(), 1));
    }

    #[test]
    fn recording_is_not_idempotent() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);
        let mut result = registry.new_result();
        result.set("eta", true).unwrap();
        result.set("pt", true).unwrap();
        counters.record(&result);
        counters.record(&result);
        let flow = counters.snapshot();
        assert_eq!(flow.processed, 2);
        assert_eq!(flow.passed, 2);
        assert_eq!(flow.cuts[0].1, 2);
        assert_eq!(flow.cuts[1].1, 2);
    }

    #[test]
    fn concurrent_recording_sums_exactly() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);
        let mut result = registry.new_result();
        result.set("eta", true).unwrap();
        result.set("pt", true).unwrap();
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..1000 {
                        counters.record(&result);
                    }
                });
            }
        });
        let flow = counters.snapshot();
        assert_eq!(flow.processed, 8000);
        assert_eq!(flow.passed, 8000);
        assert_eq!(flow.cuts[0].1, 8000);
    }

    #[test]
    fn record_all_matches_sequential_recording() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);
        let mut passing = registry.new_result();
        passing.set("eta", true).unwrap();
        passing.set("pt", true).unwrap();
        let results = vec![passing.clone(), registry.new_result(), passing];
        counters.record_all(&results);
        let flow = counters.snapshot();
        assert_eq!(flow.processed, 3);
        assert_eq!(flow.passed, 2);
        assert_eq!(flow.cuts[0].1, 2);
    }

    #[test]
    fn cut_flow_display_lists_every_cut() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);
        let mut result = registry.new_result();
        result.set("eta", true).unwrap();
        counters.record(&result);
        let rendered = counters.snapshot().to_string();
        assert!(rendered.contains("1 processed, 0 passed"));
        assert!(rendered.contains("eta"));
        assert!(rendered.contains("pt"));
    }

    #[test]
    fn efficiency_handles_empty_counters() {
        let registry = eta_pt_registry();
        let counters = PassCounters::new(&registry);
        assert_eq!(counters.snapshot().efficiency(), 0.0);
    }
}
