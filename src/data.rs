use serde::{Deserialize, Serialize};

use crate::{
    matching::{Candidate, DecayGraph},
    utils::vectors::Vec4,
};

/// A concrete particle candidate: a four-momentum plus the PDG Monte Carlo
/// particle number identifying its species.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// The particle's four-momentum.
    pub p4: Vec4,
    /// PDG Monte Carlo particle number (zero if unknown).
    pub pdg_id: i32,
}

impl Particle {
    pub fn new(p4: Vec4, pdg_id: i32) -> Self {
        Self { p4, pdg_id }
    }
}

impl Candidate for Particle {
    fn pt(&self) -> f64 {
        self.p4.pt()
    }
    fn eta(&self) -> f64 {
        self.p4.eta()
    }
    fn phi(&self) -> f64 {
        self.p4.phi()
    }
}

/// An arena of [`Particle`]s with parent/child decay links, addressed by
/// index.
///
/// This is the owned representation of a truth record that callers can build
/// from whatever event store they use; it implements
/// [`DecayGraph`] so matched sets over it can be deduplicated with
/// [`remove_descendants`](crate::matching::remove_descendants). Links are
/// directional: [`link`](DecayStore::link) records `child` as a decay product
/// of `parent` and sets the child's parent pointer.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DecayStore {
    particles: Vec<Particle>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl DecayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unlinked particle and return its index.
    pub fn push(&mut self, particle: Particle) -> usize {
        let index = self.particles.len();
        self.particles.push(particle);
        self.parents.push(None);
        self.children.push(Vec::new());
        index
    }

    /// Add a particle as a decay product of `parent` and return its index.
    pub fn push_child(&mut self, parent: usize, particle: Particle) -> usize {
        let child = self.push(particle);
        self.link(parent, child);
        child
    }

    /// Record `child` as a decay product of `parent`.
    pub fn link(&mut self, parent: usize, child: usize) {
        self.children[parent].push(child);
        self.parents[child] = Some(parent);
    }

    /// The particle at `index`.
    pub fn particle(&self, index: usize) -> &Particle {
        &self.particles[index]
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Iterate over the stored particles in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }
}

impl DecayGraph for DecayStore {
    type Node = usize;

    fn parent(&self, node: usize) -> Option<usize> {
        self.parents[node]
    }

    fn children(&self, node: usize) -> Vec<usize> {
        self.children[node].clone()
    }
}

/// A small decay record that can be used to test descendant walks: a
/// $`B^+ \to \bar{D}^0 \pi^+`$ chain with the charm hadron decaying to
/// $`K^+ \pi^-`$, plus one unrelated photon.
///
/// Indices: 0 = B hadron, 1 = charm hadron (child of 0), 2 and 3 = kaon and
/// pion (children of 1), 4 = photon with no links.
pub fn test_decay_store() -> DecayStore {
    let mut store = DecayStore::new();
    let b_hadron = store.push(Particle::new(
        Vec4::from_pt_eta_phi_m(42.0, 0.31, 1.07, 5.279),
        521,
    ));
    let c_hadron = store.push_child(
        b_hadron,
        Particle::new(Vec4::from_pt_eta_phi_m(28.0, 0.33, 1.10, 1.865), -421),
    );
    store.push_child(
        c_hadron,
        Particle::new(Vec4::from_pt_eta_phi_m(17.0, 0.35, 1.12, 0.494), 321),
    );
    store.push_child(
        c_hadron,
        Particle::new(Vec4::from_pt_eta_phi_m(11.0, 0.30, 1.05, 0.140), -211),
    );
    store.push(Particle::new(
        Vec4::from_pt_eta_phi_m(6.0, -1.8, -2.4, 0.0),
        22,
    ));
    store
}
