use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::element;
use crate::traits::{HasAtomicNum, HasHydrogenCount};

/// A substituent slot around a stereo centre.
///
/// Real neighbours are graph nodes. An implicit hydrogen and the lone pair
/// of a three-coordinate N, P, S, … are virtual slots owned by the centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AtomId {
    Node(NodeIndex),
    ImplicitH(NodeIndex),
    LonePair(NodeIndex),
}

impl AtomId {
    pub fn node(&self) -> Option<NodeIndex> {
        match self {
            AtomId::Node(n) => Some(*n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomParity {
    /// Looking from the first neighbour, the other three run counter-clockwise (`@`).
    Left,
    /// Clockwise (`@@`).
    Right,
}

impl AtomParity {
    pub fn inverted(self) -> Self {
        match self {
            AtomParity::Left => AtomParity::Right,
            AtomParity::Right => AtomParity::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TetrahedralStereo {
    pub center: NodeIndex,
    pub neighbors: [AtomId; 4],
    pub parity: AtomParity,
}

impl TetrahedralStereo {
    /// Parity of this centre when its neighbours are listed in `order`.
    ///
    /// Returns `None` when `order` is not a permutation of the stored
    /// neighbours.
    pub fn parity_for(&self, order: &[AtomId; 4]) -> Option<AtomParity> {
        let even = permutation_parity(&self.neighbors, order)?;
        Some(if even {
            self.parity
        } else {
            self.parity.inverted()
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DoubleBondConfig {
    Cis,
    Trans,
}

impl DoubleBondConfig {
    pub fn flipped(self) -> Self {
        match self {
            DoubleBondConfig::Cis => DoubleBondConfig::Trans,
            DoubleBondConfig::Trans => DoubleBondConfig::Cis,
        }
    }
}

/// E/Z descriptor. `refs[0]` hangs off `bond.0`, `refs[1]` off `bond.1`,
/// and `config` relates those two substituents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EZStereo {
    pub bond: (NodeIndex, NodeIndex),
    pub refs: [AtomId; 2],
    pub config: DoubleBondConfig,
}

fn ordered(a: NodeIndex, b: NodeIndex) -> (NodeIndex, NodeIndex) {
    if a.index() < b.index() {
        (a, b)
    } else {
        (b, a)
    }
}

pub struct Mol<A, B> {
    graph: UnGraph<A, B>,
    tetrahedral_stereo: Vec<TetrahedralStereo>,
    ez_stereo: Vec<EZStereo>,
}

impl<A, B> Mol<A, B> {
    pub fn new() -> Self {
        Self {
            graph: UnGraph::default(),
            tetrahedral_stereo: Vec::new(),
            ez_stereo: Vec::new(),
        }
    }

    pub fn graph(&self) -> &UnGraph<A, B> {
        &self.graph
    }

    pub fn atom(&self, idx: NodeIndex) -> &A {
        &self.graph[idx]
    }

    pub fn atom_mut(&mut self, idx: NodeIndex) -> &mut A {
        &mut self.graph[idx]
    }

    pub fn bond(&self, idx: EdgeIndex) -> &B {
        &self.graph[idx]
    }

    pub fn bond_mut(&mut self, idx: EdgeIndex) -> &mut B {
        &mut self.graph[idx]
    }

    pub fn add_atom(&mut self, atom: A) -> NodeIndex {
        self.graph.add_node(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: B) -> EdgeIndex {
        self.graph.add_edge(a, b, bond)
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn degree(&self, idx: NodeIndex) -> usize {
        self.graph.edges(idx).count()
    }

    /// Neighbours in ascending index order.
    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let mut nbrs: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        nbrs.sort_unstable();
        nbrs.into_iter()
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edges(idx).map(|e| e.id())
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = EdgeIndex> + '_ {
        self.graph.edge_indices()
    }

    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<EdgeIndex> {
        self.graph.find_edge(a, b)
    }

    pub fn bond_endpoints(&self, idx: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.graph.edge_endpoints(idx)
    }

    pub fn other_end(&self, bond: EdgeIndex, atom: NodeIndex) -> Option<NodeIndex> {
        let (a, b) = self.bond_endpoints(bond)?;
        if a == atom {
            Some(b)
        } else if b == atom {
            Some(a)
        } else {
            None
        }
    }

    pub fn tetrahedral_stereo(&self) -> &[TetrahedralStereo] {
        &self.tetrahedral_stereo
    }

    pub fn set_tetrahedral_stereo(&mut self, stereo: Vec<TetrahedralStereo>) {
        self.tetrahedral_stereo = stereo;
    }

    pub fn tetrahedral_stereo_for(&self, center: NodeIndex) -> Option<&TetrahedralStereo> {
        self.tetrahedral_stereo.iter().find(|s| s.center == center)
    }

    pub fn add_tetrahedral_stereo(&mut self, stereo: TetrahedralStereo) {
        self.remove_tetrahedral_stereo(stereo.center);
        self.tetrahedral_stereo.push(stereo);
    }

    pub fn remove_tetrahedral_stereo(&mut self, center: NodeIndex) -> bool {
        let before = self.tetrahedral_stereo.len();
        self.tetrahedral_stereo.retain(|s| s.center != center);
        before != self.tetrahedral_stereo.len()
    }

    /// Flips the stored parity of `center`. Returns `false` if it has none.
    pub fn invert_atom_stereo(&mut self, center: NodeIndex) -> bool {
        match self
            .tetrahedral_stereo
            .iter_mut()
            .find(|s| s.center == center)
        {
            Some(s) => {
                s.parity = s.parity.inverted();
                true
            }
            None => false,
        }
    }

    pub fn ez_stereo(&self) -> &[EZStereo] {
        &self.ez_stereo
    }

    pub fn set_ez_stereo(&mut self, stereo: Vec<EZStereo>) {
        self.ez_stereo = stereo;
    }

    /// The descriptor is returned oriented so that `refs[0]` belongs to `a`.
    pub fn ez_stereo_for(&self, a: NodeIndex, b: NodeIndex) -> Option<EZStereo> {
        let key = ordered(a, b);
        let found = self.ez_stereo.iter().find(|s| ordered(s.bond.0, s.bond.1) == key)?;
        if found.bond.0 == a {
            Some(*found)
        } else {
            Some(EZStereo {
                bond: (found.bond.1, found.bond.0),
                refs: [found.refs[1], found.refs[0]],
                config: found.config,
            })
        }
    }

    pub fn add_ez_stereo(&mut self, stereo: EZStereo) {
        self.remove_ez_stereo(stereo.bond.0, stereo.bond.1);
        self.ez_stereo.push(stereo);
    }

    pub fn remove_ez_stereo(&mut self, a: NodeIndex, b: NodeIndex) -> bool {
        let key = ordered(a, b);
        let before = self.ez_stereo.len();
        self.ez_stereo.retain(|s| ordered(s.bond.0, s.bond.1) != key);
        before != self.ez_stereo.len()
    }

    pub fn clear_stereo(&mut self) {
        self.tetrahedral_stereo.clear();
        self.ez_stereo.clear();
    }
}

impl<A: HasAtomicNum + HasHydrogenCount, B> Mol<A, B> {
    /// Neighbours that are not hydrogen.
    pub fn heavy_degree(&self, idx: NodeIndex) -> usize {
        self.graph
            .neighbors(idx)
            .filter(|&n| self.graph[n].atomic_num() != 1)
            .count()
    }

    /// Explicit neighbours plus implicit hydrogens.
    pub fn total_degree(&self, idx: NodeIndex) -> usize {
        self.degree(idx) + self.graph[idx].hydrogen_count() as usize
    }

    /// Explicit hydrogen neighbours plus implicit hydrogens.
    pub fn total_hydrogens(&self, idx: NodeIndex) -> usize {
        let explicit = self
            .graph
            .neighbors(idx)
            .filter(|&n| self.graph[n].atomic_num() == 1)
            .count();
        explicit + self.graph[idx].hydrogen_count() as usize
    }

    /// Substituent slots around `center` in a fixed order: explicit
    /// neighbours by index, then one implicit hydrogen, then a lone pair for
    /// three-coordinate atoms that carry one.
    pub fn stereo_substituents(&self, center: NodeIndex) -> Vec<AtomId> {
        let mut subs: Vec<AtomId> = self.neighbors(center).map(AtomId::Node).collect();
        let h = self.graph[center].hydrogen_count() as usize;
        for _ in 0..h.min(1) {
            subs.push(AtomId::ImplicitH(center));
        }
        let total = self.degree(center) + h;
        if total == 3 && element::has_lone_pair_stereo(self.graph[center].atomic_num()) {
            subs.push(AtomId::LonePair(center));
        }
        subs
    }

    /// Number of distinct substituent slots, counting every implicit H.
    pub fn substituent_count(&self, center: NodeIndex) -> usize {
        let total = self.total_degree(center);
        if total == 3 && element::has_lone_pair_stereo(self.graph[center].atomic_num()) {
            4
        } else {
            total
        }
    }

    /// `true` when `order` lists exactly the stereo substituents of `center`.
    fn is_substituent_order(&self, center: NodeIndex, order: &[AtomId; 4]) -> bool {
        if self.substituent_count(center) != 4 {
            return false;
        }
        let subs = self.stereo_substituents(center);
        subs.len() == 4 && permutation_parity(&subs, order).is_some()
    }

    /// The substituents of `center` as a fixed-size array, if it has four.
    pub fn substituent_array(&self, center: NodeIndex) -> Option<[AtomId; 4]> {
        if self.substituent_count(center) != 4 {
            return None;
        }
        self.stereo_substituents(center).try_into().ok()
    }

    pub fn has_atom_stereo(&self, center: NodeIndex) -> bool {
        self.tetrahedral_stereo_for(center).is_some()
    }

    /// Parity of `center` with its neighbours listed in `order`.
    pub fn atom_parity(&self, center: NodeIndex, order: &[AtomId; 4]) -> Option<AtomParity> {
        self.tetrahedral_stereo_for(center)?.parity_for(order)
    }

    /// Stores `parity` over `order`. Returns `false` when `order` is not a
    /// permutation of the atom's four stereo substituents.
    pub fn set_atom_parity(
        &mut self,
        center: NodeIndex,
        order: [AtomId; 4],
        parity: AtomParity,
    ) -> bool {
        if !self.is_substituent_order(center, &order) {
            return false;
        }
        self.add_tetrahedral_stereo(TetrahedralStereo {
            center,
            neighbors: order,
            parity,
        });
        true
    }

    /// Substituents of `atom` that can serve as a double-bond reference,
    /// excluding the partner `across`.
    pub fn bond_substituents(&self, atom: NodeIndex, across: NodeIndex) -> Vec<AtomId> {
        self.stereo_substituents(atom)
            .into_iter()
            .filter(|s| *s != AtomId::Node(across))
            .collect()
    }

    /// Configuration of the double bond `a`=`b` expressed over `ref_a` and
    /// `ref_b`. Each reference that is not the stored one flips the answer.
    pub fn bond_config(
        &self,
        a: NodeIndex,
        b: NodeIndex,
        ref_a: AtomId,
        ref_b: AtomId,
    ) -> Option<DoubleBondConfig> {
        let stored = self.ez_stereo_for(a, b)?;
        let mut config = stored.config;
        if stored.refs[0] != ref_a {
            config = config.flipped();
        }
        if stored.refs[1] != ref_b {
            config = config.flipped();
        }
        Some(config)
    }

    /// Returns `false` unless `a`=`b` is a double bond and each reference
    /// is a substituent of its own end.
    pub fn set_bond_config(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        ref_a: AtomId,
        ref_b: AtomId,
        config: DoubleBondConfig,
    ) -> bool
    where
        B: crate::traits::HasBondOrder,
    {
        let Some(edge) = self.bond_between(a, b) else {
            return false;
        };
        if self.bond(edge).bond_order() != crate::bond::BondOrder::Double {
            return false;
        }
        if !self.bond_substituents(a, b).contains(&ref_a)
            || !self.bond_substituents(b, a).contains(&ref_b)
        {
            return false;
        }
        self.add_ez_stereo(EZStereo {
            bond: (a, b),
            refs: [ref_a, ref_b],
            config,
        });
        true
    }
}

impl<A: Clone, B: Clone> Clone for Mol<A, B> {
    fn clone(&self) -> Self {
        Self {
            graph: self.graph.clone(),
            tetrahedral_stereo: self.tetrahedral_stereo.clone(),
            ez_stereo: self.ez_stereo.clone(),
        }
    }
}

impl<A, B> Default for Mol<A, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: PartialEq, B: PartialEq> PartialEq for Mol<A, B> {
    fn eq(&self, other: &Self) -> bool {
        if self.atom_count() != other.atom_count() || self.bond_count() != other.bond_count() {
            return false;
        }
        if self.atoms().any(|idx| self.atom(idx) != other.atom(idx)) {
            return false;
        }
        for idx in self.bonds() {
            if self.bond(idx) != other.bond(idx)
                || self.bond_endpoints(idx) != other.bond_endpoints(idx)
            {
                return false;
            }
        }
        self.tetrahedral_stereo == other.tetrahedral_stereo && self.ez_stereo == other.ez_stereo
    }
}

impl<A: std::fmt::Debug, B: std::fmt::Debug> std::fmt::Debug for Mol<A, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mol")
            .field("atom_count", &self.atom_count())
            .field("bond_count", &self.bond_count())
            .field("tetrahedral_stereo", &self.tetrahedral_stereo)
            .field("ez_stereo", &self.ez_stereo)
            .finish()
    }
}

/// `Some(true)` when `to` is an even permutation of `from`.
pub(crate) fn permutation_parity<T: Eq>(from: &[T], to: &[T]) -> Option<bool> {
    let n = from.len();
    if n != to.len() {
        return None;
    }
    let mut perm = Vec::with_capacity(n);
    for f in from {
        perm.push(to.iter().position(|t| t == f)?);
    }
    let mut visited = vec![false; n];
    let mut swaps = 0usize;
    for i in 0..n {
        if visited[i] {
            continue;
        }
        let mut cycle_len = 0;
        let mut j = i;
        while !visited[j] {
            visited[j] = true;
            j = perm[j];
            cycle_len += 1;
        }
        swaps += cycle_len - 1;
    }
    Some(swaps % 2 == 0)
}
