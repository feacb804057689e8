use std::collections::{HashSet, VecDeque};

use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::mol::{AtomId, Mol};
use crate::{Atom, Bond};

/// `(query, target)` pairs in query traversal order.
pub type AtomMapping = Vec<(NodeIndex, NodeIndex)>;

type PartialCheck<'a> = Box<dyn Fn(NodeIndex, &[Option<NodeIndex>]) -> bool + 'a>;

/// Backtracking subgraph matcher.
///
/// Predicates take node/edge indices rather than payloads so callers can
/// consult side tables (ring info, symmetry classes) keyed by index. The
/// match is not induced: target bonds absent from the query are ignored.
pub struct Vf2<'a, A1, B1, A2, B2, FA, FB> {
    target: &'a Mol<A1, B1>,
    query: &'a Mol<A2, B2>,
    atom_match: FA,
    bond_match: FB,
    partial: Option<PartialCheck<'a>>,
    query_order: Vec<NodeIndex>,
    query_map: Vec<Option<NodeIndex>>,
    target_used: Vec<bool>,
}

impl<'a, A1, B1, A2, B2, FA, FB> Vf2<'a, A1, B1, A2, B2, FA, FB>
where
    FA: Fn(NodeIndex, NodeIndex) -> bool,
    FB: Fn(EdgeIndex, EdgeIndex) -> bool,
{
    /// `atom_match(target, query)` and `bond_match(target, query)`.
    pub fn new(
        target: &'a Mol<A1, B1>,
        query: &'a Mol<A2, B2>,
        atom_match: FA,
        bond_match: FB,
    ) -> Self {
        Self {
            target,
            query,
            atom_match,
            bond_match,
            partial: None,
            query_order: connectivity_order(query),
            query_map: vec![None; query.atom_count()],
            target_used: vec![false; target.atom_count()],
        }
    }

    /// Called after each query atom is mapped, with that atom and the
    /// current query-indexed mapping. Returning `false` prunes the branch.
    pub fn with_partial_check(
        mut self,
        check: impl Fn(NodeIndex, &[Option<NodeIndex>]) -> bool + 'a,
    ) -> Self {
        self.partial = Some(Box::new(check));
        self
    }

    pub fn find_first(&mut self) -> Option<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, true);
        results.into_iter().next()
    }

    pub fn find_all(&mut self) -> Vec<AtomMapping> {
        let mut results = Vec::new();
        self.recurse(0, &mut results, false);
        results
    }

    fn recurse(&mut self, depth: usize, results: &mut Vec<AtomMapping>, first_only: bool) {
        if depth == self.query_order.len() {
            let mapping = self
                .query_order
                .iter()
                .filter_map(|&qn| self.query_map[qn.index()].map(|t| (qn, t)))
                .collect();
            results.push(mapping);
            return;
        }

        let query_node = self.query_order[depth];
        for target_node in self.candidates(query_node) {
            if self.target_used[target_node.index()] || !self.is_feasible(query_node, target_node)
            {
                continue;
            }

            self.query_map[query_node.index()] = Some(target_node);
            self.target_used[target_node.index()] = true;

            let accepted = match &self.partial {
                Some(check) => check(query_node, &self.query_map),
                None => true,
            };
            if accepted {
                self.recurse(depth + 1, results, first_only);
            }

            self.query_map[query_node.index()] = None;
            self.target_used[target_node.index()] = false;

            if first_only && !results.is_empty() {
                return;
            }
        }
    }

    /// Images of an already-mapped query neighbour's target neighbours, or
    /// every target atom when the query atom starts a new component.
    fn candidates(&self, query_node: NodeIndex) -> Vec<NodeIndex> {
        let anchor = self
            .query
            .neighbors(query_node)
            .find_map(|qn| self.query_map[qn.index()]);
        match anchor {
            Some(t) => self.target.neighbors(t).collect(),
            None => self.target.atoms().collect(),
        }
    }

    fn is_feasible(&self, query_node: NodeIndex, target_node: NodeIndex) -> bool {
        if !(self.atom_match)(target_node, query_node) {
            return false;
        }
        for q_neighbor in self.query.neighbors(query_node) {
            let Some(t_mapped) = self.query_map[q_neighbor.index()] else {
                continue;
            };
            let Some(q_bond) = self.query.bond_between(query_node, q_neighbor) else {
                return false;
            };
            match self.target.bond_between(target_node, t_mapped) {
                Some(t_bond) if (self.bond_match)(t_bond, q_bond) => {}
                _ => return false,
            }
        }
        true
    }
}

/// Breadth-first order from the highest-degree atom of each component, so
/// every query atom after the first in its component has a mapped neighbour.
fn connectivity_order<A, B>(query: &Mol<A, B>) -> Vec<NodeIndex> {
    let mut seeds: Vec<NodeIndex> = query.atoms().collect();
    seeds.sort_by_key(|&a| std::cmp::Reverse(query.degree(a)));
    let mut seen = vec![false; query.atom_count()];
    let mut order = Vec::with_capacity(query.atom_count());
    for seed in seeds {
        if seen[seed.index()] {
            continue;
        }
        seen[seed.index()] = true;
        let mut queue = VecDeque::from([seed]);
        while let Some(cur) = queue.pop_front() {
            order.push(cur);
            for nb in query.neighbors(cur) {
                if !seen[nb.index()] {
                    seen[nb.index()] = true;
                    queue.push_back(nb);
                }
            }
        }
    }
    order
}

pub fn substruct_matches_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Vec<AtomMapping> {
    Vf2::new(target, query, atom_match, bond_match).find_all()
}

/// All matches, keeping only the first mapping onto each target atom set.
pub fn unique_substruct_matches_with<A1, B1, A2, B2>(
    target: &Mol<A1, B1>,
    query: &Mol<A2, B2>,
    atom_match: impl Fn(NodeIndex, NodeIndex) -> bool,
    bond_match: impl Fn(EdgeIndex, EdgeIndex) -> bool,
) -> Vec<AtomMapping> {
    let mut seen: HashSet<Vec<NodeIndex>> = HashSet::new();
    substruct_matches_with(target, query, atom_match, bond_match)
        .into_iter()
        .filter(|mapping| {
            let mut key: Vec<NodeIndex> = mapping.iter().map(|&(_, t)| t).collect();
            key.sort_unstable();
            seen.insert(key)
        })
        .collect()
}

/// Exact, stereo-aware match of a molecule against a copy of itself.
///
/// `query` and `target` share atom indices; `classes` holds one symmetry
/// class per index and constrains the mapping on both sides.
pub trait SelfMatcher: Send + Sync {
    fn self_match(&self, query: &Mol<Atom, Bond>, target: &Mol<Atom, Bond>, classes: &[usize])
        -> bool;
}

/// [`SelfMatcher`] backed by [`Vf2`], pruning on stereo as soon as every
/// atom a descriptor mentions has been mapped.
#[derive(Debug, Clone, Copy, Default)]
pub struct Vf2SelfMatcher;

impl SelfMatcher for Vf2SelfMatcher {
    fn self_match(
        &self,
        query: &Mol<Atom, Bond>,
        target: &Mol<Atom, Bond>,
        classes: &[usize],
    ) -> bool {
        if query.atom_count() != target.atom_count() || query.bond_count() != target.bond_count() {
            return false;
        }
        let class_of = |idx: NodeIndex| classes.get(idx.index()).copied();
        let atom_match = |t: NodeIndex, q: NodeIndex| {
            let (ta, qa) = (target.atom(t), query.atom(q));
            ta.atomic_num == qa.atomic_num
                && ta.formal_charge == qa.formal_charge
                && ta.isotope == qa.isotope
                && ta.is_aromatic == qa.is_aromatic
                && ta.hydrogen_count == qa.hydrogen_count
                && target.degree(t) == query.degree(q)
                && class_of(t) == class_of(q)
        };
        let bond_match = |t: EdgeIndex, q: EdgeIndex| {
            let (tb, qb) = (target.bond(t), query.bond(q));
            tb.order == qb.order && tb.is_aromatic == qb.is_aromatic
        };
        Vf2::new(target, query, atom_match, bond_match)
            .with_partial_check(|_, map| stereo_consistent(query, target, map))
            .find_first()
            .is_some()
    }
}

fn map_id(id: AtomId, map: &[Option<NodeIndex>]) -> Option<AtomId> {
    let image = |n: NodeIndex| map.get(n.index()).copied().flatten();
    Some(match id {
        AtomId::Node(n) => AtomId::Node(image(n)?),
        AtomId::ImplicitH(c) => AtomId::ImplicitH(image(c)?),
        AtomId::LonePair(c) => AtomId::LonePair(image(c)?),
    })
}

/// Every query descriptor whose atoms are all mapped is reproduced on the
/// target. Descriptors that are still partly unmapped pass.
fn stereo_consistent(
    query: &Mol<Atom, Bond>,
    target: &Mol<Atom, Bond>,
    map: &[Option<NodeIndex>],
) -> bool {
    for stereo in query.tetrahedral_stereo() {
        let Some(AtomId::Node(center)) = map_id(AtomId::Node(stereo.center), map) else {
            continue;
        };
        let mapped: Option<Vec<AtomId>> =
            stereo.neighbors.iter().map(|&n| map_id(n, map)).collect();
        let Some(order) = mapped.and_then(|v| <[AtomId; 4]>::try_from(v).ok()) else {
            continue;
        };
        if target.atom_parity(center, &order) != Some(stereo.parity) {
            return false;
        }
    }
    for ez in query.ez_stereo() {
        let ends = (
            map_id(AtomId::Node(ez.bond.0), map),
            map_id(AtomId::Node(ez.bond.1), map),
            map_id(ez.refs[0], map),
            map_id(ez.refs[1], map),
        );
        let (Some(AtomId::Node(a)), Some(AtomId::Node(b)), Some(ra), Some(rb)) = ends else {
            continue;
        };
        if target.bond_config(a, b, ra, rb) != Some(ez.config) {
            return false;
        }
    }
    true
}
