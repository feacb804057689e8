use std::collections::VecDeque;

use petgraph::algo::connected_components;
use petgraph::graph::{EdgeIndex, NodeIndex};
use petgraph::unionfind::UnionFind;

use crate::mol::Mol;

/// Ring membership, smallest ring sizes and ring systems of one molecule.
///
/// A bond is a ring bond iff its endpoints stay connected once the bond is
/// removed. The smallest ring through a bond is that alternative path plus
/// the bond itself; the smallest ring through an atom is the minimum over
/// its ring bonds.
#[derive(Debug, Clone)]
pub struct RingInfo {
    bond_ring_size: Vec<Option<usize>>,
    atom_ring_size: Vec<Option<usize>>,
    ring_bond_count: Vec<usize>,
    ring_system: Vec<usize>,
    num_rings: usize,
}

impl RingInfo {
    pub fn perceive<A, B>(mol: &Mol<A, B>) -> Self {
        let n = mol.atom_count();
        let mut bond_ring_size = vec![None; mol.bond_count()];
        let mut atom_ring_size: Vec<Option<usize>> = vec![None; n];
        let mut ring_bond_count = vec![0usize; n];

        for edge in mol.bonds() {
            let Some((u, v)) = mol.bond_endpoints(edge) else {
                continue;
            };
            let Some(path) = shortest_path_avoiding(mol, u, v, edge) else {
                continue;
            };
            let size = path + 1;
            bond_ring_size[edge.index()] = Some(size);
            for atom in [u, v] {
                ring_bond_count[atom.index()] += 1;
                let slot = &mut atom_ring_size[atom.index()];
                *slot = Some(slot.map_or(size, |s| s.min(size)));
            }
        }

        let mut uf = UnionFind::<usize>::new(n);
        for edge in mol.bonds() {
            if bond_ring_size[edge.index()].is_none() {
                continue;
            }
            if let Some((u, v)) = mol.bond_endpoints(edge) {
                uf.union(u.index(), v.index());
            }
        }
        let mut ring_system = vec![0usize; n];
        let mut ids: Vec<(usize, usize)> = Vec::new();
        for atom in 0..n {
            if ring_bond_count[atom] == 0 {
                continue;
            }
            let root = uf.find(atom);
            let id = match ids.iter().find(|(r, _)| *r == root) {
                Some((_, id)) => *id,
                None => {
                    let id = ids.len() + 1;
                    ids.push((root, id));
                    id
                }
            };
            ring_system[atom] = id;
        }

        let num_rings = (mol.bond_count() + connected_components(mol.graph())).saturating_sub(n);

        Self {
            bond_ring_size,
            atom_ring_size,
            ring_bond_count,
            ring_system,
            num_rings,
        }
    }

    /// Cyclomatic number (size of the cycle basis).
    pub fn num_rings(&self) -> usize {
        self.num_rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.ring_bond_count
            .get(atom.index())
            .is_some_and(|&c| c > 0)
    }

    pub fn is_ring_bond(&self, bond: EdgeIndex) -> bool {
        self.bond_ring_size(bond).is_some()
    }

    pub fn ring_bond_count(&self, atom: NodeIndex) -> usize {
        self.ring_bond_count.get(atom.index()).copied().unwrap_or(0)
    }

    pub fn bond_ring_size(&self, bond: EdgeIndex) -> Option<usize> {
        self.bond_ring_size.get(bond.index()).copied().flatten()
    }

    pub fn smallest_ring_size(&self, atom: NodeIndex) -> Option<usize> {
        self.atom_ring_size.get(atom.index()).copied().flatten()
    }

    /// 1-based ring-system id, or 0 for acyclic atoms.
    pub fn ring_system(&self, atom: NodeIndex) -> usize {
        self.ring_system.get(atom.index()).copied().unwrap_or(0)
    }

    pub fn num_ring_systems(&self) -> usize {
        self.ring_system.iter().copied().max().unwrap_or(0)
    }
}

/// Bond count of the shortest `from`-`to` path that does not use `skip`.
fn shortest_path_avoiding<A, B>(
    mol: &Mol<A, B>,
    from: NodeIndex,
    to: NodeIndex,
    skip: EdgeIndex,
) -> Option<usize> {
    let mut dist = vec![usize::MAX; mol.atom_count()];
    dist[from.index()] = 0;
    let mut queue = VecDeque::from([from]);
    while let Some(cur) = queue.pop_front() {
        for edge in mol.bonds_of(cur) {
            if edge == skip {
                continue;
            }
            let Some(next) = mol.other_end(edge, cur) else {
                continue;
            };
            if dist[next.index()] != usize::MAX {
                continue;
            }
            dist[next.index()] = dist[cur.index()] + 1;
            if next == to {
                return Some(dist[next.index()]);
            }
            queue.push_back(next);
        }
    }
    None
}
