use petgraph::graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element;
use crate::mol::{AtomId, AtomParity, DoubleBondConfig, Mol};
use crate::smiles::parse_tree::{ParseAtom, ParseTree};
use crate::smiles::tokenizer::{BondToken, ChiralityToken};

pub fn build_mol(tree: &ParseTree) -> Mol<Atom, Bond> {
    let mut mol = Mol::new();
    let indices: Vec<NodeIndex> = tree
        .atoms
        .iter()
        .map(|pa| {
            mol.add_atom(Atom {
                atomic_num: pa.atomic_num,
                formal_charge: pa.charge,
                isotope: pa.isotope,
                is_aromatic: pa.is_aromatic,
                ..Atom::default()
            })
        })
        .collect();

    for (i, pa) in tree.atoms.iter().enumerate() {
        for nb in &pa.neighbors {
            let j = nb.atom_idx;
            if j <= i {
                continue;
            }
            let bond = resolve_bond(nb.bond, pa.is_aromatic, tree.atoms[j].is_aromatic);
            mol.add_bond(indices[i], indices[j], bond);
        }
    }

    for (i, pa) in tree.atoms.iter().enumerate() {
        let h = if pa.is_bracket {
            pa.hcount.unwrap_or(0)
        } else {
            implicit_hydrogens(&mol, indices[i], pa)
        };
        mol.atom_mut(indices[i]).hydrogen_count = h;
    }

    resolve_chirality(&mut mol, tree, &indices);
    resolve_ez_stereo(&mut mol, tree, &indices);

    mol
}

fn resolve_bond(token: Option<BondToken>, from_aromatic: bool, to_aromatic: bool) -> Bond {
    let order = match token {
        Some(BondToken::Double) => BondOrder::Double,
        Some(BondToken::Triple) => BondOrder::Triple,
        _ => BondOrder::Single,
    };
    let is_aromatic = match token {
        Some(BondToken::Aromatic) => true,
        None => from_aromatic && to_aromatic,
        _ => false,
    };
    Bond {
        order,
        is_aromatic,
        ..Bond::default()
    }
}

/// Lowest default valence that fits the bond-order sum; aromatic atoms give
/// one valence unit to the pi system.
fn implicit_hydrogens(mol: &Mol<Atom, Bond>, node: NodeIndex, pa: &ParseAtom) -> u8 {
    let valences = element::default_valences(pa.atomic_num);
    let used: u8 = mol
        .bonds_of(node)
        .map(|e| mol.bond(e).order.as_u8())
        .fold(0u8, u8::saturating_add);
    let Some(&target) = valences.iter().find(|&&v| v >= used) else {
        return 0;
    };
    let h = target - used;
    if pa.is_aromatic {
        h.saturating_sub(1)
    } else {
        h
    }
}

/// `@`/`@@` are read over the written neighbour order, with an implicit H
/// or lone pair taking the place right after the preceding atom.
fn resolve_chirality(mol: &mut Mol<Atom, Bond>, tree: &ParseTree, indices: &[NodeIndex]) {
    for (i, pa) in tree.atoms.iter().enumerate() {
        let parity = match pa.chirality {
            ChiralityToken::None => continue,
            ChiralityToken::CounterClockwise => AtomParity::Left,
            ChiralityToken::Clockwise => AtomParity::Right,
        };
        let center = indices[i];
        let mut order: Vec<AtomId> = pa
            .neighbors
            .iter()
            .map(|nb| AtomId::Node(indices[nb.atom_idx]))
            .collect();
        let virtual_slot = mol
            .stereo_substituents(center)
            .into_iter()
            .find(|s| !matches!(s, AtomId::Node(_)));
        if let Some(slot) = virtual_slot {
            let at = usize::from(pa.has_preceding).min(order.len());
            order.insert(at, slot);
        }
        if let Ok(order) = <[AtomId; 4]>::try_from(order) {
            mol.set_atom_parity(center, order, parity);
        }
    }
}

/// Same `/`/`\` direction on both ends (as seen from each double-bond
/// atom) means the two referenced substituents are cis.
fn resolve_ez_stereo(mol: &mut Mol<Atom, Bond>, tree: &ParseTree, indices: &[NodeIndex]) {
    for (i, pa) in tree.atoms.iter().enumerate() {
        for nb in &pa.neighbors {
            let j = nb.atom_idx;
            if j <= i || nb.bond != Some(BondToken::Double) {
                continue;
            }
            let (Some((ref_i, dir_i)), Some((ref_j, dir_j))) =
                (directional_neighbor(tree, i, j), directional_neighbor(tree, j, i))
            else {
                continue;
            };
            let config = if dir_i == dir_j {
                DoubleBondConfig::Cis
            } else {
                DoubleBondConfig::Trans
            };
            mol.set_bond_config(
                indices[i],
                indices[j],
                AtomId::Node(indices[ref_i]),
                AtomId::Node(indices[ref_j]),
                config,
            );
        }
    }
}

fn directional_neighbor(
    tree: &ParseTree,
    atom: usize,
    partner: usize,
) -> Option<(usize, BondToken)> {
    tree.atoms[atom]
        .neighbors
        .iter()
        .filter(|nb| nb.atom_idx != partner)
        .find_map(|nb| nb.direction().map(|d| (nb.atom_idx, d)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smiles::parse_tree::build_parse_tree;
    use crate::smiles::tokenizer::tokenize;

    fn parse(s: &str) -> Mol<Atom, Bond> {
        build_mol(&build_parse_tree(&tokenize(s).unwrap()).unwrap())
    }

    fn n(i: usize) -> NodeIndex {
        NodeIndex::new(i)
    }

    #[test]
    fn implicit_hydrogen_counts() {
        let mol = parse("CC(=O)O");
        let hs: Vec<u8> = mol.atoms().map(|a| mol.atom(a).hydrogen_count).collect();
        assert_eq!(hs, vec![3, 0, 0, 1]);
    }

    #[test]
    fn aromatic_ring_hydrogens_and_bonds() {
        let mol = parse("c1ccncc1");
        for i in 0..6 {
            let expected = if i == 3 { 0 } else { 1 };
            assert_eq!(mol.atom(n(i)).hydrogen_count, expected, "atom {i}");
        }
        assert!(mol.bonds().all(|e| mol.bond(e).is_aromatic));
        assert!(mol.bonds().all(|e| mol.bond(e).order == BondOrder::Single));
    }

    #[test]
    fn explicit_single_between_aromatic_rings() {
        let mol = parse("c1ccccc1-c1ccccc1");
        let link = mol.bond_between(n(5), n(6)).unwrap();
        assert!(!mol.bond(link).is_aromatic);
    }

    #[test]
    fn chirality_uses_written_order() {
        let mol = parse("F[C@H](Cl)Br");
        let s = mol.tetrahedral_stereo_for(n(1)).unwrap();
        assert_eq!(
            s.neighbors,
            [
                AtomId::Node(n(0)),
                AtomId::ImplicitH(n(1)),
                AtomId::Node(n(2)),
                AtomId::Node(n(3))
            ]
        );
        assert_eq!(s.parity, AtomParity::Left);
    }

    #[test]
    fn leading_hydrogen_comes_first() {
        let mol = parse("[C@@H](F)(Cl)Br");
        let s = mol.tetrahedral_stereo_for(n(0)).unwrap();
        assert_eq!(s.neighbors[0], AtomId::ImplicitH(n(0)));
        assert_eq!(s.parity, AtomParity::Right);
    }

    #[test]
    fn ring_closure_neighbour_keeps_digit_position() {
        // written around atom 1: methyl 0, ring partner 6, hydroxyl 2, then 3
        let mol = parse("C[C@]1(O)CCCC1");
        let s = mol.tetrahedral_stereo_for(n(1)).unwrap();
        assert_eq!(
            s.neighbors,
            [
                AtomId::Node(n(0)),
                AtomId::Node(n(6)),
                AtomId::Node(n(2)),
                AtomId::Node(n(3))
            ]
        );
    }

    #[test]
    fn equivalent_spellings_agree() {
        let a = parse("F[C@H](Cl)Br");
        let b = parse("Br[C@@H](Cl)F");
        let order = [
            AtomId::Node(n(0)),
            AtomId::ImplicitH(n(1)),
            AtomId::Node(n(2)),
            AtomId::Node(n(3)),
        ];
        // in b, index 0 is Br and 3 is F
        let order_b = [
            AtomId::Node(n(3)),
            AtomId::ImplicitH(n(1)),
            AtomId::Node(n(2)),
            AtomId::Node(n(0)),
        ];
        assert_eq!(a.atom_parity(n(1), &order), b.atom_parity(n(1), &order_b));
    }

    #[test]
    fn sulfoxide_lone_pair_slot() {
        let mol = parse("C[S@](=O)CC");
        let s = mol.tetrahedral_stereo_for(n(1)).unwrap();
        assert_eq!(s.neighbors[1], AtomId::LonePair(n(1)));
    }

    #[test]
    fn cis_trans_from_slashes() {
        let trans = parse("F/C=C/F");
        assert_eq!(
            trans.bond_config(n(1), n(2), AtomId::Node(n(0)), AtomId::Node(n(3))),
            Some(DoubleBondConfig::Trans)
        );
        let cis = parse("F/C=C\\F");
        assert_eq!(
            cis.bond_config(n(1), n(2), AtomId::Node(n(0)), AtomId::Node(n(3))),
            Some(DoubleBondConfig::Cis)
        );
        // C(\F) is another spelling of F/C
        let branched = parse("C(\\F)=C/F");
        assert_eq!(
            branched.bond_config(n(0), n(2), AtomId::Node(n(1)), AtomId::Node(n(3))),
            Some(DoubleBondConfig::Trans)
        );
    }

    #[test]
    fn no_descriptor_without_slashes() {
        let mol = parse("FC=CF");
        assert!(mol.ez_stereo().is_empty());
        assert!(mol.tetrahedral_stereo().is_empty());
    }
}
