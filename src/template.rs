//! Strained-cycle templates: caged ring systems whose bridgeheads cannot
//! be inverted one at a time.
//!
//! A template is a SMILES with a consistent stereo assignment on every
//! bridgehead. Matching looks at ring membership only, so one norbornane
//! template covers aza-, oxa- and substituted norbornanes alike.

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::atom::{Atom, AtomFlags};
use crate::bond::Bond;
use crate::error::ConfigError;
use crate::mol::{AtomId, Mol};
use crate::rings::RingInfo;
use crate::smiles::from_smiles;
use crate::substruct::{unique_substruct_matches_with, AtomMapping};

#[derive(Debug, Clone)]
pub struct StrainedCycleTemplate {
    smiles: String,
    mol: Mol<Atom, Bond>,
    rings: RingInfo,
}

impl StrainedCycleTemplate {
    pub fn parse(smiles: &str) -> Result<Self, ConfigError> {
        let mol = from_smiles(smiles).map_err(|e| ConfigError::Template {
            smiles: smiles.to_string(),
            source: e,
        })?;
        let rings = RingInfo::perceive(&mol);
        Ok(Self {
            smiles: smiles.to_string(),
            mol,
            rings,
        })
    }

    pub fn smiles(&self) -> &str {
        &self.smiles
    }

    /// Template atoms that carry a descriptor.
    pub fn bridgehead_count(&self) -> usize {
        self.mol.tetrahedral_stereo().len()
    }

    /// Unique occurrences in `target`. A template ring atom must land on a
    /// target ring atom and a template ring bond on a target ring bond;
    /// elements and bond orders are not compared.
    pub fn find(&self, target: &Mol<Atom, Bond>, target_rings: &RingInfo) -> Vec<AtomMapping> {
        unique_substruct_matches_with(
            target,
            &self.mol,
            |t, q| !self.rings.is_ring_atom(q) || target_rings.is_ring_atom(t),
            |t, q| !self.rings.is_ring_bond(q) || target_rings.is_ring_bond(t),
        )
    }

    /// Copies the template's bridgehead stereo onto `reference` for every
    /// occurrence and flags the matched atoms of `mol` as strained
    /// bridgeheads. A bridgehead that was stereo-cleared is made chiral
    /// again. Returns the number of descriptors placed.
    pub fn apply(
        &self,
        mol: &mut Mol<Atom, Bond>,
        reference: &mut Mol<Atom, Bond>,
        rings: &RingInfo,
    ) -> usize {
        let mut placed = 0;
        for mapping in self.find(mol, rings) {
            let mut image = vec![None; self.mol.atom_count()];
            for &(q, t) in &mapping {
                image[q.index()] = Some(t);
            }
            for stereo in self.mol.tetrahedral_stereo() {
                let Some(center) = image[stereo.center.index()] else {
                    continue;
                };
                let Some(order) = self.transfer_order(reference, &image, &stereo.neighbors, center)
                else {
                    continue;
                };
                if !reference.set_atom_parity(center, order, stereo.parity) {
                    continue;
                }
                let flags = &mut mol.atom_mut(center).flags;
                flags.insert(AtomFlags::STRAINED_BRIDGEHEAD);
                if flags.contains(AtomFlags::STEREO_CLEARED) {
                    flags.remove(AtomFlags::STEREO_CLEARED);
                    flags.insert(AtomFlags::CHIRAL);
                }
                placed += 1;
            }
        }
        if placed > 0 {
            debug!(template = %self.smiles, placed, "Strained-cycle template matched.");
        }
        placed
    }

    /// Template neighbour order expressed on the target. The template's
    /// implicit H stands for whatever target substituent is left over.
    fn transfer_order(
        &self,
        target: &Mol<Atom, Bond>,
        image: &[Option<NodeIndex>],
        neighbors: &[AtomId; 4],
        center: NodeIndex,
    ) -> Option<[AtomId; 4]> {
        let subs = target.substituent_array(center)?;
        let mut order: [Option<AtomId>; 4] = [None; 4];
        for (slot, id) in order.iter_mut().zip(neighbors) {
            if let AtomId::Node(q) = id {
                *slot = Some(AtomId::Node(image.get(q.index()).copied().flatten()?));
            }
        }
        let rest: Vec<AtomId> = subs
            .iter()
            .copied()
            .filter(|s| !order.contains(&Some(*s)))
            .collect();
        let mut rest = rest.into_iter();
        for slot in order.iter_mut().filter(|s| s.is_none()) {
            *slot = Some(rest.next()?);
        }
        if rest.next().is_some() {
            return None;
        }
        Some([order[0]?, order[1]?, order[2]?, order[3]?])
    }
}

/// Runs every template in turn. Returns the total number of bridgehead
/// descriptors placed on `reference`.
pub fn apply_templates(
    templates: &[StrainedCycleTemplate],
    mol: &mut Mol<Atom, Bond>,
    reference: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
) -> usize {
    templates
        .iter()
        .map(|t| t.apply(mol, reference, rings))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StereoConfig;

    fn templates() -> Vec<StrainedCycleTemplate> {
        StereoConfig::default()
            .strained_cycles
            .iter()
            .map(|s| StrainedCycleTemplate::parse(s).unwrap())
            .collect()
    }

    fn run(smiles: &str) -> (Mol<Atom, Bond>, Mol<Atom, Bond>, usize) {
        let mut mol = from_smiles(smiles).unwrap();
        let rings = RingInfo::perceive(&mol);
        let mut reference = mol.clone();
        let placed = apply_templates(&templates(), &mut mol, &mut reference, &rings);
        (mol, reference, placed)
    }

    fn bridgeheads(mol: &Mol<Atom, Bond>) -> Vec<usize> {
        mol.atoms()
            .filter(|&a| mol.atom(a).flags.contains(AtomFlags::STRAINED_BRIDGEHEAD))
            .map(|a| a.index())
            .collect()
    }

    #[test]
    fn default_templates_parse() {
        let t = templates();
        assert_eq!(t.len(), 4);
        assert!(t.iter().all(|t| t.bridgehead_count() >= 2));
    }

    #[test]
    fn bad_template_is_a_config_error() {
        let err = StrainedCycleTemplate::parse("C1CC").unwrap_err();
        assert!(matches!(err, ConfigError::Template { .. }));
    }

    #[test]
    fn norbornane_bridgeheads() {
        let (mol, reference, placed) = run("C1CC2CCC1C2");
        assert_eq!(placed, 2);
        assert_eq!(bridgeheads(&mol), vec![2, 5]);
        assert!(reference.has_atom_stereo(NodeIndex::new(2)));
        assert!(reference.has_atom_stereo(NodeIndex::new(5)));
        assert!(mol.tetrahedral_stereo().is_empty());
    }

    #[test]
    fn heteroatoms_and_substituents_still_match() {
        let (mol, _, placed) = run("CC12CCC(CC1)O2");
        assert_eq!(placed, 2);
        assert_eq!(bridgeheads(&mol), vec![1, 4]);
    }

    #[test]
    fn plain_rings_do_not_match() {
        let (mol, reference, placed) = run("C1CCC2CCCCC2C1");
        assert_eq!(placed, 0);
        assert!(bridgeheads(&mol).is_empty());
        assert!(reference.tetrahedral_stereo().is_empty());
    }

    #[test]
    fn cleared_bridgehead_nitrogen_is_restored() {
        let mut mol = from_smiles("CC1CN2CC(O)C1CC2").unwrap();
        let rings = RingInfo::perceive(&mol);
        let n = NodeIndex::new(3);
        mol.atom_mut(n).flags.insert(AtomFlags::STEREO_CLEARED);
        let mut reference = mol.clone();
        apply_templates(&templates(), &mut mol, &mut reference, &rings);
        let flags = mol.atom(n).flags;
        assert!(flags.contains(AtomFlags::STRAINED_BRIDGEHEAD | AtomFlags::CHIRAL));
        assert!(!flags.contains(AtomFlags::STEREO_CLEARED));
        assert!(reference.has_atom_stereo(n));
    }
}
