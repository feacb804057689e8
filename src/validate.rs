//! Validation rules: wedges, unsupported chirality, wavy bonds and
//! cis/trans descriptors. Each problem is reported and the offending
//! descriptor removed; nothing here stops the pipeline.

use std::collections::HashSet;

use petgraph::graph::{EdgeIndex, NodeIndex};
use tracing::warn;

use crate::atom::{Atom, AtomFlags};
use crate::bond::{Bond, BondFlags, BondOrder, WedgeKind};
use crate::element;
use crate::error::{BondStereoProblem, StereoError, UnsupportedReason, WedgeProblem};
use crate::mol::{AtomId, DoubleBondConfig, Mol};
use crate::rings::RingInfo;
use crate::traits::HasPosition3D;

/// A substituent within this many degrees of the double-bond axis makes
/// the configuration undefined.
const LINEAR_TOLERANCE_DEG: f64 = 5.0;

/// Problems collected over one classification, plus the atoms already
/// reported for a bad wedge so they are not reported twice.
#[derive(Debug, Default)]
pub struct Findings {
    errors: Vec<StereoError>,
    reported: HashSet<NodeIndex>,
}

impl Findings {
    pub fn push(&mut self, error: StereoError) {
        warn!(%error, "Stereo problem.");
        self.errors.push(error);
    }

    fn report_atom(&mut self, atom: NodeIndex, error: StereoError) {
        self.reported.insert(atom);
        self.push(error);
    }

    pub fn is_reported(&self, atom: NodeIndex) -> bool {
        self.reported.contains(&atom)
    }

    pub fn errors(&self) -> &[StereoError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<StereoError> {
        self.errors
    }
}

fn ring_allows_rotation(rings: &RingInfo, bond: EdgeIndex) -> bool {
    rings.bond_ring_size(bond).map_or(true, |size| size >= 7)
}

/// A rotatable-looking single bond between two trigonal atoms that carry
/// no hydrogen. These are the only places an atropisomeric axis can sit.
pub fn is_possible_axis(mol: &Mol<Atom, Bond>, rings: &RingInfo, bond: EdgeIndex) -> bool {
    let b = mol.bond(bond);
    if b.order != BondOrder::Single || b.is_aromatic || !ring_allows_rotation(rings, bond) {
        return false;
    }
    let Some((u, v)) = mol.bond_endpoints(bond) else {
        return false;
    };
    [u, v]
        .into_iter()
        .all(|a| mol.heavy_degree(a) == 3 && mol.total_hydrogens(a) == 0)
}

/// Tries to read the wedge on `wedge_bond` as one side of an
/// atropisomeric axis through `begin`. On success the axis bond and both
/// of its atoms are flagged.
pub fn detect_atropisomer(
    mol: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    wedge_bond: EdgeIndex,
    begin: NodeIndex,
) -> bool {
    if mol.heavy_degree(begin) != 3 || mol.total_hydrogens(begin) != 0 {
        return false;
    }
    let axis = mol.bonds_of(begin).find_map(|b2| {
        if b2 == wedge_bond {
            return None;
        }
        let bond = mol.bond(b2);
        if bond.order != BondOrder::Single
            || bond.is_aromatic
            || !ring_allows_rotation(rings, b2)
        {
            return None;
        }
        let partner = mol.other_end(b2, begin)?;
        if mol.total_hydrogens(partner) != 0 || mol.heavy_degree(partner) != 3 {
            return None;
        }
        let partner_wedged = mol.bonds_of(partner).any(|b3| {
            let other = mol.bond(b3);
            b3 != b2 && other.order == BondOrder::Single && other.wedge.is_some()
        });
        (!partner_wedged).then_some((b2, partner))
    });
    let Some((axis, partner)) = axis else {
        return false;
    };
    mol.atom_mut(begin).flags.insert(AtomFlags::ATROPISOMERIC);
    mol.atom_mut(partner).flags.insert(AtomFlags::ATROPISOMERIC);
    mol.bond_mut(axis).flags.insert(BondFlags::ATROPISOMERIC);
    true
}

/// Judges the begin atom of every up or down wedge.
pub fn check_wedges(
    mol: &mut Mol<Atom, Bond>,
    rings: &RingInfo,
    metal_max_degree: usize,
    findings: &mut Findings,
) {
    let wedged: Vec<(EdgeIndex, NodeIndex)> = mol
        .bonds()
        .filter(|&e| mol.bond(e).has_stereo_wedge())
        .filter_map(|e| Some((e, mol.bond(e).wedge?.begin)))
        .collect();
    for (bond, begin) in wedged {
        let (flags, atomic_num) = {
            let atom = mol.atom(begin);
            (atom.flags, atom.atomic_num)
        };
        if flags.is_chiral() {
            continue;
        }
        if element::is_metal(atomic_num) && mol.degree(begin) > metal_max_degree {
            mol.atom_mut(begin).flags.insert(AtomFlags::CHIRAL_METAL);
            continue;
        }
        if flags.contains(AtomFlags::NON_CHIRAL_STEREO) {
            continue;
        }
        if detect_atropisomer(mol, rings, bond, begin) {
            mol.remove_tetrahedral_stereo(begin);
            let flags = &mut mol.atom_mut(begin).flags;
            flags.remove(AtomFlags::CHIRAL | AtomFlags::CHIRAL_NOT_RECOGNIZED);
            flags.insert(AtomFlags::STEREO_CLEARED);
            continue;
        }
        if flags.contains(AtomFlags::STEREO_CLEARED) || findings.is_reported(begin) {
            continue;
        }
        mol.remove_tetrahedral_stereo(begin);
        findings.report_atom(
            begin,
            StereoError::InvalidWedge {
                atom: begin.index(),
                problem: WedgeProblem::NotChiral,
            },
        );
    }
}

/// Removes descriptors from elements that cannot carry them and from
/// aromatic atoms.
pub fn check_unsupported_chirality(
    mol: &mut Mol<Atom, Bond>,
    chiral_elements: &[u8],
    findings: &mut Findings,
) {
    let centers: Vec<NodeIndex> = mol.tetrahedral_stereo().iter().map(|s| s.center).collect();
    for center in centers {
        let atom = mol.atom(center);
        if atom.flags.contains(AtomFlags::ATROPISOMERIC) {
            continue;
        }
        let reason = if !chiral_elements.contains(&atom.atomic_num) {
            UnsupportedReason::Element
        } else if atom.is_aromatic {
            UnsupportedReason::Aromatic
        } else {
            continue;
        };
        mol.remove_tetrahedral_stereo(center);
        findings.report_atom(
            center,
            StereoError::UnsupportedChirality {
                atom: center.index(),
                reason,
            },
        );
    }
}

/// Removes descriptors from atoms that turned out to have no stereo.
/// Stereo-cleared atoms are left for the counting stage.
pub fn check_non_chiral_descriptors(mol: &mut Mol<Atom, Bond>, findings: &mut Findings) {
    let centers: Vec<NodeIndex> = mol.tetrahedral_stereo().iter().map(|s| s.center).collect();
    for center in centers {
        let flags = mol.atom(center).flags;
        if flags.is_chiral()
            || flags.intersects(
                AtomFlags::NON_CHIRAL_STEREO
                    | AtomFlags::ATROPISOMERIC
                    | AtomFlags::STEREO_CLEARED,
            )
            || findings.is_reported(center)
        {
            continue;
        }
        mol.remove_tetrahedral_stereo(center);
        findings.report_atom(
            center,
            StereoError::InvalidWedge {
                atom: center.index(),
                problem: WedgeProblem::NotChiral,
            },
        );
    }
}

/// A wavy bond marks unknown configuration. On a stereocentre that is a
/// contradiction; elsewhere it wipes the cis/trans descriptors of the
/// double bonds at either end.
pub fn check_wavy_bonds(mol: &mut Mol<Atom, Bond>, findings: &mut Findings) {
    let wavy: Vec<EdgeIndex> = mol
        .bonds()
        .filter(|&e| matches!(mol.bond(e).wedge, Some(w) if w.kind == WedgeKind::Wavy))
        .collect();
    for bond in wavy {
        let Some((u, v)) = mol.bond_endpoints(bond) else {
            continue;
        };
        let stereocenter = [u, v].into_iter().find(|&a| {
            let flags = mol.atom(a).flags;
            flags.is_chiral() || flags.contains(AtomFlags::NON_CHIRAL_STEREO)
        });
        if let Some(atom) = stereocenter {
            findings.push(StereoError::InvalidWedge {
                atom: atom.index(),
                problem: WedgeProblem::WavyOnStereocenter,
            });
            continue;
        }
        mol.bond_mut(bond).wedge = None;
        for end in [u, v] {
            let doubles: Vec<NodeIndex> = mol
                .bonds_of(end)
                .filter(|&e| mol.bond(e).order == BondOrder::Double)
                .filter_map(|e| mol.other_end(e, end))
                .collect();
            for other in doubles {
                mol.remove_ez_stereo(end, other);
            }
        }
    }
}

/// Configuration implied by the coordinates of `ref_a`-`a`=`b`-`ref_b`,
/// or `None` when a substituent is collinear with the double bond.
fn geometric_config(
    ref_a: [f64; 3],
    a: [f64; 3],
    b: [f64; 3],
    ref_b: [f64; 3],
) -> Option<DoubleBondConfig> {
    let axis = sub(b, a);
    if is_linear(sub(ref_a, a), axis) || is_linear(sub(ref_b, b), scale(axis, -1.0)) {
        return None;
    }
    let n1 = cross(sub(a, ref_a), axis);
    let n2 = cross(axis, sub(ref_b, b));
    Some(if dot(n1, n2) > 0.0 {
        DoubleBondConfig::Cis
    } else {
        DoubleBondConfig::Trans
    })
}

fn is_linear(u: [f64; 3], v: [f64; 3]) -> bool {
    let norms = dot(u, u).sqrt() * dot(v, v).sqrt();
    if norms < f64::EPSILON {
        return true;
    }
    let cos = dot(u, v) / norms;
    cos < -(LINEAR_TOLERANCE_DEG.to_radians().cos())
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn scale(a: [f64; 3], k: f64) -> [f64; 3] {
    [a[0] * k, a[1] * k, a[2] * k]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Checks every cis/trans descriptor against perception and, when the
/// depiction has coordinates, against the drawing.
pub fn check_double_bonds(mol: &mut Mol<Atom, Bond>, findings: &mut Findings) {
    let declared = mol.ez_stereo().to_vec();
    for stereo in declared {
        let (a, b) = stereo.bond;
        let problem = match mol.bond_between(a, b) {
            Some(e) if mol.bond(e).flags.contains(BondFlags::CHIRAL) => {
                geometry_problem(mol, a, b, stereo.refs, stereo.config)
            }
            _ => Some(BondStereoProblem::Symmetric),
        };
        if let Some(problem) = problem {
            mol.remove_ez_stereo(a, b);
            findings.push(StereoError::InconsistentBondStereo {
                begin: a.index(),
                end: b.index(),
                problem,
            });
        }
    }
}

fn geometry_problem(
    mol: &Mol<Atom, Bond>,
    a: NodeIndex,
    b: NodeIndex,
    refs: [AtomId; 2],
    declared: DoubleBondConfig,
) -> Option<BondStereoProblem> {
    let position = |id: AtomId| mol.atom(id.node()?).position_3d();
    let (ra, pa, pb, rb) = (
        position(refs[0])?,
        mol.atom(a).position_3d()?,
        mol.atom(b).position_3d()?,
        position(refs[1])?,
    );
    match geometric_config(ra, pa, pb, rb) {
        None => Some(BondStereoProblem::Linear),
        Some(found) if found != declared => Some(BondStereoProblem::Geometry),
        Some(_) => None,
    }
}
