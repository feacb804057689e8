use bitflags::bitflags;

bitflags! {
    /// Per-atom annotations written by the classification pipeline.
    ///
    /// All of these are transient: [`StereoClassifier`](crate::StereoClassifier)
    /// clears them before it looks at a molecule, so nothing carries over
    /// from a previous run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct AtomFlags: u16 {
        /// Four distinct substituents by symmetry class.
        const CHIRAL = 1 << 0;
        /// Chiral by substituent count although baseline perception missed it.
        const CHIRAL_NOT_RECOGNIZED = 1 << 1;
        /// Stereo designation is ambiguous until tested by inversion.
        const CANDIDATE = 1 << 2;
        /// Not chiral, but its configuration is observable (ring cis/trans).
        const NON_CHIRAL_STEREO = 1 << 3;
        /// Bridgehead of a matched strained-cycle template.
        const STRAINED_BRIDGEHEAD = 1 << 4;
        /// One side of a restricted-rotation axis.
        const ATROPISOMERIC = 1 << 5;
        /// Demoted: may not carry a stereo descriptor.
        const STEREO_CLEARED = 1 << 6;
        /// Metal whose coordination is too high for tetrahedral stereo.
        const CHIRAL_METAL = 1 << 7;
    }
}

impl AtomFlags {
    /// Counts toward the chiral-centre totals.
    #[inline]
    pub fn is_chiral(&self) -> bool {
        self.intersects(AtomFlags::CHIRAL | AtomFlags::CHIRAL_NOT_RECOGNIZED)
    }
}

/// Default atom type for a molecular graph node.
///
/// `Atom` stores intrinsic atomic properties plus the annotation flags the
/// stereo pipeline writes. Stereo descriptors themselves are not stored
/// here; they live on the [`Mol`](crate::Mol) as
/// [`TetrahedralStereo`](crate::TetrahedralStereo) entries.
///
/// # Examples
///
/// ```
/// use stereoflag::Atom;
///
/// let carbon = Atom {
///     atomic_num: 6,
///     hydrogen_count: 3,
///     ..Atom::default()
/// };
/// assert_eq!(carbon.atomic_num, 6);
/// assert!(carbon.flags.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …). `0` is a dummy atom.
    pub atomic_num: u8,
    /// Formal charge in elementary charge units.
    pub formal_charge: i8,
    /// Mass number. `0` means natural isotopic abundance.
    pub isotope: u16,
    /// Number of implicit (suppressed) hydrogens on this atom.
    pub hydrogen_count: u8,
    /// Whether this atom is in an aromatic ring.
    pub is_aromatic: bool,
    /// Cartesian coordinates, when the depiction carries them.
    pub position: Option<[f64; 3]>,
    pub flags: AtomFlags,
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasFormalCharge for Atom {
    fn formal_charge(&self) -> i8 {
        self.formal_charge
    }
}

impl crate::traits::HasIsotope for Atom {
    fn isotope(&self) -> u16 {
        self.isotope
    }
}

impl crate::traits::HasHydrogenCount for Atom {
    fn hydrogen_count(&self) -> u8 {
        self.hydrogen_count
    }
}

impl crate::traits::HasAromaticity for Atom {
    fn is_aromatic(&self) -> bool {
        self.is_aromatic
    }
}

impl crate::traits::HasPosition3D for Atom {
    fn position_3d(&self) -> Option<[f64; 3]> {
        self.position
    }
}
