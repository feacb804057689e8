//! Stereocentre significance analysis and stereo structure-flag
//! classification for small-molecule graphs.
//!
//! [`StereoClassifier`] decides which atoms and bonds of a depicted
//! molecule carry real stereo, checks the drawn wedges and descriptors
//! against that, and reduces the whole molecule to one [`StructureFlag`].

pub mod atom;
pub mod bond;
pub mod candidates;
pub mod classifier;
pub mod classify;
pub mod config;
pub mod element;
pub mod error;
pub mod inversion;
pub mod mol;
pub mod perception;
pub mod propagate;
pub mod rings;
pub mod rules;
pub mod smiles;
pub mod substruct;
pub mod symmetry;
pub mod template;
pub mod traits;
pub mod validate;

pub use atom::{Atom, AtomFlags};
pub use bond::{Bond, BondFlags, BondOrder, Wedge, WedgeKind};
pub use classifier::StereoClassifier;
pub use classify::{ClassificationResult, StereoCounts, StructureFlag};
pub use config::{StereoConfig, DEFAULT_CONFIG_TOML};
pub use error::{ConfigError, MismatchKind, StereoError, UnknownStructureFlag};
pub use mol::{AtomId, AtomParity, DoubleBondConfig, EZStereo, Mol, TetrahedralStereo};
pub use rings::RingInfo;
pub use rules::{Capability, Rule};
pub use smiles::{from_smiles, SmilesError};
pub use substruct::{SelfMatcher, Vf2SelfMatcher};
pub use symmetry::symmetry_classes;
pub use traits::{
    HasAromaticity, HasAtomicNum, HasBondAromaticity, HasBondOrder, HasFormalCharge,
    HasHydrogenCount, HasIsotope, HasPosition3D,
};
