//! SMILES reader producing [`Mol<Atom, Bond>`](crate::Mol).
//!
//! Aromatic atoms keep their lower-case aromaticity and aromatic bonds are
//! stored as single bonds with [`Bond::is_aromatic`](crate::Bond) set; no
//! Kekulé structure is assigned. Tetrahedral `@`/`@@` and `/`/`\` markers
//! become [`TetrahedralStereo`](crate::TetrahedralStereo) and
//! [`EZStereo`](crate::EZStereo) descriptors.

mod builder;
pub mod error;
mod parse_tree;
mod tokenizer;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::mol::Mol;
pub use error::SmilesError;

pub fn from_smiles(s: &str) -> Result<Mol<Atom, Bond>, SmilesError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(SmilesError::EmptyInput);
    }
    let tokens = tokenizer::tokenize(trimmed)?;
    let tree = parse_tree::build_parse_tree(&tokens)?;
    Ok(builder::build_mol(&tree))
}
