use crate::smiles::error::SmilesError;
use crate::smiles::tokenizer::{AtomToken, BondToken, ChiralityToken, Token};

#[derive(Debug, Clone)]
pub struct ParseAtom {
    pub atomic_num: u8,
    pub is_aromatic: bool,
    pub isotope: u16,
    pub chirality: ChiralityToken,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub is_bracket: bool,
    /// Bonded to the atom written before it (not a ring closure).
    pub has_preceding: bool,
    /// In SMILES order: preceding atom, ring digits, then branches and the
    /// next atom.
    pub neighbors: Vec<Neighbor>,
}

#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub bond: Option<BondToken>,
    pub atom_idx: usize,
    /// The bond symbol was written with this atom on its left.
    pub forward: bool,
}

impl Neighbor {
    /// Direction of a `/` or `\` bond seen from the owning atom.
    pub fn direction(&self) -> Option<BondToken> {
        let bond = self.bond.filter(|b| b.is_directional())?;
        Some(if self.forward { bond } else { bond.flipped() })
    }
}

#[derive(Debug, Clone)]
pub struct ParseTree {
    pub atoms: Vec<ParseAtom>,
}

struct RingOpen {
    atom: usize,
    slot: usize,
    bond: Option<BondToken>,
}

const PLACEHOLDER: usize = usize::MAX;

pub fn build_parse_tree(tokens: &[Token]) -> Result<ParseTree, SmilesError> {
    let mut atoms: Vec<ParseAtom> = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let mut current: Option<usize> = None;
    let mut pending_bond: Option<BondToken> = None;
    let mut ring_opens: Vec<Option<RingOpen>> = (0..100).map(|_| None).collect();

    for token in tokens {
        match token {
            Token::Atom(atom_tok) => {
                let idx = atoms.len();
                let mut atom = parse_atom_from_token(atom_tok);
                if let Some(cur) = current {
                    let bond = pending_bond.take();
                    atoms[cur].neighbors.push(Neighbor {
                        bond,
                        atom_idx: idx,
                        forward: true,
                    });
                    atom.has_preceding = true;
                    atom.neighbors.push(Neighbor {
                        bond,
                        atom_idx: cur,
                        forward: false,
                    });
                }
                atoms.push(atom);
                current = Some(idx);
            }
            Token::Bond(b) => {
                pending_bond = Some(*b);
            }
            Token::RingClosure { bond, digit, pos } => {
                let invalid = SmilesError::InvalidRingBond {
                    digit: *digit,
                    pos: *pos,
                };
                let cur = current.ok_or_else(|| invalid.clone())?;
                let slot = ring_opens
                    .get_mut(*digit as usize)
                    .ok_or_else(|| invalid.clone())?;
                match slot.take() {
                    Some(open) => {
                        if open.atom == cur
                            || atoms[cur].neighbors.iter().any(|n| n.atom_idx == open.atom)
                        {
                            return Err(invalid);
                        }
                        let (ring_bond, opener_forward) = match (open.bond, *bond) {
                            (None, None) => (None, true),
                            (Some(b), None) => (Some(b), true),
                            (None, Some(b)) => (Some(b), false),
                            (Some(b1), Some(b2)) => {
                                if b1 == b2 || (b1.is_directional() && b2.is_directional()) {
                                    (Some(b1), true)
                                } else {
                                    return Err(SmilesError::RingBondConflict { digit: *digit });
                                }
                            }
                        };
                        atoms[open.atom].neighbors[open.slot] = Neighbor {
                            bond: ring_bond,
                            atom_idx: cur,
                            forward: opener_forward,
                        };
                        atoms[cur].neighbors.push(Neighbor {
                            bond: ring_bond,
                            atom_idx: open.atom,
                            forward: !opener_forward,
                        });
                    }
                    None => {
                        let slot_idx = atoms[cur].neighbors.len();
                        atoms[cur].neighbors.push(Neighbor {
                            bond: *bond,
                            atom_idx: PLACEHOLDER,
                            forward: true,
                        });
                        *slot = Some(RingOpen {
                            atom: cur,
                            slot: slot_idx,
                            bond: *bond,
                        });
                    }
                }
            }
            Token::OpenParen(pos) => {
                let cur = current.ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                stack.push((cur, *pos));
            }
            Token::CloseParen(pos) => {
                let (cur, _) = stack.pop().ok_or(SmilesError::UnmatchedParen { pos: *pos })?;
                current = Some(cur);
                pending_bond = None;
            }
            Token::Dot(_) => {
                current = None;
                pending_bond = None;
            }
        }
    }

    if let Some(&(_, pos)) = stack.last() {
        return Err(SmilesError::UnmatchedParen { pos });
    }

    if let Some(digit) = ring_opens.iter().position(Option::is_some) {
        return Err(SmilesError::UnclosedRing {
            digit: digit as u16,
        });
    }

    Ok(ParseTree { atoms })
}

fn parse_atom_from_token(tok: &AtomToken) -> ParseAtom {
    ParseAtom {
        atomic_num: tok.atomic_num,
        is_aromatic: tok.is_aromatic,
        isotope: tok.isotope,
        chirality: tok.chirality,
        hcount: tok.hcount,
        charge: tok.charge,
        is_bracket: tok.is_bracket,
        has_preceding: false,
        neighbors: Vec::new(),
    }
}
