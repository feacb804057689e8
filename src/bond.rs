use bitflags::bitflags;
use petgraph::graph::NodeIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BondOrder {
    #[default]
    Single,
    Double,
    Triple,
}

impl BondOrder {
    pub fn as_u8(self) -> u8 {
        match self {
            BondOrder::Single => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WedgeKind {
    Up,
    Down,
    Wavy,
}

/// Depiction annotation on a bond. `begin` is the narrow end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Wedge {
    pub begin: NodeIndex,
    pub kind: WedgeKind,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct BondFlags: u8 {
        /// Double bond with two distinct substituents on each end.
        const CHIRAL = 1 << 0;
        /// Restricted-rotation axis.
        const ATROPISOMERIC = 1 << 1;
        const STEREO_CLEARED = 1 << 2;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bond {
    pub order: BondOrder,
    /// Aromatic bonds keep `order == Single`; only this flag marks them.
    pub is_aromatic: bool,
    pub wedge: Option<Wedge>,
    pub flags: BondFlags,
}

impl Bond {
    pub fn single() -> Self {
        Self::default()
    }

    pub fn double() -> Self {
        Self {
            order: BondOrder::Double,
            ..Self::default()
        }
    }

    /// A single bond whose wedge is not wavy.
    pub fn has_stereo_wedge(&self) -> bool {
        self.order == BondOrder::Single
            && matches!(
                self.wedge,
                Some(Wedge {
                    kind: WedgeKind::Up | WedgeKind::Down,
                    ..
                })
            )
    }
}

impl crate::traits::HasBondOrder for Bond {
    fn bond_order(&self) -> BondOrder {
        self.order
    }
}

impl crate::traits::HasBondAromaticity for Bond {
    fn is_aromatic_bond(&self) -> bool {
        self.is_aromatic
    }
}
