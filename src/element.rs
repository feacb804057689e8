//! Periodic-table lookups keyed by atomic number.

pub const H: u8 = 1;
pub const C: u8 = 6;
pub const N: u8 = 7;
pub const P: u8 = 15;
pub const S: u8 = 16;

static SYMBOLS: [&str; 118] = [
    "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne",
    "Na", "Mg", "Al", "Si", "P", "S", "Cl", "Ar", "K", "Ca",
    "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn",
    "Ga", "Ge", "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr",
    "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd", "In", "Sn",
    "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd",
    "Pm", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb",
    "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th",
    "Pa", "U", "Np", "Pu", "Am", "Cm", "Bk", "Cf", "Es", "Fm",
    "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds",
    "Rg", "Cn", "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

/// Case-sensitive symbol lookup (`"Cl"`, not `"CL"`).
pub fn atomic_num_from_symbol(symbol: &str) -> Option<u8> {
    SYMBOLS
        .iter()
        .position(|s| *s == symbol)
        .map(|i| i as u8 + 1)
}

/// Returns `"*"` for the dummy atom and anything out of range.
pub fn symbol(atomic_num: u8) -> &'static str {
    match atomic_num {
        1..=118 => SYMBOLS[atomic_num as usize - 1],
        _ => "*",
    }
}

/// Valences used to fill implicit hydrogens on organic-subset atoms.
pub fn default_valences(atomic_num: u8) -> &'static [u8] {
    match atomic_num {
        1 => &[1],
        5 => &[3],
        6 | 14 | 32 => &[4],
        7 | 15 | 33 => &[3, 5],
        8 => &[2],
        9 | 17 | 35 | 85 => &[1],
        16 | 34 | 52 => &[2, 4, 6],
        53 => &[1, 3, 5, 7],
        _ => &[],
    }
}

/// Everything that is neither a nonmetal, a noble gas nor a metalloid.
pub fn is_metal(atomic_num: u8) -> bool {
    !matches!(
        atomic_num,
        0 | 1 | 2 | 5..=10 | 14..=18 | 32..=36 | 51..=54 | 85 | 86 | 117 | 118
    ) && atomic_num <= 118
}

/// Three-coordinate atoms of these elements keep a stereo-bearing lone pair.
pub fn has_lone_pair_stereo(atomic_num: u8) -> bool {
    matches!(atomic_num, 7 | 15 | 16 | 33 | 34 | 52)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup() {
        assert_eq!(atomic_num_from_symbol("C"), Some(6));
        assert_eq!(atomic_num_from_symbol("Cl"), Some(17));
        assert_eq!(atomic_num_from_symbol("Og"), Some(118));
        assert_eq!(atomic_num_from_symbol("cl"), None);
        assert_eq!(symbol(26), "Fe");
        assert_eq!(symbol(0), "*");
    }

    #[test]
    fn metals() {
        for z in [3, 11, 26, 29, 30, 78, 92] {
            assert!(is_metal(z), "{} should be a metal", symbol(z));
        }
        for z in [0, 1, 6, 7, 8, 14, 16, 17, 33, 53] {
            assert!(!is_metal(z), "{} should not be a metal", symbol(z));
        }
    }

    #[test]
    fn valences() {
        assert_eq!(default_valences(6), &[4]);
        assert_eq!(default_valences(16), &[2, 4, 6]);
        assert!(default_valences(26).is_empty());
    }
}
