use crate::element;
use crate::smiles::error::SmilesError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Atom(AtomToken),
    Bond(BondToken),
    RingClosure {
        bond: Option<BondToken>,
        digit: u16,
        pos: usize,
    },
    OpenParen(usize),
    CloseParen(usize),
    Dot(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomToken {
    pub atomic_num: u8,
    pub is_aromatic: bool,
    pub isotope: u16,
    pub chirality: ChiralityToken,
    pub hcount: Option<u8>,
    pub charge: i8,
    pub is_bracket: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChiralityToken {
    None,
    /// `@`
    CounterClockwise,
    /// `@@`
    Clockwise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BondToken {
    Single,
    Double,
    Triple,
    Aromatic,
    Up,
    Down,
}

impl BondToken {
    pub fn is_directional(self) -> bool {
        matches!(self, BondToken::Up | BondToken::Down)
    }

    pub fn flipped(self) -> Self {
        match self {
            BondToken::Up => BondToken::Down,
            BondToken::Down => BondToken::Up,
            other => other,
        }
    }
}

/// Organic-subset symbols, two-letter ones first so `Cl` wins over `C`.
const ORGANIC: [(&str, u8, bool); 16] = [
    ("Cl", 17, false),
    ("Br", 35, false),
    ("B", 5, false),
    ("C", 6, false),
    ("N", 7, false),
    ("O", 8, false),
    ("P", 15, false),
    ("S", 16, false),
    ("F", 9, false),
    ("I", 53, false),
    ("b", 5, true),
    ("c", 6, true),
    ("n", 7, true),
    ("o", 8, true),
    ("p", 15, true),
    ("s", 16, true),
];

/// Aromatic symbols allowed inside brackets.
const BRACKET_AROMATIC: [(&str, u8); 10] = [
    ("se", 34),
    ("te", 52),
    ("as", 33),
    ("b", 5),
    ("c", 6),
    ("n", 7),
    ("o", 8),
    ("p", 15),
    ("s", 16),
    ("si", 14),
];

fn starts_with_at(chars: &[char], i: usize, pat: &str) -> bool {
    let mut k = i;
    for pc in pat.chars() {
        if chars.get(k) != Some(&pc) {
            return false;
        }
        k += 1;
    }
    true
}

pub fn tokenize(input: &str) -> Result<Vec<Token>, SmilesError> {
    let chars: Vec<char> = input.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c.is_whitespace() {
            i += 1;
            continue;
        }
        if let Some(&(sym, z, aromatic)) = ORGANIC
            .iter()
            .find(|(s, _, _)| starts_with_at(&chars, i, s))
        {
            tokens.push(Token::Atom(bare_atom(z, aromatic)));
            i += sym.len();
            continue;
        }
        match c {
            '[' => {
                let (tok, next) = parse_bracket_atom(&chars, i)?;
                tokens.push(Token::Atom(tok));
                i = next;
            }
            '*' => {
                tokens.push(Token::Atom(bare_atom(0, false)));
                i += 1;
            }
            '-' | '=' | '#' | ':' | '/' | '\\' => {
                let bond = match c {
                    '-' => BondToken::Single,
                    '=' => BondToken::Double,
                    '#' => BondToken::Triple,
                    ':' => BondToken::Aromatic,
                    '/' => BondToken::Up,
                    _ => BondToken::Down,
                };
                if matches!(tokens.last(), Some(Token::Bond(_)) | Some(Token::Dot(_)) | None) {
                    return Err(SmilesError::UnexpectedChar { pos: i, ch: c });
                }
                tokens.push(Token::Bond(bond));
                i += 1;
            }
            '(' => {
                tokens.push(Token::OpenParen(i));
                i += 1;
            }
            ')' => {
                tokens.push(Token::CloseParen(i));
                i += 1;
            }
            '.' => {
                tokens.push(Token::Dot(i));
                i += 1;
            }
            '%' => {
                let digits: Option<Vec<u32>> =
                    (1..=2).map(|k| chars.get(i + k).and_then(|d| d.to_digit(10))).collect();
                let Some(digits) = digits else {
                    return Err(SmilesError::UnexpectedChar { pos: i, ch: '%' });
                };
                let bond = take_pending_bond(&mut tokens);
                tokens.push(Token::RingClosure {
                    bond,
                    digit: (digits[0] * 10 + digits[1]) as u16,
                    pos: i,
                });
                i += 3;
            }
            d if d.is_ascii_digit() => {
                let bond = take_pending_bond(&mut tokens);
                tokens.push(Token::RingClosure {
                    bond,
                    digit: d.to_digit(10).unwrap_or(0) as u16,
                    pos: i,
                });
                i += 1;
            }
            ch => return Err(SmilesError::UnexpectedChar { pos: i, ch }),
        }
    }

    Ok(tokens)
}

fn bare_atom(atomic_num: u8, is_aromatic: bool) -> AtomToken {
    AtomToken {
        atomic_num,
        is_aromatic,
        isotope: 0,
        chirality: ChiralityToken::None,
        hcount: None,
        charge: 0,
        is_bracket: false,
    }
}

/// A bond symbol written directly before a ring digit belongs to the closure.
fn take_pending_bond(tokens: &mut Vec<Token>) -> Option<BondToken> {
    match tokens.last() {
        Some(Token::Bond(b)) => {
            let b = *b;
            tokens.pop();
            Some(b)
        }
        _ => None,
    }
}

fn parse_number(chars: &[char], i: &mut usize) -> Option<u32> {
    let start = *i;
    let mut val: u32 = 0;
    while let Some(d) = chars.get(*i).and_then(|c| c.to_digit(10)) {
        val = val.saturating_mul(10).saturating_add(d);
        *i += 1;
    }
    (*i > start).then_some(val)
}

fn parse_bracket_atom(chars: &[char], start: usize) -> Result<(AtomToken, usize), SmilesError> {
    let mut i = start + 1;

    let isotope = parse_number(chars, &mut i).unwrap_or(0).min(u16::MAX as u32) as u16;
    let (atomic_num, is_aromatic) = parse_bracket_element(chars, &mut i, start)?;

    let chirality = if starts_with_at(chars, i, "@@") {
        i += 2;
        ChiralityToken::Clockwise
    } else if starts_with_at(chars, i, "@") {
        i += 1;
        ChiralityToken::CounterClockwise
    } else {
        ChiralityToken::None
    };

    let mut hcount = 0u8;
    if chars.get(i) == Some(&'H') {
        i += 1;
        hcount = match chars.get(i).and_then(|c| c.to_digit(10)) {
            Some(d) => {
                i += 1;
                d as u8
            }
            None => 1,
        };
    }

    let charge = parse_charge(chars, &mut i, start)?;

    if chars.get(i) == Some(&':') {
        i += 1;
        parse_number(chars, &mut i);
    }

    if chars.get(i) != Some(&']') {
        return Err(SmilesError::UnclosedBracket { pos: start });
    }

    Ok((
        AtomToken {
            atomic_num,
            is_aromatic,
            isotope,
            chirality,
            hcount: Some(hcount),
            charge,
            is_bracket: true,
        },
        i + 1,
    ))
}

fn parse_bracket_element(
    chars: &[char],
    i: &mut usize,
    bracket_start: usize,
) -> Result<(u8, bool), SmilesError> {
    let Some(&first) = chars.get(*i) else {
        return Err(SmilesError::UnclosedBracket { pos: bracket_start });
    };
    if first == '*' {
        *i += 1;
        return Ok((0, false));
    }
    if first.is_ascii_lowercase() {
        let mut best: Option<(&str, u8)> = None;
        for &(sym, z) in &BRACKET_AROMATIC {
            if starts_with_at(chars, *i, sym) && best.map_or(true, |(b, _)| sym.len() > b.len()) {
                best = Some((sym, z));
            }
        }
        if let Some((sym, z)) = best {
            *i += sym.len();
            return Ok((z, true));
        }
    }
    if first.is_ascii_uppercase() {
        if let Some(&second) = chars.get(*i + 1).filter(|c| c.is_ascii_lowercase()) {
            let sym: String = [first, second].iter().collect();
            if let Some(z) = element::atomic_num_from_symbol(&sym) {
                *i += 2;
                return Ok((z, false));
            }
        }
        if let Some(z) = element::atomic_num_from_symbol(&first.to_string()) {
            *i += 1;
            return Ok((z, false));
        }
    }
    Err(SmilesError::InvalidElement {
        pos: *i,
        text: first.to_string(),
    })
}

fn parse_charge(chars: &[char], i: &mut usize, bracket_start: usize) -> Result<i8, SmilesError> {
    let sign: i8 = match chars.get(*i) {
        Some('+') => 1,
        Some('-') => -1,
        _ => return Ok(0),
    };
    let sym = chars[*i];
    *i += 1;
    if let Some(n) = parse_number(chars, i) {
        let n = i8::try_from(n).map_err(|_| SmilesError::InvalidCharge { pos: bracket_start })?;
        return Ok(sign * n);
    }
    let mut count: i8 = 1;
    while chars.get(*i) == Some(&sym) {
        count = count
            .checked_add(1)
            .ok_or(SmilesError::InvalidCharge { pos: bracket_start })?;
        *i += 1;
    }
    Ok(sign * count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn atom(tok: &Token) -> &AtomToken {
        match tok {
            Token::Atom(a) => a,
            other => panic!("expected atom, got {other:?}"),
        }
    }

    #[test]
    fn organic_subset_prefers_two_letter_symbols() {
        let tokens = tokenize("ClCBr").unwrap();
        let nums: Vec<u8> = tokens.iter().map(|t| atom(t).atomic_num).collect();
        assert_eq!(nums, vec![17, 6, 35]);
    }

    #[test]
    fn bracket_atom_fields() {
        let tokens = tokenize("[13CH3+:7]").unwrap();
        let a = atom(&tokens[0]);
        assert_eq!(a.isotope, 13);
        assert_eq!(a.atomic_num, 6);
        assert_eq!(a.hcount, Some(3));
        assert_eq!(a.charge, 1);
        assert!(a.is_bracket);
    }

    #[test]
    fn chirality_marks() {
        let tokens = tokenize("[C@@H](F)(Cl)Br").unwrap();
        assert_eq!(atom(&tokens[0]).chirality, ChiralityToken::Clockwise);
        let tokens = tokenize("[C@H](F)(Cl)Br").unwrap();
        assert_eq!(atom(&tokens[0]).chirality, ChiralityToken::CounterClockwise);
    }

    #[test]
    fn ring_closures_carry_bonds() {
        let tokens = tokenize("C=1CC%12CC1").unwrap();
        assert!(matches!(
            tokens[1],
            Token::RingClosure {
                bond: Some(BondToken::Double),
                digit: 1,
                ..
            }
        ));
        assert!(matches!(tokens[4], Token::RingClosure { digit: 12, .. }));
    }

    #[test]
    fn charges() {
        for (s, q) in [("[O-]", -1), ("[O-2]", -2), ("[O--]", -2), ("[Fe+3]", 3)] {
            assert_eq!(atom(&tokenize(s).unwrap()[0]).charge, q, "{s}");
        }
    }

    #[test]
    fn aromatic_bracket_selenium() {
        let tokens = tokenize("[se]").unwrap();
        let a = atom(&tokens[0]);
        assert!(a.is_aromatic);
        assert_eq!(a.atomic_num, 34);
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            tokenize("C$C"),
            Err(SmilesError::UnexpectedChar { pos: 1, ch: '$' })
        ));
        assert!(matches!(
            tokenize("[C"),
            Err(SmilesError::UnclosedBracket { pos: 0 })
        ));
        assert!(matches!(tokenize("[Xx]"), Err(SmilesError::InvalidElement { .. })));
    }
}
