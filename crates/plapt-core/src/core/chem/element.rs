use phf::{Map, phf_map};
use std::fmt;

const SYMBOLS: [&str; 119] = [
    "*", "H", "He", "Li", "Be", "B", "C", "N", "O", "F", "Ne", "Na", "Mg", "Al", "Si", "P", "S",
    "Cl", "Ar", "K", "Ca", "Sc", "Ti", "V", "Cr", "Mn", "Fe", "Co", "Ni", "Cu", "Zn", "Ga", "Ge",
    "As", "Se", "Br", "Kr", "Rb", "Sr", "Y", "Zr", "Nb", "Mo", "Tc", "Ru", "Rh", "Pd", "Ag", "Cd",
    "In", "Sn", "Sb", "Te", "I", "Xe", "Cs", "Ba", "La", "Ce", "Pr", "Nd", "Pm", "Sm", "Eu", "Gd",
    "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu", "Hf", "Ta", "W", "Re", "Os", "Ir", "Pt", "Au", "Hg",
    "Tl", "Pb", "Bi", "Po", "At", "Rn", "Fr", "Ra", "Ac", "Th", "Pa", "U", "Np", "Pu", "Am", "Cm",
    "Bk", "Cf", "Es", "Fm", "Md", "No", "Lr", "Rf", "Db", "Sg", "Bh", "Hs", "Mt", "Ds", "Rg", "Cn",
    "Nh", "Fl", "Mc", "Lv", "Ts", "Og",
];

// Covalent radii in angstroms for the elements that commonly appear in ligands.
static COVALENT_RADII: Map<u8, f64> = phf_map! {
    1u8 => 0.31, 5u8 => 0.84, 6u8 => 0.76, 7u8 => 0.71, 8u8 => 0.66, 9u8 => 0.57,
    11u8 => 1.66, 12u8 => 1.41, 14u8 => 1.11, 15u8 => 1.07, 16u8 => 1.05, 17u8 => 1.02,
    19u8 => 2.03, 20u8 => 1.76, 25u8 => 1.39, 26u8 => 1.32, 27u8 => 1.26, 28u8 => 1.24,
    29u8 => 1.32, 30u8 => 1.22, 33u8 => 1.19, 34u8 => 1.20, 35u8 => 1.20, 53u8 => 1.39,
};

const DEFAULT_COVALENT_RADIUS: f64 = 1.50;

/// A chemical element identified by its atomic number. Atomic number 0 is the wildcard `*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Element(u8);

impl Element {
    pub const WILDCARD: Element = Element(0);
    pub const HYDROGEN: Element = Element(1);
    pub const BORON: Element = Element(5);
    pub const CARBON: Element = Element(6);
    pub const NITROGEN: Element = Element(7);
    pub const OXYGEN: Element = Element(8);
    pub const FLUORINE: Element = Element(9);
    pub const PHOSPHORUS: Element = Element(15);
    pub const SULFUR: Element = Element(16);
    pub const CHLORINE: Element = Element(17);
    pub const BROMINE: Element = Element(35);
    pub const IODINE: Element = Element(53);

    pub fn from_atomic_number(number: u8) -> Option<Self> {
        (usize::from(number) < SYMBOLS.len()).then_some(Element(number))
    }

    /// Looks up an element by its symbol with exact capitalization (`Cl`, not `CL`).
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        SYMBOLS
            .iter()
            .position(|s| *s == symbol)
            .map(|i| Element(i as u8))
    }

    /// Looks up an element by symbol ignoring case, as written in PDB and CIF files.
    pub fn from_symbol_ignore_case(symbol: &str) -> Option<Self> {
        let trimmed = symbol.trim();
        SYMBOLS
            .iter()
            .position(|s| s.eq_ignore_ascii_case(trimmed))
            .map(|i| Element(i as u8))
    }

    pub fn atomic_number(self) -> u8 {
        self.0
    }

    pub fn symbol(self) -> &'static str {
        SYMBOLS[usize::from(self.0)]
    }

    pub fn covalent_radius(self) -> f64 {
        COVALENT_RADII
            .get(&self.0)
            .copied()
            .unwrap_or(DEFAULT_COVALENT_RADIUS)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbol_lookup_is_case_sensitive() {
        assert_eq!(Element::from_symbol("Cl"), Some(Element::CHLORINE));
        assert_eq!(Element::from_symbol("CL"), None);
        assert_eq!(Element::from_symbol_ignore_case(" CL "), Some(Element::CHLORINE));
    }

    #[test]
    fn atomic_numbers_round_trip_through_symbols() {
        for n in 0..=118u8 {
            let e = Element::from_atomic_number(n).unwrap();
            assert_eq!(Element::from_symbol(e.symbol()), Some(e));
        }
        assert!(Element::from_atomic_number(119).is_none());
    }

    #[test]
    fn covalent_radius_falls_back_for_uncommon_elements() {
        assert_eq!(Element::CARBON.covalent_radius(), 0.76);
        assert_eq!(Element::from_symbol("U").unwrap().covalent_radius(), 1.50);
    }
}
