use phf::{Map, Set, phf_map, phf_set};

static THREE_TO_ONE: Map<&'static str, char> = phf_map! {
    "ALA" => 'A', "ARG" => 'R', "ASN" => 'N', "ASP" => 'D', "CYS" => 'C',
    "GLN" => 'Q', "GLU" => 'E', "GLY" => 'G', "HIS" => 'H', "ILE" => 'I',
    "LEU" => 'L', "LYS" => 'K', "MET" => 'M', "PHE" => 'F', "PRO" => 'P',
    "SER" => 'S', "THR" => 'T', "TRP" => 'W', "TYR" => 'Y', "VAL" => 'V',
};

static ONE_LETTER_CODES: Set<char> = phf_set! {
    'A', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'V', 'W', 'Y',
};

/// One-letter code of a standard residue name. Case-insensitive, surrounding whitespace ignored.
pub fn one_letter_code(residue_name: &str) -> Option<char> {
    let name = residue_name.trim().to_ascii_uppercase();
    THREE_TO_ONE.get(name.as_str()).copied()
}

pub fn is_standard_code(code: char) -> bool {
    ONE_LETTER_CODES.contains(&code)
}

/// Upper-cases a candidate sequence and drops every character that is not one of the
/// twenty standard one-letter codes.
pub fn clean_sequence(raw: &str) -> String {
    raw.chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| is_standard_code(*c))
        .collect()
}
