use super::error::FormatError;
use super::structure::{add_proximity_bonds, canonical_smiles_from_structure};
use super::traits::{ExtractOptions, MoleculeFormat, ProteinFormat};
use crate::core::chem::element::Element;
use crate::core::models::molecule::{Atom, BondOrder, MolGraph};
use crate::core::residues::one_letter_code;
use itertools::Itertools;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};

/// PDB reader. Proteins come from residue names, molecules from coordinates and CONECT
/// records.
pub struct PdbFile;

fn slice_and_trim(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn column(line: &str, index: usize) -> char {
    line.get(index..index + 1)
        .and_then(|s| s.chars().next())
        .unwrap_or(' ')
}

/// Residue numbers are kept as written, so hybrid-36 numbers past 9999 need no decoding.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ResidueKey {
    model: usize,
    chain: char,
    number: String,
    insertion: char,
}

#[derive(Debug, Clone)]
struct AtomRecord {
    serial: i64,
    name: String,
    alt_loc: char,
    residue_name: String,
    key: ResidueKey,
    position: Point3<f64>,
    element: String,
    charge: i8,
}

fn parse_float(line: &str, start: usize, end: usize, line_num: usize) -> Result<f64, FormatError> {
    let field = slice_and_trim(line, start, end);
    field.parse().map_err(|_| {
        FormatError::malformed(format!(
            "invalid coordinate '{}' in columns {}-{} on line {}",
            field,
            start + 1,
            end,
            line_num
        ))
    })
}

fn parse_charge(field: &str) -> i8 {
    let field = field.trim();
    let (digits, sign) = if let Some(d) = field.strip_suffix('+') {
        (d, 1)
    } else if let Some(d) = field.strip_suffix('-') {
        (d, -1)
    } else if let Some(d) = field.strip_prefix('+') {
        (d, 1)
    } else if let Some(d) = field.strip_prefix('-') {
        (d, -1)
    } else {
        return 0;
    };
    let magnitude: i8 = if digits.is_empty() {
        1
    } else {
        digits.parse().unwrap_or(0)
    };
    sign * magnitude
}

fn parse_atom_record(line: &str, line_num: usize, model: usize) -> Result<AtomRecord, FormatError> {
    if line.len() < 54 {
        return Err(FormatError::malformed(format!(
            "ATOM/HETATM record on line {} is too short",
            line_num
        )));
    }
    let serial_str = slice_and_trim(line, 6, 11);
    Ok(AtomRecord {
        // Serials above 99999 are not always numeric; they only matter for CONECT lookups.
        serial: serial_str.parse().unwrap_or(-1),
        name: line.get(12..16).unwrap_or("").to_string(),
        alt_loc: column(line, 16),
        residue_name: slice_and_trim(line, 17, 20).to_string(),
        key: ResidueKey {
            model,
            chain: column(line, 21),
            number: slice_and_trim(line, 22, 26).to_string(),
            insertion: column(line, 26),
        },
        position: Point3::new(
            parse_float(line, 30, 38, line_num)?,
            parse_float(line, 38, 46, line_num)?,
            parse_float(line, 46, 54, line_num)?,
        ),
        element: slice_and_trim(line, 76, 78).to_string(),
        charge: parse_charge(slice_and_trim(line, 78, 80)),
    })
}

/// Element from the element columns, falling back to the atom name alignment rule: names
/// starting in column 13 carry a two-letter element.
fn infer_element(record: &AtomRecord) -> Option<Element> {
    if !record.element.is_empty() {
        return Element::from_symbol_ignore_case(&record.element);
    }
    let name = record.name.as_str();
    if name.trim().len() == 4 && name.starts_with(['H', 'h']) {
        return Some(Element::HYDROGEN);
    }
    let starts_in_13 = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic());
    if starts_in_13 && name.len() >= 2 {
        if let Some(e) = name.get(0..2).and_then(Element::from_symbol_ignore_case) {
            return Some(e);
        }
    }
    let letter: String = name
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .take(1)
        .collect();
    Element::from_symbol_ignore_case(&letter)
}

struct PdbContents {
    atoms: Vec<AtomRecord>,
    conect: Vec<(i64, i64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadMode {
    /// Every model; unreadable atom records are skipped since only residue names matter.
    Sequence,
    /// First model only; any unreadable atom record fails the file.
    Structure,
}

fn read_records(
    reader: &mut impl BufRead,
    mode: ReadMode,
    options: &ExtractOptions,
) -> Result<PdbContents, FormatError> {
    let mut atoms = Vec::new();
    let mut conect = Vec::new();
    let mut model = 0usize;
    let mut model_seen = false;
    let mut past_first_model = false;

    for (line_num, line) in reader.lines().enumerate() {
        let line = line?;
        let line_num = line_num + 1;
        match slice_and_trim(&line, 0, 6) {
            "MODEL" => {
                if model_seen {
                    model += 1;
                }
                model_seen = true;
            }
            // CONECT records follow the last model, so scanning continues past it.
            "ENDMDL" => past_first_model = true,
            "ATOM" | "HETATM" => {
                if mode == ReadMode::Structure && past_first_model {
                    continue;
                }
                match parse_atom_record(&line, line_num, model) {
                    Ok(record) => atoms.push(record),
                    Err(e) if mode == ReadMode::Sequence => {
                        if options.warn_on_skipped {
                            warn!(line = line_num, error = %e, "Skipping unreadable atom record");
                        } else {
                            debug!(line = line_num, error = %e, "Skipping unreadable atom record");
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
            "CONECT" => {
                let serials: Vec<i64> = [6, 11, 16, 21, 26]
                    .iter()
                    .map(|start| slice_and_trim(&line, *start, start + 5))
                    .filter(|s| !s.is_empty())
                    .filter_map(|s| s.parse().ok())
                    .collect();
                if let Some((&source, targets)) = serials.split_first() {
                    conect.extend(targets.iter().map(|&t| (source, t)));
                }
            }
            "END" => break,
            _ => {}
        }
    }
    Ok(PdbContents { atoms, conect })
}

impl ProteinFormat for PdbFile {
    const FORMAT: &'static str = "pdb";

    fn read_sequences(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let contents = read_records(reader, ReadMode::Sequence, options)?;

        let mut chain_order: Vec<(usize, char)> = Vec::new();
        let residues: Vec<(ResidueKey, String)> = contents
            .atoms
            .into_iter()
            .map(|a| (a.key, a.residue_name))
            .unique_by(|(key, _)| key.clone())
            .inspect(|(key, _)| {
                if !chain_order.contains(&(key.model, key.chain)) {
                    chain_order.push((key.model, key.chain));
                }
            })
            .collect();

        let mut sequence = String::new();
        let ordered = residues.iter().sorted_by_key(|(key, _)| {
            chain_order
                .iter()
                .position(|c| *c == (key.model, key.chain))
                .unwrap_or(usize::MAX)
        });
        for (key, name) in ordered {
            match one_letter_code(name) {
                Some(code) => sequence.push(code),
                None => {
                    if options.warn_on_skipped {
                        warn!(
                            residue = %name,
                            chain = %key.chain,
                            number = %key.number,
                            "Skipping non-standard residue"
                        );
                    }
                }
            }
        }

        if sequence.is_empty() {
            return Err(FormatError::NoResidues);
        }
        debug!(length = sequence.len(), "Built sequence from PDB residues");
        Ok(vec![sequence])
    }
}

impl MoleculeFormat for PdbFile {
    const FORMAT: &'static str = "pdb";

    fn read_molecules(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let contents = read_records(reader, ReadMode::Structure, options)?;

        let first_alt = contents
            .atoms
            .iter()
            .map(|a| a.alt_loc)
            .find(|c| *c != ' ');
        let mut graph = MolGraph::new();
        let mut by_serial: HashMap<i64, usize> = HashMap::new();
        for record in &contents.atoms {
            if record.alt_loc != ' ' && Some(record.alt_loc) != first_alt {
                continue;
            }
            let element = infer_element(record).ok_or_else(|| {
                FormatError::malformed(format!(
                    "cannot determine element of atom '{}'",
                    record.name.trim()
                ))
            })?;
            let index = graph.add_atom(
                Atom::new(element)
                    .with_position(record.position)
                    .with_charge(record.charge),
            );
            if record.serial >= 0 {
                by_serial.insert(record.serial, index);
            }
        }
        if graph.is_empty() {
            return Err(FormatError::malformed("no atoms found"));
        }

        let mut listed: HashMap<(usize, usize), u8> = HashMap::new();
        for (source, target) in &contents.conect {
            if let (Some(&a), Some(&b)) = (by_serial.get(source), by_serial.get(target)) {
                *listed.entry((a, b)).or_default() += 1;
            }
        }
        // A bond is usually listed from both ends; only repeats from one end raise the order.
        let mut multiplicity: HashMap<(usize, usize), u8> = HashMap::new();
        for (&(a, b), &count) in &listed {
            let key = (a.min(b), a.max(b));
            let entry = multiplicity.entry(key).or_default();
            *entry = (*entry).max(count);
        }
        for ((a, b), count) in multiplicity.into_iter().sorted() {
            let order = (1..count).fold(BondOrder::Single, |order, _| order.promoted());
            graph.add_bond(a, b, order);
        }
        add_proximity_bonds(&mut graph);

        Ok(vec![canonical_smiles_from_structure(graph)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonicalize_smiles;
    use std::io::Cursor;

    fn atom_line(
        record: &str,
        serial: usize,
        name: &str,
        res: &str,
        chain: char,
        num: i32,
        xyz: (f64, f64, f64),
        element: &str,
    ) -> String {
        format!(
            "{:<6}{:>5} {:<4} {:>3} {}{:>4}    {:>8.3}{:>8.3}{:>8.3}{:>6.2}{:>6.2}          {:>2}",
            record, serial, name, res, chain, num, xyz.0, xyz.1, xyz.2, 1.0, 0.0, element
        )
    }

    fn with_alt_loc(line: String, alt: char) -> String {
        let mut chars: Vec<char> = line.chars().collect();
        chars[16] = alt;
        chars.into_iter().collect()
    }

    fn protein_pdb() -> String {
        [
            atom_line("ATOM", 1, " CA ", "MET", 'A', 1, (0.0, 0.0, 0.0), "C"),
            atom_line("ATOM", 2, " N  ", "MET", 'A', 1, (1.0, 0.0, 0.0), "N"),
            atom_line("ATOM", 3, " CA ", "LYS", 'A', 2, (3.8, 0.0, 0.0), "C"),
            atom_line("HETATM", 4, " O  ", "HOH", 'A', 3, (9.0, 0.0, 0.0), "O"),
            atom_line("ATOM", 5, " CA ", "THR", 'B', 1, (7.6, 0.0, 0.0), "C"),
            "END".to_string(),
        ]
        .join("\n")
    }

    #[test]
    fn builds_one_sequence_across_chains() {
        let mut reader = Cursor::new(protein_pdb());
        let sequences = PdbFile::read_sequences(&mut reader, &ExtractOptions::default()).unwrap();
        assert_eq!(sequences, ["MKT"]);
    }

    #[test]
    fn sequence_survives_short_lines_and_hybrid36_residue_numbers() {
        let mut hybrid = atom_line("ATOM", 6, " CA ", "GLY", 'B', 9999, (9.0, 1.0, 0.0), "C");
        hybrid.replace_range(22..26, "A000");
        let content = [
            atom_line("ATOM", 1, " CA ", "MET", 'A', 1, (0.0, 0.0, 0.0), "C"),
            atom_line("ATOM", 2, " CA ", "LYS", 'A', 2, (3.8, 0.0, 0.0), "C"),
            "ATOM      3  CA  ALA A   3".to_string(),
            atom_line("ATOM", 4, " CA ", "THR", 'B', 9999, (7.6, 0.0, 0.0), "C"),
            hybrid,
            "END".to_string(),
        ]
        .join("\n");
        let options = ExtractOptions {
            warn_on_skipped: false,
        };
        let sequences = PdbFile::read_sequences(&mut Cursor::new(content), &options).unwrap();
        assert_eq!(sequences, ["MKTG"]);
    }

    #[test]
    fn short_atom_line_still_fails_the_ligand_path() {
        let content = "HETATM    1  C1  LIG A   1\nEND\n";
        let result =
            PdbFile::read_molecules(&mut Cursor::new(content), &ExtractOptions::default());
        assert!(matches!(result, Err(FormatError::Malformed(_))));
    }

    #[test]
    fn structure_without_standard_residues_is_empty() {
        let content = atom_line("HETATM", 1, " O  ", "HOH", 'A', 1, (0.0, 0.0, 0.0), "O");
        let options = ExtractOptions {
            warn_on_skipped: false,
        };
        let result = PdbFile::read_sequences(&mut Cursor::new(content), &options);
        assert!(matches!(result, Err(FormatError::NoResidues)));
    }

    #[test]
    fn reads_ligand_with_conect_double_bond() {
        // Acetaldehyde: CONECT repeats C2=O from one end.
        let content = [
            atom_line("HETATM", 1, " C1 ", "ACE", 'A', 1, (0.0, 0.0, 0.0), "C"),
            atom_line("HETATM", 2, " C2 ", "ACE", 'A', 1, (1.50, 0.0, 0.0), "C"),
            atom_line("HETATM", 3, " O  ", "ACE", 'A', 1, (2.10, 1.05, 0.0), "O"),
            "CONECT    1    2".to_string(),
            "CONECT    2    1    3    3".to_string(),
            "CONECT    3    2".to_string(),
            "END".to_string(),
        ]
        .join("\n");
        let molecules =
            PdbFile::read_molecules(&mut Cursor::new(content), &ExtractOptions::default()).unwrap();
        assert_eq!(molecules, [canonicalize_smiles("CC=O").unwrap()]);
    }

    #[test]
    fn ligand_uses_first_model_and_first_alternate() {
        let content = [
            "MODEL        1".to_string(),
            atom_line("HETATM", 1, " C1 ", "LIG", 'A', 1, (0.0, 0.0, 0.0), "C"),
            with_alt_loc(
                atom_line("HETATM", 2, " O1 ", "LIG", 'A', 1, (1.43, 0.0, 0.0), "O"),
                'A',
            ),
            with_alt_loc(
                atom_line("HETATM", 3, " O1 ", "LIG", 'A', 1, (-1.43, 0.0, 0.0), "O"),
                'B',
            ),
            "ENDMDL".to_string(),
            "MODEL        2".to_string(),
            atom_line("HETATM", 1, " N1 ", "LIG", 'A', 1, (0.0, 0.0, 0.0), "N"),
            "ENDMDL".to_string(),
        ]
        .join("\n");
        let molecules =
            PdbFile::read_molecules(&mut Cursor::new(content), &ExtractOptions::default()).unwrap();
        assert_eq!(molecules, [canonicalize_smiles("CO").unwrap()]);
    }

    #[test]
    fn ligand_file_without_atoms_is_a_parse_error() {
        let result =
            PdbFile::read_molecules(&mut Cursor::new("HEADER x\nEND\n"), &ExtractOptions::default());
        assert!(matches!(result, Err(FormatError::Malformed(_))));
    }

    #[test]
    fn charge_columns_accept_both_sign_positions() {
        assert_eq!(parse_charge("1+"), 1);
        assert_eq!(parse_charge("2-"), -2);
        assert_eq!(parse_charge("-1"), -1);
        assert_eq!(parse_charge(""), 0);
    }

    #[test]
    fn element_is_inferred_from_atom_name_alignment() {
        let line = atom_line("HETATM", 1, "FE  ", "HEM", 'A', 1, (0.0, 0.0, 0.0), "");
        let record = parse_atom_record(&line, 1, 0).unwrap();
        assert_eq!(infer_element(&record), Element::from_symbol("Fe"));
        let line = atom_line("ATOM", 1, " CA ", "GLY", 'A', 1, (0.0, 0.0, 0.0), "");
        let record = parse_atom_record(&line, 1, 0).unwrap();
        assert_eq!(infer_element(&record), Some(Element::CARBON));
    }
}
