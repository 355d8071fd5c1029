//! SD file reader.
//!
//! Records are separated by `$$$$` lines. Each record is a V2000 or V3000 molfile followed by
//! optional `> <NAME>` data items. A record that fails to parse or validate is skipped; the
//! file only fails when no record survives.

use super::error::FormatError;
use super::traits::{ExtractOptions, MoleculeFormat, ProteinFormat};
use crate::core::chem::element::Element;
use super::structure::canonical_smiles_with_geometry;
use crate::core::chem::valence::{check_valence, fill_implicit_hydrogens};
use crate::core::models::molecule::{Atom, BondOrder, MolGraph};
use crate::core::residues::{clean_sequence, one_letter_code};
use itertools::Itertools;
use nalgebra::Point3;
use std::collections::HashMap;
use std::io::BufRead;
use tracing::{debug, warn};

pub struct SdfFile;

/// One parsed SD record.
#[derive(Debug, Clone)]
pub struct SdfRecord {
    pub title: String,
    pub graph: MolGraph,
    /// `V` atom-value annotations keyed by atom index, in atom order.
    pub atom_values: Vec<(usize, String)>,
    /// Data items in file order.
    pub properties: Vec<(String, String)>,
}

impl SdfRecord {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Raw sequence candidate: the first property whose name contains `SEQUENCE`, or the
    /// residue letters spelled out by the atom-value annotations.
    fn sequence_candidate(&self) -> Option<String> {
        if let Some((_, value)) = self
            .properties
            .iter()
            .find(|(key, value)| key.to_ascii_uppercase().contains("SEQUENCE") && !value.is_empty())
        {
            return Some(value.clone());
        }
        let letters: String = self
            .atom_values
            .iter()
            .filter_map(|(_, value)| {
                let mut tokens = value.split_whitespace();
                let name = tokens.next()?;
                Some((name.to_string(), tokens.next().map(str::to_string)))
            })
            .dedup()
            .filter_map(|(name, _)| one_letter_code(&name))
            .collect();
        (!letters.is_empty()).then_some(letters)
    }
}

fn field(line: &str, start: usize, end: usize) -> &str {
    line.get(start..end.min(line.len())).unwrap_or("").trim()
}

fn parse_field<T: std::str::FromStr>(
    line: &str,
    start: usize,
    end: usize,
    what: &str,
) -> Result<T, FormatError> {
    let value = field(line, start, end);
    value
        .parse()
        .map_err(|_| FormatError::malformed(format!("invalid {} '{}'", what, value)))
}

fn bond_order_from_code(code: u8) -> Result<BondOrder, FormatError> {
    match code {
        1 | 5..=8 => Ok(BondOrder::Single),
        2 => Ok(BondOrder::Double),
        3 => Ok(BondOrder::Triple),
        4 => Ok(BondOrder::Aromatic),
        other => Err(FormatError::malformed(format!("unknown bond type {}", other))),
    }
}

fn element_from_symbol(symbol: &str) -> Result<Element, FormatError> {
    match symbol {
        "D" | "T" => Ok(Element::HYDROGEN),
        _ => Element::from_symbol(symbol)
            .or_else(|| Element::from_symbol_ignore_case(symbol))
            .ok_or_else(|| FormatError::malformed(format!("unknown element '{}'", symbol))),
    }
}

fn add_bond_checked(
    graph: &mut MolGraph,
    a: usize,
    b: usize,
    order: BondOrder,
) -> Result<(), FormatError> {
    graph
        .add_bond(a, b, order)
        .map(|_| ())
        .ok_or_else(|| FormatError::malformed(format!("invalid bond {}-{}", a + 1, b + 1)))
}

fn mark_aromatic_atoms(graph: &mut MolGraph) {
    let aromatic: Vec<usize> = graph
        .bonds()
        .iter()
        .filter(|b| b.order == BondOrder::Aromatic)
        .flat_map(|b| [b.atom1, b.atom2])
        .collect();
    for index in aromatic {
        graph.atom_mut(index).aromatic = true;
    }
}

struct Ctab {
    graph: MolGraph,
    atom_values: Vec<(usize, String)>,
}

fn parse_v2000(lines: &[&str]) -> Result<Ctab, FormatError> {
    let counts = lines
        .get(3)
        .ok_or_else(|| FormatError::malformed("missing counts line"))?;
    let atom_count: usize = parse_field(counts, 0, 3, "atom count")?;
    let bond_count: usize = parse_field(counts, 3, 6, "bond count")?;

    let mut graph = MolGraph::new();
    for i in 0..atom_count {
        let line = lines
            .get(4 + i)
            .ok_or_else(|| FormatError::malformed("truncated atom block"))?;
        let position = Point3::new(
            parse_field(line, 0, 10, "x coordinate")?,
            parse_field(line, 10, 20, "y coordinate")?,
            parse_field(line, 20, 30, "z coordinate")?,
        );
        let symbol = field(line, 31, 34);
        let mut atom = Atom::new(element_from_symbol(symbol)?).with_position(position);
        atom.charge = match field(line, 36, 39) {
            "1" => 3,
            "2" => 2,
            "3" => 1,
            "5" => -1,
            "6" => -2,
            "7" => -3,
            _ => 0,
        };
        if symbol == "D" {
            atom.isotope = Some(2);
        } else if symbol == "T" {
            atom.isotope = Some(3);
        }
        graph.add_atom(atom);
    }

    let bond_start = 4 + atom_count;
    for i in 0..bond_count {
        let line = lines
            .get(bond_start + i)
            .ok_or_else(|| FormatError::malformed("truncated bond block"))?;
        let a: usize = parse_field(line, 0, 3, "bond atom")?;
        let b: usize = parse_field(line, 3, 6, "bond atom")?;
        let order = bond_order_from_code(parse_field(line, 6, 9, "bond type")?)?;
        if a == 0 || b == 0 {
            return Err(FormatError::malformed("bond references atom 0"));
        }
        add_bond_checked(&mut graph, a - 1, b - 1, order)?;
    }

    let mut atom_values = Vec::new();
    let mut charges_reset = false;
    let mut properties = lines[bond_start + bond_count..].iter();
    while let Some(line) = properties.next() {
        if line.starts_with("M  END") {
            break;
        }
        if line.starts_with("A  ") || line.starts_with("G  ") {
            properties.next();
            continue;
        }
        if let Some(rest) = line.strip_prefix("V  ") {
            let index: usize = parse_field(rest, 0, 3, "atom value index")?;
            if index == 0 || index > graph.atom_count() {
                return Err(FormatError::malformed("atom value for unknown atom"));
            }
            atom_values.push((index - 1, rest.get(3..).unwrap_or("").trim().to_string()));
            continue;
        }
        let tag = field(line, 0, 6);
        if tag != "M  CHG" && tag != "M  ISO" {
            continue;
        }
        if tag == "M  CHG" && !charges_reset {
            for index in 0..graph.atom_count() {
                graph.atom_mut(index).charge = 0;
            }
            charges_reset = true;
        }
        let entries: usize = parse_field(line, 6, 9, "property entry count")?;
        for entry in 0..entries {
            let start = 9 + entry * 8;
            let index: usize = parse_field(line, start, start + 4, "property atom")?;
            if index == 0 || index > graph.atom_count() {
                return Err(FormatError::malformed("property for unknown atom"));
            }
            let atom = graph.atom_mut(index - 1);
            if tag == "M  CHG" {
                atom.charge = parse_field(line, start + 4, start + 8, "charge")?;
            } else {
                atom.isotope = Some(parse_field(line, start + 4, start + 8, "isotope")?);
            }
        }
    }

    Ok(Ctab { graph, atom_values })
}

fn v3000_lines(lines: &[&str]) -> Vec<String> {
    let mut joined: Vec<String> = Vec::new();
    let mut continuing = false;
    for line in lines {
        let Some(body) = line.strip_prefix("M  V30 ") else {
            continue;
        };
        let (body, continues) = match body.trim_end().strip_suffix('-') {
            Some(stripped) => (stripped.to_string(), true),
            None => (body.trim_end().to_string(), false),
        };
        match joined.last_mut() {
            Some(last) if continuing => last.push_str(&body),
            _ => joined.push(body),
        }
        continuing = continues;
    }
    joined
}

fn parse_v3000(lines: &[&str]) -> Result<Ctab, FormatError> {
    #[derive(PartialEq)]
    enum Block {
        None,
        Atoms,
        Bonds,
    }

    let mut graph = MolGraph::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();
    let mut block = Block::None;

    for line in v3000_lines(lines) {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        match tokens.as_slice() {
            ["BEGIN", "ATOM", ..] => block = Block::Atoms,
            ["BEGIN", "BOND", ..] => block = Block::Bonds,
            ["END", ..] => block = Block::None,
            [id, symbol, x, y, z, _map, rest @ ..] if block == Block::Atoms => {
                let coordinate = |v: &str| {
                    v.parse::<f64>()
                        .map_err(|_| FormatError::malformed(format!("invalid coordinate '{}'", v)))
                };
                let mut atom = Atom::new(element_from_symbol(symbol)?)
                    .with_position(Point3::new(coordinate(*x)?, coordinate(*y)?, coordinate(*z)?));
                for option in rest {
                    if let Some(v) = option.strip_prefix("CHG=") {
                        atom.charge = v
                            .parse()
                            .map_err(|_| FormatError::malformed("invalid CHG value"))?;
                    } else if let Some(v) = option.strip_prefix("MASS=") {
                        atom.isotope = Some(
                            v.parse()
                                .map_err(|_| FormatError::malformed("invalid MASS value"))?,
                        );
                    }
                }
                let index = graph.add_atom(atom);
                by_id.insert((*id).to_string(), index);
            }
            [_id, kind, a, b, ..] if block == Block::Bonds => {
                let code: u8 = kind
                    .parse()
                    .map_err(|_| FormatError::malformed(format!("invalid bond type '{}'", kind)))?;
                let lookup = |id: &str| {
                    by_id
                        .get(id)
                        .copied()
                        .ok_or_else(|| FormatError::malformed(format!("unknown atom '{}'", id)))
                };
                let order = bond_order_from_code(code)?;
                add_bond_checked(&mut graph, lookup(*a)?, lookup(*b)?, order)?;
            }
            _ if block != Block::None => {
                return Err(FormatError::malformed(format!("malformed V3000 line '{}'", line)));
            }
            _ => {}
        }
    }

    Ok(Ctab {
        graph,
        atom_values: Vec::new(),
    })
}

fn parse_data_items(lines: &[&str]) -> Vec<(String, String)> {
    let mut properties = Vec::new();
    let mut iter = lines.iter().peekable();
    while let Some(line) = iter.next() {
        if !line.starts_with('>') {
            continue;
        }
        let Some(name) = line
            .find('<')
            .and_then(|start| line[start + 1..].find('>').map(|end| &line[start + 1..start + 1 + end]))
        else {
            continue;
        };
        let mut value_lines = Vec::new();
        while let Some(value) = iter.next_if(|l| !l.trim().is_empty() && !l.starts_with('>')) {
            value_lines.push(value.trim_end());
        }
        properties.push((name.to_string(), value_lines.join("\n")));
    }
    properties
}

/// Parses one record (the lines between `$$$$` separators).
pub fn parse_record(lines: &[&str]) -> Result<SdfRecord, FormatError> {
    let counts = lines
        .get(3)
        .ok_or_else(|| FormatError::malformed("record is shorter than a molfile header"))?;
    let end = lines
        .iter()
        .position(|l| l.starts_with("M  END"))
        .ok_or_else(|| FormatError::malformed("missing 'M  END'"))?;

    let ctab = if field(counts, 34, 39) == "V3000" {
        parse_v3000(&lines[..=end])?
    } else {
        parse_v2000(&lines[..=end])?
    };
    let Ctab {
        mut graph,
        atom_values,
    } = ctab;
    mark_aromatic_atoms(&mut graph);
    graph.fold_explicit_hydrogens();
    check_valence(&graph).map_err(|e| FormatError::malformed(e.to_string()))?;
    fill_implicit_hydrogens(&mut graph);

    Ok(SdfRecord {
        title: lines[0].trim().to_string(),
        graph,
        atom_values,
        properties: parse_data_items(&lines[end + 1..]),
    })
}

/// Reads every record, reporting each failure separately.
pub fn read_records(reader: &mut impl BufRead) -> Result<Vec<Result<SdfRecord, FormatError>>, FormatError> {
    let mut records = Vec::new();
    let mut current: Vec<String> = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim_end() == "$$$$" {
            let block: Vec<&str> = current.iter().map(String::as_str).collect();
            records.push(parse_record(&block));
            current.clear();
        } else {
            current.push(line);
        }
    }
    if current.iter().any(|l| !l.trim().is_empty()) {
        let block: Vec<&str> = current.iter().map(String::as_str).collect();
        records.push(parse_record(&block));
    }
    Ok(records)
}

fn valid_records(
    reader: &mut impl BufRead,
    options: &ExtractOptions,
) -> Result<Vec<SdfRecord>, FormatError> {
    Ok(read_records(reader)?
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| match record {
            Ok(record) => Some(record),
            Err(e) => {
                if options.warn_on_skipped {
                    warn!(record = index + 1, error = %e, "Skipping invalid SDF record");
                } else {
                    debug!(record = index + 1, error = %e, "Skipping invalid SDF record");
                }
                None
            }
        })
        .collect())
}

impl ProteinFormat for SdfFile {
    const FORMAT: &'static str = "sdf";

    fn read_sequences(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let sequences: Vec<String> = valid_records(reader, options)?
            .iter()
            .filter_map(|record| record.sequence_candidate())
            .map(|candidate| clean_sequence(&candidate))
            .filter(|sequence| !sequence.is_empty())
            .collect();
        if sequences.is_empty() {
            return Err(FormatError::NoRecords);
        }
        Ok(sequences)
    }
}

impl MoleculeFormat for SdfFile {
    const FORMAT: &'static str = "sdf";

    fn read_molecules(
        reader: &mut impl BufRead,
        options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let molecules: Vec<String> = valid_records(reader, options)?
            .into_iter()
            .map(|record| canonical_smiles_with_geometry(record.graph))
            .collect();
        if molecules.is_empty() {
            return Err(FormatError::NoRecords);
        }
        Ok(molecules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chem::canonicalize_smiles;
    use std::io::Cursor;

    const ETHANOL: &str = "\
ethanol
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5200    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.3500    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
M  END
> <NAME>
ethanol

$$$$
";

    const ACETATE_CHG: &str = "\
acetate
  test

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000    1.0500    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.1000   -1.0500    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  CHG  1   4  -1
M  END
$$$$
";

    const PENTAVALENT: &str = "\
bad
  test

  6  5  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.0000    0.0000    0.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
   -1.0000    0.0000    0.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000    1.0000    0.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000   -1.0000    0.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
    0.0000    0.0000    1.0000 F   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  1  3  1  0
  1  4  1  0
  1  5  1  0
  1  6  1  0
M  END
$$$$
";

    const V3000_BENZENE: &str = "\
benzene
  test

  0  0  0     0  0            999 V3000
M  V30 BEGIN CTAB
M  V30 COUNTS 6 6 0 0 0
M  V30 BEGIN ATOM
M  V30 1 C 1.3915 0.0 0.0 0
M  V30 2 C 0.6958 1.2051 0.0 0
M  V30 3 C -0.6958 1.2051 0.0 0
M  V30 4 C -1.3915 0.0 0.0 0
M  V30 5 C -0.6958 -1.2051 0.0 0
M  V30 6 C 0.6958 -1.2051 0.0 -
M  V30 0
M  V30 END ATOM
M  V30 BEGIN BOND
M  V30 1 4 1 2
M  V30 2 4 2 3
M  V30 3 4 3 4
M  V30 4 4 4 5
M  V30 5 4 5 6
M  V30 6 4 6 1
M  V30 END BOND
M  V30 END CTAB
M  END
$$$$
";

    const PEPTIDE_WITH_VALUES: &str = "\
dipeptide
  test

  3  2  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 N   0  0  0  0  0  0  0  0  0  0  0  0
    1.4500    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.0000    1.4000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  1  0
V    1 GLY 1
V    2 GLY 1
V    3 ALA 2
M  END
$$$$
";

    fn molfile(atoms: &[(&str, f64, f64, f64)], bonds: &[(usize, usize, u8)]) -> String {
        let mut out = format!(
            "generated\n  test\n\n{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000\n",
            atoms.len(),
            bonds.len()
        );
        for (symbol, x, y, z) in atoms {
            out.push_str(&format!(
                "{:>10.4}{:>10.4}{:>10.4} {:<3} 0  0  0  0  0  0  0  0  0  0  0  0\n",
                x, y, z, symbol
            ));
        }
        for (a, b, order) in bonds {
            out.push_str(&format!("{:>3}{:>3}{:>3}  0\n", a, b, order));
        }
        out.push_str("M  END\n$$$$\n");
        out
    }

    fn molecules(content: &str) -> Result<Vec<String>, FormatError> {
        SdfFile::read_molecules(&mut Cursor::new(content), &ExtractOptions::default())
    }

    fn sequences(content: &str) -> Result<Vec<String>, FormatError> {
        SdfFile::read_sequences(&mut Cursor::new(content), &ExtractOptions::default())
    }

    #[test]
    fn parses_record_with_properties() {
        let records = read_records(&mut Cursor::new(ETHANOL)).unwrap();
        let record = records[0].as_ref().unwrap();
        assert_eq!(record.title, "ethanol");
        assert_eq!(record.graph.atom_count(), 3);
        assert_eq!(record.property("NAME"), Some("ethanol"));
    }

    #[test]
    fn molecules_become_canonical_smiles() {
        let result = molecules(ETHANOL).unwrap();
        assert_eq!(result, [canonicalize_smiles("OCC").unwrap()]);
    }

    #[test]
    fn charge_block_overrides_atom_charges() {
        let result = molecules(ACETATE_CHG).unwrap();
        assert_eq!(result, [canonicalize_smiles("CC(=O)[O-]").unwrap()]);
    }

    #[test]
    fn invalid_records_are_skipped() {
        let content = format!("{}{}", PENTAVALENT, ETHANOL);
        let result = molecules(&content).unwrap();
        assert_eq!(result.len(), 1);
        assert!(matches!(molecules(PENTAVALENT), Err(FormatError::NoRecords)));
    }

    #[test]
    fn reads_v3000_aromatic_ring() {
        let result = molecules(V3000_BENZENE).unwrap();
        assert_eq!(result, ["c1ccccc1"]);
    }

    #[test]
    fn protein_sequence_prefers_sequence_property() {
        let content = ETHANOL.replace("> <NAME>\nethanol", "> <NAME>\nx\n\n> <Protein_Sequence>\nmkt-ay");
        assert_eq!(sequences(&content).unwrap(), ["MKTAY"]);
    }

    #[test]
    fn protein_sequence_falls_back_to_residue_annotations() {
        assert_eq!(sequences(PEPTIDE_WITH_VALUES).unwrap(), ["GA"]);
    }

    #[test]
    fn record_without_sequence_data_is_empty() {
        assert!(matches!(sequences(ETHANOL), Err(FormatError::NoRecords)));
    }

    #[test]
    fn stereocenter_from_3d_record_reads_back_unchanged() {
        let halomethane = |handedness: f64| {
            molfile(
                &[
                    ("C", 0.0, 0.0, 0.0),
                    ("F", 0.0, 0.0, 1.35),
                    ("Cl", 1.66 * handedness, 0.0, -0.59),
                    ("Br", -0.97 * handedness, 1.68, -0.68),
                    ("H", -0.51 * handedness, -0.89, -0.36),
                ],
                &[(1, 2, 1), (1, 3, 1), (1, 4, 1), (1, 5, 1)],
            )
        };
        let left = molecules(&halomethane(1.0)).unwrap().remove(0);
        let right = molecules(&halomethane(-1.0)).unwrap().remove(0);
        assert!(left.contains("@H]"), "{}", left);
        assert_ne!(left, right);
        assert_eq!(canonicalize_smiles(&left), Ok(left.clone()));
        assert_eq!(canonicalize_smiles(&right), Ok(right.clone()));
    }

    #[test]
    fn double_bond_geometry_from_2d_record() {
        let butene = |y: f64| {
            molfile(
                &[
                    ("C", -0.7, 1.2, 0.0),
                    ("C", 0.0, 0.0, 0.0),
                    ("C", 1.3, 0.0, 0.0),
                    ("C", 2.0, y, 0.0),
                ],
                &[(1, 2, 1), (2, 3, 2), (3, 4, 1)],
            )
        };
        let cis = molecules(&butene(1.2)).unwrap();
        let trans = molecules(&butene(-1.2)).unwrap();
        assert_eq!(cis, [canonicalize_smiles("C/C=C\\C").unwrap()]);
        assert_eq!(trans, [canonicalize_smiles("C/C=C/C").unwrap()]);
    }

    #[test]
    fn kekule_record_matches_aromatic_smiles() {
        let toluene = molfile(
            &[
                ("C", 1.3915, 0.0, 0.0),
                ("C", 0.6958, 1.2051, 0.0),
                ("C", -0.6958, 1.2051, 0.0),
                ("C", -1.3915, 0.0, 0.0),
                ("C", -0.6958, -1.2051, 0.0),
                ("C", 0.6958, -1.2051, 0.0),
                ("C", 2.9015, 0.0, 0.0),
            ],
            &[
                (1, 2, 2),
                (2, 3, 1),
                (3, 4, 2),
                (4, 5, 1),
                (5, 6, 2),
                (6, 1, 1),
                (1, 7, 1),
            ],
        );
        assert_eq!(molecules(&toluene).unwrap(), [canonicalize_smiles("Cc1ccccc1").unwrap()]);
    }

    #[test]
    fn separate_fragments_come_out_in_canonical_order() {
        let salt = |first: (&'static str, i8), second: (&'static str, i8)| {
            let record = molfile(
                &[(first.0, 0.0, 0.0, 0.0), (second.0, 5.0, 0.0, 0.0)],
                &[],
            );
            let chg = format!(
                "M  CHG  2   1{:>4}   2{:>4}\nM  END",
                first.1, second.1
            );
            record.replace("M  END", &chg)
        };
        let forward = molecules(&salt(("Na", 1), ("Cl", -1))).unwrap();
        let backward = molecules(&salt(("Cl", -1), ("Na", 1))).unwrap();
        assert_eq!(forward, backward);
        assert_eq!(forward, ["[Cl-].[Na+]"]);
    }
}
