use super::error::FormatError;
use super::structure::{add_proximity_bonds, canonical_smiles_from_structure};
use super::traits::{ExtractOptions, MoleculeFormat};
use crate::core::chem::element::Element;
use crate::core::models::molecule::{Atom, BondOrder, MolGraph};
use nalgebra::{Matrix3, Point3, Vector3};
use std::collections::HashMap;
use std::io::{BufRead, Read};
use tracing::debug;

/// CIF reader for single molecules (mmCIF, small-molecule CIF and chemical component
/// dictionaries).
pub struct CifFile;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    DataBlock,
    Loop,
    Tag(String),
    Value(String),
}

fn tokenize(content: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        if let Some(first) = line.strip_prefix(';') {
            let mut text = vec![first.to_string()];
            for next in lines.by_ref() {
                if next.starts_with(';') {
                    break;
                }
                text.push(next.to_string());
            }
            tokens.push(Token::Value(text.join("\n").trim().to_string()));
            continue;
        }

        let chars: Vec<char> = line.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c.is_whitespace() {
                i += 1;
                continue;
            }
            if c == '#' {
                break;
            }
            if c == '\'' || c == '"' {
                // A quote only closes when followed by whitespace or the end of line.
                let start = i + 1;
                let mut end = start;
                while end < chars.len()
                    && !(chars[end] == c && chars.get(end + 1).is_none_or(|n| n.is_whitespace()))
                {
                    end += 1;
                }
                tokens.push(Token::Value(chars[start..end.min(chars.len())].iter().collect()));
                i = end + 1;
                continue;
            }
            let start = i;
            while i < chars.len() && !chars[i].is_whitespace() {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let lower = word.to_ascii_lowercase();
            if lower.starts_with("data_") {
                tokens.push(Token::DataBlock);
            } else if lower == "loop_" {
                tokens.push(Token::Loop);
            } else if word.starts_with('_') {
                tokens.push(Token::Tag(lower));
            } else {
                tokens.push(Token::Value(word));
            }
        }
    }
    tokens
}

#[derive(Debug, Default, Clone)]
struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    fn column(&self, tag: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == tag)
    }

    fn first_column(&self, tags: &[&str]) -> Option<usize> {
        tags.iter().find_map(|t| self.column(t))
    }
}

/// The first data block: single items and loops. Single items in a category form a
/// one-row table so both layouts are read the same way.
#[derive(Debug, Default)]
struct DataBlock {
    items: HashMap<String, String>,
    tables: Vec<Table>,
}

impl DataBlock {
    fn parse(tokens: &[Token]) -> Result<Self, FormatError> {
        let mut block = DataBlock::default();
        let mut iter = tokens.iter().peekable();
        let mut seen_block = false;

        while let Some(token) = iter.next() {
            match token {
                Token::DataBlock => {
                    if seen_block {
                        break;
                    }
                    seen_block = true;
                }
                Token::Loop => {
                    let mut table = Table::default();
                    while let Some(Token::Tag(tag)) = iter.peek() {
                        table.columns.push(tag.clone());
                        iter.next();
                    }
                    let mut values = Vec::new();
                    while let Some(Token::Value(v)) = iter.peek() {
                        values.push(v.clone());
                        iter.next();
                    }
                    if table.columns.is_empty() || values.len() % table.columns.len() != 0 {
                        return Err(FormatError::malformed(
                            "loop value count does not match its columns",
                        ));
                    }
                    table.rows = values
                        .chunks(table.columns.len())
                        .map(<[String]>::to_vec)
                        .collect();
                    block.tables.push(table);
                }
                Token::Tag(tag) => match iter.next() {
                    Some(Token::Value(v)) => {
                        block.items.insert(tag.clone(), v.clone());
                    }
                    _ => {
                        return Err(FormatError::malformed(format!("tag '{}' has no value", tag)));
                    }
                },
                Token::Value(v) => {
                    return Err(FormatError::malformed(format!("unexpected value '{}'", v)));
                }
            }
        }
        Ok(block)
    }

    /// Loop whose columns belong to the category, or the category's single items.
    fn category(&self, prefix: &str) -> Option<Table> {
        if let Some(table) = self
            .tables
            .iter()
            .find(|t| t.columns.iter().any(|c| c.starts_with(prefix)))
        {
            return Some(table.clone());
        }
        let mut pairs: Vec<(&String, &String)> = self
            .items
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .collect();
        if pairs.is_empty() {
            return None;
        }
        pairs.sort();
        Some(Table {
            columns: pairs.iter().map(|(k, _)| (*k).clone()).collect(),
            rows: vec![pairs.iter().map(|(_, v)| (*v).clone()).collect()],
        })
    }

    /// The loop holding any of `tags`, or the single items sharing `prefix`.
    fn table_with(&self, tags: &[&str], prefix: &str) -> Option<Table> {
        match self
            .tables
            .iter()
            .find(|t| t.first_column(tags).is_some())
        {
            Some(table) => Some(table.clone()),
            None => self.category(prefix).filter(|t| t.first_column(tags).is_some()),
        }
    }

    fn number(&self, tag: &str) -> Option<f64> {
        self.items.get(tag).and_then(|v| parse_number(v))
    }
}

fn is_missing(value: &str) -> bool {
    value == "?" || value == "."
}

/// Parses a CIF number, dropping a trailing standard uncertainty such as `1.234(5)`.
fn parse_number(value: &str) -> Option<f64> {
    if is_missing(value) {
        return None;
    }
    let bare = value.split('(').next().unwrap_or(value);
    bare.parse().ok()
}

fn element_from_type(symbol: &str) -> Option<Element> {
    let letters: String = symbol
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect();
    match letters.to_ascii_uppercase().as_str() {
        "D" | "T" => Some(Element::HYDROGEN),
        "" => None,
        _ => Element::from_symbol_ignore_case(&letters)
            .or_else(|| Element::from_symbol_ignore_case(&letters[..1])),
    }
}

fn charge_from_type(symbol: &str) -> i8 {
    let suffix: String = symbol
        .chars()
        .skip_while(|c| c.is_ascii_alphabetic())
        .collect();
    let sign = if suffix.ends_with('-') {
        -1
    } else if suffix.ends_with('+') {
        1
    } else {
        return 0;
    };
    let digits = suffix.trim_end_matches(['+', '-']);
    sign * digits.parse::<i8>().unwrap_or(1)
}

fn cell_matrix(block: &DataBlock) -> Option<Matrix3<f64>> {
    let a = block.number("_cell_length_a")?;
    let b = block.number("_cell_length_b")?;
    let c = block.number("_cell_length_c")?;
    let alpha = block.number("_cell_angle_alpha")?.to_radians();
    let beta = block.number("_cell_angle_beta")?.to_radians();
    let gamma = block.number("_cell_angle_gamma")?.to_radians();

    let cy = (alpha.cos() - beta.cos() * gamma.cos()) / gamma.sin();
    let cz = (1.0 - beta.cos().powi(2) - cy.powi(2)).max(0.0).sqrt();
    Some(Matrix3::from_columns(&[
        Vector3::new(a, 0.0, 0.0),
        Vector3::new(b * gamma.cos(), b * gamma.sin(), 0.0),
        Vector3::new(c * beta.cos(), c * cy, c * cz),
    ]))
}

const ATOM_SITE_COORDINATES: &[&str] = &[
    "_atom_site.cartn_x",
    "_atom_site.fract_x",
    "_atom_site_fract_x",
];

struct Structure {
    graph: MolGraph,
    names: HashMap<String, usize>,
}

fn atoms_from_atom_site(block: &DataBlock, table: &Table) -> Result<Structure, FormatError> {
    let cartesian = [
        table.first_column(&["_atom_site.cartn_x"]),
        table.first_column(&["_atom_site.cartn_y"]),
        table.first_column(&["_atom_site.cartn_z"]),
    ];
    let fractional = [
        table.first_column(&["_atom_site_fract_x", "_atom_site.fract_x"]),
        table.first_column(&["_atom_site_fract_y", "_atom_site.fract_y"]),
        table.first_column(&["_atom_site_fract_z", "_atom_site.fract_z"]),
    ];
    let symbol_col = table.first_column(&["_atom_site.type_symbol", "_atom_site_type_symbol"]);
    let label_col = table.first_column(&[
        "_atom_site_label",
        "_atom_site.label",
        "_atom_site.label_atom_id",
        "_atom_site.id",
    ]);
    let alt_col = table.first_column(&["_atom_site.label_alt_id", "_atom_site_disorder_assembly"]);
    let model_col = table.first_column(&["_atom_site.pdbx_pdb_model_num"]);
    let charge_col = table.first_column(&["_atom_site.pdbx_formal_charge"]);

    let cell = if cartesian.iter().all(Option::is_some) {
        None
    } else if fractional.iter().all(Option::is_some) {
        Some(cell_matrix(block).ok_or_else(|| {
            FormatError::malformed("fractional coordinates without complete _cell parameters")
        })?)
    } else {
        return Err(FormatError::malformed("_atom_site has no coordinate columns"));
    };
    let coord_cols = if cell.is_some() { fractional } else { cartesian };

    let first_model = model_col.and_then(|c| table.rows.first().map(|r| r[c].clone()));
    let first_alt = alt_col.and_then(|c| {
        table
            .rows
            .iter()
            .map(|r| r[c].as_str())
            .find(|v| !is_missing(v))
            .map(str::to_string)
    });

    let mut structure = Structure {
        graph: MolGraph::new(),
        names: HashMap::new(),
    };
    for row in &table.rows {
        if let (Some(c), Some(model)) = (model_col, first_model.as_ref()) {
            if &row[c] != model {
                continue;
            }
        }
        if let (Some(c), Some(alt)) = (alt_col, first_alt.as_ref()) {
            if !is_missing(&row[c]) && &row[c] != alt {
                continue;
            }
        }

        let label = label_col.map(|c| row[c].as_str()).unwrap_or("");
        let symbol = symbol_col.map(|c| row[c].as_str()).unwrap_or(label);
        let element = element_from_type(symbol).ok_or_else(|| {
            FormatError::malformed(format!("cannot determine element of atom '{}'", label))
        })?;

        let mut coords = [0.0; 3];
        for (slot, col) in coords.iter_mut().zip(coord_cols) {
            let raw = col.map(|c| row[c].as_str()).unwrap_or("?");
            *slot = parse_number(raw)
                .ok_or_else(|| FormatError::malformed(format!("invalid coordinate '{}'", raw)))?;
        }
        let mut position = Point3::new(coords[0], coords[1], coords[2]);
        if let Some(m) = cell.as_ref() {
            position = Point3::from(m * position.coords);
        }

        let charge = match charge_col.map(|c| row[c].as_str()) {
            Some(v) if !is_missing(v) => v.parse().unwrap_or(0),
            _ => charge_from_type(symbol),
        };

        let index = structure
            .graph
            .add_atom(Atom::new(element).with_position(position).with_charge(charge));
        if !label.is_empty() {
            structure.names.insert(label.to_string(), index);
        }
    }
    Ok(structure)
}

fn atoms_from_chem_comp(table: &Table) -> Result<Structure, FormatError> {
    let id_col = table
        .column("_chem_comp_atom.atom_id")
        .ok_or_else(|| FormatError::malformed("_chem_comp_atom has no atom_id column"))?;
    let symbol_col = table.column("_chem_comp_atom.type_symbol");
    let charge_col = table.column("_chem_comp_atom.charge");
    let coord_cols: Option<Vec<usize>> = ["x", "y", "z"]
        .iter()
        .map(|axis| {
            let ideal = format!("_chem_comp_atom.pdbx_model_cartn_{}_ideal", axis);
            let model = format!("_chem_comp_atom.model_cartn_{}", axis);
            table.first_column(&[ideal.as_str(), model.as_str()])
        })
        .collect();

    let mut structure = Structure {
        graph: MolGraph::new(),
        names: HashMap::new(),
    };
    for row in &table.rows {
        let name = row[id_col].as_str();
        let symbol = symbol_col.map(|c| row[c].as_str()).unwrap_or(name);
        let element = element_from_type(symbol).ok_or_else(|| {
            FormatError::malformed(format!("cannot determine element of atom '{}'", name))
        })?;
        let mut atom = Atom::new(element);
        if let Some(v) = charge_col.map(|c| row[c].as_str()).filter(|v| !is_missing(v)) {
            atom.charge = v
                .parse()
                .map_err(|_| FormatError::malformed(format!("invalid charge '{}'", v)))?;
        }
        let position = coord_cols.as_ref().and_then(|cols| {
            let values: Option<Vec<f64>> = cols.iter().map(|c| parse_number(&row[*c])).collect();
            values.map(|v| Point3::new(v[0], v[1], v[2]))
        });
        if let Some(position) = position {
            atom = atom.with_position(position);
        }
        let index = structure.graph.add_atom(atom);
        structure.names.insert(name.to_string(), index);
    }
    Ok(structure)
}

fn bond_order_from_value(value: &str) -> BondOrder {
    match value.to_ascii_uppercase().as_str() {
        "DOUB" | "DOUBLE" => BondOrder::Double,
        "TRIP" | "TRIPLE" => BondOrder::Triple,
        "AROM" | "AROMATIC" | "DELO" => BondOrder::Aromatic,
        _ => BondOrder::Single,
    }
}

/// Applies an explicit bond loop. Returns `false` when the block has none.
fn apply_bond_table(block: &DataBlock, structure: &mut Structure) -> Result<bool, FormatError> {
    let (table, first, second, order_col, aromatic_col) =
        if let Some(table) = block.category("_chem_comp_bond.") {
            let first = table.column("_chem_comp_bond.atom_id_1");
            let second = table.column("_chem_comp_bond.atom_id_2");
            let order = table.column("_chem_comp_bond.value_order");
            let aromatic = table.column("_chem_comp_bond.pdbx_aromatic_flag");
            (table, first, second, order, aromatic)
        } else if let Some(table) = block.category("_geom_bond_") {
            let first = table.column("_geom_bond_atom_site_label_1");
            let second = table.column("_geom_bond_atom_site_label_2");
            (table, first, second, None, None)
        } else {
            return Ok(false);
        };
    let (Some(first), Some(second)) = (first, second) else {
        return Err(FormatError::malformed("bond loop is missing atom columns"));
    };

    for row in &table.rows {
        let lookup = |name: &str| {
            structure
                .names
                .get(name)
                .copied()
                .ok_or_else(|| FormatError::malformed(format!("bond to unknown atom '{}'", name)))
        };
        let a = lookup(&row[first])?;
        let b = lookup(&row[second])?;
        let aromatic = aromatic_col.is_some_and(|c| row[c].eq_ignore_ascii_case("Y"));
        let order = if aromatic {
            BondOrder::Aromatic
        } else {
            order_col.map_or(BondOrder::Single, |c| bond_order_from_value(&row[c]))
        };
        structure.graph.add_bond(a, b, order);
    }
    for index in 0..structure.graph.atom_count() {
        let aromatic = structure
            .graph
            .neighbors(index)
            .iter()
            .any(|&(_, bond)| structure.graph.bond(bond).order == BondOrder::Aromatic);
        if aromatic {
            structure.graph.atom_mut(index).aromatic = true;
        }
    }
    Ok(true)
}

impl MoleculeFormat for CifFile {
    const FORMAT: &'static str = "cif";

    fn read_molecules(
        reader: &mut impl BufRead,
        _options: &ExtractOptions,
    ) -> Result<Vec<String>, FormatError> {
        let mut content = String::new();
        reader.read_to_string(&mut content)?;
        let block = DataBlock::parse(&tokenize(&content))?;

        let atom_site = block.table_with(ATOM_SITE_COORDINATES, "_atom_site");
        let mut structure = if let Some(table) = atom_site {
            atoms_from_atom_site(&block, &table)?
        } else if let Some(table) = block.category("_chem_comp_atom.") {
            atoms_from_chem_comp(&table)?
        } else {
            return Err(FormatError::malformed("no atoms found"));
        };
        if structure.graph.is_empty() {
            return Err(FormatError::malformed("no atoms found"));
        }

        if !apply_bond_table(&block, &mut structure)? {
            debug!("No bond loop in CIF; bonding by proximity");
            add_proximity_bonds(&mut structure.graph);
        }
        Ok(vec![canonical_smiles_from_structure(structure.graph)])
    }
}
