use std::fmt;
use std::path::PathBuf;

/// The kind of entity an input token describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Protein,
    Molecule,
}

impl Domain {
    pub fn plural(self) -> &'static str {
        match self {
            Domain::Protein => "proteins",
            Domain::Molecule => "molecules",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Protein => f.write_str("protein"),
            Domain::Molecule => f.write_str("molecule"),
        }
    }
}

/// A single command-line token after classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInputItem {
    /// Sequence or SMILES text given directly.
    Literal(String),
    /// Path to a file holding one or more entries.
    File(PathBuf),
}

impl RawInputItem {
    pub fn is_file(&self) -> bool {
        matches!(self, RawInputItem::File(_))
    }
}

/// An ordered sequence of canonical strings (amino-acid sequences or SMILES).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSet {
    items: Vec<String>,
}

impl InputSet {
    pub fn new(items: Vec<String>) -> Self {
        Self { items }
    }

    pub fn single(item: impl Into<String>) -> Self {
        Self {
            items: vec![item.into()],
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.items.iter()
    }

    pub fn into_inner(self) -> Vec<String> {
        self.items
    }

    /// Repeats the single element of this set `count` times.
    ///
    /// Returns `None` unless the set holds exactly one element.
    pub fn broadcast(&self, count: usize) -> Option<InputSet> {
        match self.items.as_slice() {
            [only] => Some(InputSet::new(vec![only.clone(); count])),
            _ => None,
        }
    }
}

impl From<Vec<String>> for InputSet {
    fn from(items: Vec<String>) -> Self {
        Self::new(items)
    }
}

impl IntoIterator for InputSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a InputSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
