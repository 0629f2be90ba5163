//! Static module metadata records returned by describe queries.
//!
//! The native layer reports module metadata as `attribute: value` lines.
//! Most attributes are single-valued, but two repeat: `alias` (one line per
//! alias) and `parm` (one line per parameter, itself `name:description`).
//! [`ModuleInfo`] keeps attributes in report order and folds the repeated
//! ones into a list and an ordered map respectively.

/// Value of one module info attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoValue {
    /// Single-valued attribute (`filename`, `license`, `description`, ...).
    Scalar(String),
    /// The `alias` attribute: all aliases in report order.
    List(Vec<String>),
    /// The `parm` attribute: parameter name -> description, in report order.
    Map(Vec<(String, String)>),
}

/// Ordered attribute map describing one module.
///
/// Produced fresh per query; read-only to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleInfo {
    entries: Vec<(String, InfoValue)>,
}

impl ModuleInfo {
    pub fn new() -> Self {
        ModuleInfo::default()
    }

    /// Look up an attribute by name.
    pub fn get(&self, attribute: &str) -> Option<&InfoValue> {
        self.entries
            .iter()
            .find(|entry| entry.0 == attribute)
            .map(|entry| &entry.1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate attributes in report order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InfoValue)> {
        self.entries
            .iter()
            .map(|(attribute, value)| (attribute.as_str(), value))
    }

    fn position(&self, attribute: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.0 == attribute)
    }

    /// Set a single-valued attribute. A repeated scalar keeps its original
    /// position and takes the last value.
    pub fn set_scalar(&mut self, attribute: &str, value: &str) {
        let value = InfoValue::Scalar(value.to_string());
        match self.position(attribute) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((attribute.to_string(), value)),
        }
    }

    /// Append one alias to the `alias` attribute.
    pub fn push_alias(&mut self, alias: &str) {
        match self.position("alias") {
            Some(index) => match &mut self.entries[index].1 {
                InfoValue::List(values) => values.push(alias.to_string()),
                other => *other = InfoValue::List(vec![alias.to_string()]),
            },
            None => self
                .entries
                .push(("alias".to_string(), InfoValue::List(vec![alias.to_string()]))),
        }
    }

    /// Record one parameter in the `parm` attribute.
    pub fn push_parm(&mut self, name: &str, description: &str) {
        match self.position("parm") {
            Some(index) => match &mut self.entries[index].1 {
                InfoValue::Map(pairs) => {
                    match pairs.iter().position(|pair| pair.0 == name) {
                        Some(existing) => pairs[existing].1 = description.to_string(),
                        None => pairs.push((name.to_string(), description.to_string())),
                    }
                }
                other => {
                    *other = InfoValue::Map(vec![(name.to_string(), description.to_string())])
                }
            },
            None => self.entries.push((
                "parm".to_string(),
                InfoValue::Map(vec![(name.to_string(), description.to_string())]),
            )),
        }
    }

    /// Fold raw `attribute: value` lines into one record.
    ///
    /// `alias` lines collect into a list and `parm` lines into the ordered
    /// parameter map; a `parm` value without its own `:` separator yields
    /// an empty description. Lines without a separator are skipped.
    pub fn from_lines<'a, I>(lines: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut info = ModuleInfo::new();
        for line in lines {
            let (attribute, value) = match line.split_once(':') {
                Some(parts) => parts,
                None => continue,
            };
            let attribute = attribute.trim();
            let value = value.trim();
            if attribute.is_empty() {
                continue;
            }
            match attribute {
                "alias" => info.push_alias(value),
                "parm" => {
                    let (name, description) = match value.split_once(':') {
                        Some((name, description)) => (name.trim(), description.trim()),
                        None => (value, ""),
                    };
                    info.push_parm(name, description);
                }
                _ => info.set_scalar(attribute, value),
            }
        }
        info
    }
}
