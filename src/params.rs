//! Kernel module parameter encoding.
//!
//! Converts typed parameter values into the single string the kernel module
//! loader expects. The format is unforgiving: integers are bare decimals,
//! strings are double-quoted verbatim, lists are comma-joined with no
//! brackets, and entries are space-separated. A malformed string makes the
//! kernel silently misparse the parameter, so all formatting lives here.

use crate::error::{ModuleError, Result};

/// One element of a list-valued parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamItem {
    Int(i64),
    Str(String),
}

impl From<i64> for ParamItem {
    fn from(value: i64) -> Self {
        ParamItem::Int(value)
    }
}

impl From<i32> for ParamItem {
    fn from(value: i32) -> Self {
        ParamItem::Int(value as i64)
    }
}

impl From<&str> for ParamItem {
    fn from(value: &str) -> Self {
        ParamItem::Str(value.to_string())
    }
}

impl From<String> for ParamItem {
    fn from(value: String) -> Self {
        ParamItem::Str(value)
    }
}

/// A single module parameter value.
///
/// Lists must be homogeneous: all integers or all strings. The encoder
/// rejects mixed lists; other shapes (floats, nested mappings) are not
/// representable at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Str(String),
    List(Vec<ParamItem>),
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(value as i64)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<Vec<i64>> for ParamValue {
    fn from(values: Vec<i64>) -> Self {
        ParamValue::List(values.into_iter().map(ParamItem::Int).collect())
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::List(values.into_iter().map(ParamItem::from).collect())
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::List(values.into_iter().map(ParamItem::Str).collect())
    }
}

/// Insertion-ordered set of named parameters for one insert call.
///
/// Entries encode in the order they were first inserted; re-inserting an
/// existing name replaces its value but keeps its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterSet {
    entries: Vec<(String, ParamValue)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        ParameterSet::default()
    }

    /// Insert or replace a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter().position(|entry| entry.0 == name) {
            Some(index) => self.entries[index].1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Encode a single named parameter into its kernel form.
///
/// - `Int(v)` encodes as `name=<decimal>`.
/// - `Str(s)` encodes as `name="<s>"`. The literal is inserted verbatim; no
///   escaping is performed, so the caller must avoid characters that would
///   break the quoting.
/// - `List(items)` encodes as `name=v1,v2,...,vN` with no brackets; string
///   elements are quoted individually, integer elements are decimal. An
///   empty list encodes as `name=`.
///
/// # Errors
///
/// Returns `InvalidParameterType` when a list mixes integer and string
/// elements.
pub fn encode_param(name: &str, value: &ParamValue) -> Result<String> {
    match value {
        ParamValue::Int(number) => Ok(format!("{}={}", name, number)),
        ParamValue::Str(text) => Ok(format!("{}=\"{}\"", name, text)),
        ParamValue::List(items) => {
            if let Some(first) = items.first() {
                let kind = std::mem::discriminant(first);
                if items.iter().any(|item| std::mem::discriminant(item) != kind) {
                    return Err(ModuleError::InvalidParameterType(format!(
                        "parameter {} mixes integer and string list elements",
                        name
                    )));
                }
            }
            let joined = items
                .iter()
                .map(|item| match item {
                    ParamItem::Int(number) => number.to_string(),
                    ParamItem::Str(text) => format!("\"{}\"", text),
                })
                .collect::<Vec<_>>()
                .join(",");
            Ok(format!("{}={}", name, joined))
        }
    }
}

/// Encode a full parameter set into one kernel parameter string.
///
/// Entries are encoded in insertion order, each followed by a single space
/// (the module loader accepts trailing whitespace). An empty set encodes to
/// the empty string.
///
/// # Errors
///
/// Returns `InvalidParameterType` from the first entry that fails to encode.
pub fn encode_set(params: &ParameterSet) -> Result<String> {
    let mut encoded = String::new();
    for (name, value) in params.iter() {
        encoded.push_str(&encode_param(name, value)?);
        encoded.push(' ');
    }
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer() {
        let encoded = encode_param("debug", &ParamValue::Int(3)).unwrap();
        assert_eq!(encoded, "debug=3");
    }

    #[test]
    fn test_encode_negative_integer() {
        let encoded = encode_param("offset", &ParamValue::Int(-7)).unwrap();
        assert_eq!(encoded, "offset=-7");
    }

    #[test]
    fn test_encode_string_verbatim() {
        let encoded = encode_param("ifname", &ParamValue::from("eth%d")).unwrap();
        assert_eq!(encoded, "ifname=\"eth%d\"");
    }

    #[test]
    fn test_encode_string_no_escaping() {
        // The literal is inserted as-is, even when it would break quoting.
        let encoded = encode_param("label", &ParamValue::from("a\"b")).unwrap();
        assert_eq!(encoded, "label=\"a\"b\"");
    }

    #[test]
    fn test_encode_integer_list() {
        let encoded = encode_param("irq", &ParamValue::from(vec![10i64, 11, 12])).unwrap();
        assert_eq!(encoded, "irq=10,11,12");
    }

    #[test]
    fn test_encode_string_list() {
        let encoded = encode_param("names", &ParamValue::from(vec!["a", "b"])).unwrap();
        assert_eq!(encoded, "names=\"a\",\"b\"");
    }

    #[test]
    fn test_encode_single_element_list_has_no_comma() {
        let encoded = encode_param("irq", &ParamValue::from(vec![10i64])).unwrap();
        assert_eq!(encoded, "irq=10");
    }

    #[test]
    fn test_encode_empty_list() {
        let encoded = encode_param("irq", &ParamValue::List(Vec::new())).unwrap();
        assert_eq!(encoded, "irq=");
    }

    #[test]
    fn test_encode_mixed_list_is_rejected() {
        let mixed = ParamValue::List(vec![ParamItem::Int(1), ParamItem::from("a")]);
        let result = encode_param("bad", &mixed);
        assert!(matches!(result, Err(ModuleError::InvalidParameterType(_))));
    }

    #[test]
    fn test_encode_set_orders_and_trails_space() {
        let mut params = ParameterSet::new();
        params.insert("type", 1);
        params.insert("name", "eth0");
        params.insert("irq", vec![10i64, 11]);

        let encoded = encode_set(&params).unwrap();
        assert_eq!(encoded, "type=1 name=\"eth0\" irq=10,11 ");
    }

    #[test]
    fn test_encode_empty_set() {
        let encoded = encode_set(&ParameterSet::new()).unwrap();
        assert_eq!(encoded, "");
    }

    #[test]
    fn test_encode_set_stops_on_invalid_entry() {
        let mut params = ParameterSet::new();
        params.insert("ok", 1);
        params.insert(
            "bad",
            ParamValue::List(vec![ParamItem::Int(1), ParamItem::from("a")]),
        );

        let result = encode_set(&params);
        assert!(matches!(result, Err(ModuleError::InvalidParameterType(_))));
    }

    #[test]
    fn test_reinsert_replaces_value_keeps_position() {
        let mut params = ParameterSet::new();
        params.insert("a", 1);
        params.insert("b", 2);
        params.insert("a", 3);

        assert_eq!(params.len(), 2);
        let encoded = encode_set(&params).unwrap();
        assert_eq!(encoded, "a=3 b=2 ");
    }
}
