//! Table-property inspection: is a table transactional, insert-only or full ACID.
//!
//! Keys `transactional` / `transactional_properties` and the values `true` /
//! `insert_only` are compared ASCII case-insensitively.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::consts::{
    INSERTONLY_TRANSACTIONAL_PROPERTY, TABLE_IS_TRANSACTIONAL, TABLE_TRANSACTIONAL_PROPERTIES,
};

/// Default transactional mode applied to newly created tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionalType {
    /// Leave properties untouched.
    #[default]
    None,
    InsertOnly,
}

impl FromStr for TransactionalType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "none" => Ok(TransactionalType::None),
            "insert_only" => Ok(TransactionalType::InsertOnly),
            other => Err(anyhow!(
                "unknown transactional type '{other}' (expected none|insert_only)"
            )),
        }
    }
}

impl fmt::Display for TransactionalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionalType::None => write!(f, "none"),
            TransactionalType::InsertOnly => write!(f, "insert_only"),
        }
    }
}

fn prop<'a>(props: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    if let Some(v) = props.get(key) {
        return Some(v.as_str());
    }
    props
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

pub fn is_transactional_table(props: &HashMap<String, String>) -> bool {
    prop(props, TABLE_IS_TRANSACTIONAL).is_some_and(|v| v.eq_ignore_ascii_case("true"))
}

pub fn is_insert_only_table(props: &HashMap<String, String>) -> bool {
    is_transactional_table(props)
        && prop(props, TABLE_TRANSACTIONAL_PROPERTIES)
            .is_some_and(|v| v.eq_ignore_ascii_case(INSERTONLY_TRANSACTIONAL_PROPERTY))
}

pub fn is_full_acid_table(props: &HashMap<String, String>) -> bool {
    is_transactional_table(props) && !is_insert_only_table(props)
}

/// Apply the default transactional mode to a new table's properties.
/// Explicitly set properties win: nothing changes if either key is present.
/// Returns true when properties were modified.
pub fn set_transactional_properties(
    props: &mut HashMap<String, String>,
    default_type: TransactionalType,
) -> bool {
    if prop(props, TABLE_IS_TRANSACTIONAL).is_some()
        || prop(props, TABLE_TRANSACTIONAL_PROPERTIES).is_some()
    {
        return false;
    }

    match default_type {
        TransactionalType::None => false,
        TransactionalType::InsertOnly => {
            props.insert(TABLE_IS_TRANSACTIONAL.to_string(), "true".to_string());
            props.insert(
                TABLE_TRANSACTIONAL_PROPERTIES.to_string(),
                INSERTONLY_TRANSACTIONAL_PROPERTY.to_string(),
            );
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(kv: &[(&str, &str)]) -> HashMap<String, String> {
        kv.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn flags() {
        let p = props(&[("transactional", "TRUE")]);
        assert!(is_transactional_table(&p));
        assert!(is_full_acid_table(&p));
        assert!(!is_insert_only_table(&p));

        let p = props(&[("TRANSACTIONAL", "true"), ("transactional_properties", "Insert_Only")]);
        assert!(is_transactional_table(&p));
        assert!(is_insert_only_table(&p));
        assert!(!is_full_acid_table(&p));

        let p = props(&[("transactional", "false"), ("transactional_properties", "insert_only")]);
        assert!(!is_transactional_table(&p));
        assert!(!is_insert_only_table(&p));
        assert!(!is_full_acid_table(&p));

        assert!(!is_transactional_table(&HashMap::new()));
    }

    #[test]
    fn defaults_only_when_unset() {
        let mut p = HashMap::new();
        assert!(!set_transactional_properties(&mut p, TransactionalType::None));
        assert!(p.is_empty());

        assert!(set_transactional_properties(&mut p, TransactionalType::InsertOnly));
        assert!(is_insert_only_table(&p));

        let mut p = props(&[("transactional", "false")]);
        assert!(!set_transactional_properties(&mut p, TransactionalType::InsertOnly));
        assert_eq!(p.len(), 1);
        assert!(!is_transactional_table(&p));

        let mut p = props(&[("transactional_properties", "default")]);
        assert!(!set_transactional_properties(&mut p, TransactionalType::InsertOnly));
        assert!(!p.contains_key("transactional"));
    }

    #[test]
    fn transactional_type_parse() -> Result<()> {
        assert_eq!("insert-only".parse::<TransactionalType>()?, TransactionalType::InsertOnly);
        assert_eq!("NONE".parse::<TransactionalType>()?, TransactionalType::None);
        assert!("full".parse::<TransactionalType>().is_err());
        Ok(())
    }
}
