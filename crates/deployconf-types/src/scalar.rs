//! Scalar-to-string coercion for pass-through engine fields
//!
//! `env_vars` values and `extra_args` items are handed to the launcher as
//! text, but YAML authors write `128` or `true` unquoted. Any scalar is
//! accepted and rendered as a string, whichever deserializer carries it.

use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, Visitor};
use std::fmt;

/// A string, number or boolean read as text
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScalarText(pub String);

impl From<ScalarText> for String {
    fn from(text: ScalarText) -> Self {
        text.0
    }
}

struct ScalarTextVisitor;

impl<'de> Visitor<'de> for ScalarTextVisitor {
    type Value = ScalarText;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a string, number or boolean")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(ScalarText(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(ScalarText(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(ScalarText(v.to_string()))
    }

    // Debug keeps the fractional part: 1.0 stays "1.0"
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(ScalarText(format!("{:?}", v)))
    }
}

impl<'de> Deserialize<'de> for ScalarText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ScalarTextVisitor)
    }
}

/// Optional map whose keys and values may be any scalar
pub fn string_map<'de, D>(deserializer: D) -> Result<Option<IndexMap<String, String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let map = Option::<IndexMap<ScalarText, ScalarText>>::deserialize(deserializer)?;
    Ok(map.map(|m| m.into_iter().map(|(k, v)| (k.0, v.0)).collect()))
}

/// Optional list whose items may be any scalar
pub fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let list = Option::<Vec<ScalarText>>::deserialize(deserializer)?;
    Ok(list.map(|items| items.into_iter().map(String::from).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Args {
        #[serde(default, deserialize_with = "string_map")]
        env: Option<IndexMap<String, String>>,
        #[serde(default, deserialize_with = "string_list")]
        args: Option<Vec<String>>,
    }

    const TEXT: &str = "env: {A: 1, B: true, C: x}\nargs: [--n, 128, 0.5, 1.0]\n";

    #[test]
    fn scalars_read_as_text_from_text_and_value() {
        let direct: Args = serde_yaml::from_str(TEXT).unwrap();
        let value: serde_yaml::Value = serde_yaml::from_str(TEXT).unwrap();
        let via_value: Args = serde_yaml::from_value(value).unwrap();

        for parsed in [direct, via_value] {
            let env = parsed.env.unwrap();
            assert_eq!(env["A"], "1");
            assert_eq!(env["B"], "true");
            assert_eq!(env["C"], "x");
            assert_eq!(parsed.args.unwrap(), vec!["--n", "128", "0.5", "1.0"]);
        }
    }

    #[test]
    fn null_and_missing_are_none() {
        let parsed: Args = serde_yaml::from_str("env: null\n").unwrap();
        assert!(parsed.env.is_none());
        assert!(parsed.args.is_none());
    }

    #[test]
    fn nested_collections_are_rejected() {
        assert!(serde_yaml::from_str::<Args>("args: [[a]]\n").is_err());
        assert!(serde_yaml::from_str::<Args>("env: {A: {B: c}}\n").is_err());
    }
}
