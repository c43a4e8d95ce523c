use std::collections::BTreeMap;

use anyhow::bail;
use serde_json::{Map, Value};

use crate::error::AssemblyError;

/// The three legal shapes of a constructor argument payload: a mapping means
/// named-parameter construction, a sequence means positional construction,
/// any other value is a single positional argument. JSON strings are plain
/// values here, never sequences, so every payload maps to exactly one
/// strategy.
#[derive(Debug, Clone)]
pub enum ArgPayload {
    Named(Map<String, Value>),
    Positional(Vec<Value>),
    Scalar(Value),
}

impl ArgPayload {
    pub fn from_value(value: &Value) -> ArgPayload {
        match value {
            Value::Null => ArgPayload::Named(Map::new()),
            Value::Object(map) => ArgPayload::Named(map.clone()),
            Value::Array(items) => ArgPayload::Positional(items.clone()),
            other => ArgPayload::Scalar(other.clone()),
        }
    }

    pub fn empty() -> ArgPayload {
        ArgPayload::Named(Map::new())
    }
}

/// Splits a declarative component spec into its class reference and argument
/// payload. An object must consist of exactly the two fields `class` and
/// `args`; a bare string names a class constructed without arguments.
pub fn spec_parts(value: &Value) -> Result<(String, ArgPayload), AssemblyError> {
    match value {
        Value::String(name) => Ok((name.clone(), ArgPayload::empty())),
        Value::Object(map) => {
            if map.len() != 2 {
                return Err(AssemblyError::ConfigurationFormat(format!(
                    "component specs take exactly two fields, `class` and `args`; found {}",
                    map.len()
                )));
            }
            let (Some(class), Some(args)) = (map.get("class"), map.get("args")) else {
                return Err(AssemblyError::ConfigurationFormat(
                    "component specs take exactly the fields `class` and `args`".to_string(),
                ));
            };
            let Some(name) = class.as_str() else {
                return Err(AssemblyError::ConfigurationFormat(
                    "the `class` field must be a string".to_string(),
                ));
            };
            Ok((name.to_string(), ArgPayload::from_value(args)))
        }
        other => Err(AssemblyError::ConfigurationFormat(format!(
            "component spec must be an object or a string, found: {other}"
        ))),
    }
}

/// A payload bound to declared parameter names, ready for a builder to pull
/// typed values out of.
#[derive(Debug, Clone, Default)]
pub struct BoundArgs {
    values: Map<String, Value>,
}

/// Binds a payload against a component's declared parameter list. Named
/// payloads may only use declared names; positional payloads are zipped with
/// the declaration order; a scalar binds to the first parameter.
pub fn bind(
    component: &str,
    params: &[&str],
    payload: &ArgPayload,
) -> Result<BoundArgs, AssemblyError> {
    let mut values = Map::new();
    match payload {
        ArgPayload::Named(map) => {
            for (key, value) in map {
                if !params.contains(&key.as_str()) {
                    return Err(AssemblyError::UnknownParameter {
                        component: component.to_string(),
                        name: key.clone(),
                    });
                }
                values.insert(key.clone(), value.clone());
            }
        }
        ArgPayload::Positional(items) => {
            if items.len() > params.len() {
                return Err(AssemblyError::ConfigurationFormat(format!(
                    "`{component}` takes at most {} positional argument(s), got {}",
                    params.len(),
                    items.len()
                )));
            }
            for (name, value) in params.iter().zip(items) {
                values.insert(name.to_string(), value.clone());
            }
        }
        ArgPayload::Scalar(value) => {
            let Some(first) = params.first() else {
                return Err(AssemblyError::ConfigurationFormat(format!(
                    "`{component}` takes no arguments"
                )));
            };
            values.insert(first.to_string(), value.clone());
        }
    }
    Ok(BoundArgs { values })
}

impl BoundArgs {
    pub fn insert(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.values.get(name) {
            Some(Value::Null) | None => None,
            Some(other) => Some(other),
        }
    }

    pub fn str_or(&self, name: &str, default: &str) -> anyhow::Result<String> {
        match self.value(name) {
            None => Ok(default.to_string()),
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => bail!("parameter `{name}` must be a string, got {other}"),
        }
    }

    pub fn opt_str(&self, name: &str) -> anyhow::Result<Option<String>> {
        match self.value(name) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => bail!("parameter `{name}` must be a string, got {other}"),
        }
    }

    pub fn bool_or(&self, name: &str, default: bool) -> anyhow::Result<bool> {
        match self.value(name) {
            None => Ok(default),
            Some(Value::Bool(b)) => Ok(*b),
            Some(other) => bail!("parameter `{name}` must be a boolean, got {other}"),
        }
    }

    pub fn u64_or(&self, name: &str, default: u64) -> anyhow::Result<u64> {
        match self.value(name) {
            None => Ok(default),
            Some(Value::Number(n)) => n
                .as_u64()
                .ok_or_else(|| anyhow::anyhow!("parameter `{name}` must be a non-negative integer")),
            Some(other) => bail!("parameter `{name}` must be a number, got {other}"),
        }
    }

    /// A flat string-to-string table, for metadata maps and language sets.
    pub fn string_map(&self, name: &str) -> anyhow::Result<BTreeMap<String, String>> {
        match self.value(name) {
            None => Ok(BTreeMap::new()),
            Some(Value::Object(map)) => map
                .iter()
                .map(|(k, v)| match v {
                    Value::String(s) => Ok((k.clone(), s.clone())),
                    other => bail!("entry `{k}` of `{name}` must be a string, got {other}"),
                })
                .collect(),
            Some(other) => bail!("parameter `{name}` must be an object, got {other}"),
        }
    }
}
