//! Declarative argument schemas for the exposed tools
//!
//! Each tool is described once by a [`ToolDescriptor`]. The same descriptor
//! renders the JSON schema advertised to the host and validates incoming
//! arguments at dispatch time, so the two cannot drift apart.
//!
//! Validation is lenient about representation and strict about meaning:
//! numeric strings and integral floats are accepted for integers, `"true"` /
//! `"false"` for booleans, `null` counts as absent, and unknown keys are
//! ignored. Range, enum, and URL constraints are always enforced.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use reqwest::Url;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::InvalidArgument;

/// Type and constraints of one parameter
#[derive(Debug, Clone, PartialEq)]
pub enum ParamType {
    String,
    /// Absolute `http` or `https` URL
    Url,
    Integer { min: i64, max: i64 },
    Boolean,
    /// One of a fixed set of lowercase strings
    Enum(&'static [&'static str]),
    /// Object whose values are all strings (e.g. HTTP headers)
    StringMap,
}

/// One declared parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<Value>,
    /// Alternative spellings accepted on input (e.g. camelCase)
    pub aliases: &'static [&'static str],
}

impl ParamSpec {
    fn new(name: &'static str, description: &'static str, param_type: ParamType) -> Self {
        Self {
            name,
            description,
            param_type,
            required: false,
            default: None,
            aliases: &[],
        }
    }

    pub fn string(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, ParamType::String)
    }

    pub fn url(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, ParamType::Url)
    }

    pub fn integer(name: &'static str, description: &'static str, min: i64, max: i64) -> Self {
        Self::new(name, description, ParamType::Integer { min, max })
    }

    pub fn boolean(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, ParamType::Boolean)
    }

    pub fn one_of(
        name: &'static str,
        description: &'static str,
        values: &'static [&'static str],
    ) -> Self {
        Self::new(name, description, ParamType::Enum(values))
    }

    pub fn string_map(name: &'static str, description: &'static str) -> Self {
        Self::new(name, description, ParamType::StringMap)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    fn json_schema(&self) -> Value {
        let mut schema = match &self.param_type {
            ParamType::String => json!({ "type": "string" }),
            ParamType::Url => json!({ "type": "string", "format": "uri" }),
            ParamType::Integer { min, max } => {
                json!({ "type": "integer", "minimum": min, "maximum": max })
            }
            ParamType::Boolean => json!({ "type": "boolean" }),
            ParamType::Enum(values) => json!({ "type": "string", "enum": values }),
            ParamType::StringMap => json!({
                "type": "object",
                "additionalProperties": { "type": "string" }
            }),
        };

        if let Value::Object(map) = &mut schema {
            map.insert("description".into(), Value::String(self.description.into()));
            if let Some(default) = &self.default {
                map.insert("default".into(), default.clone());
            }
        }
        schema
    }

    /// Find this parameter in the raw arguments, by name first, then by alias
    fn lookup<'a>(&self, args: &'a Map<String, Value>) -> Option<&'a Value> {
        std::iter::once(self.name)
            .chain(self.aliases.iter().copied())
            .filter_map(|key| args.get(key))
            .find(|value| !value.is_null())
    }

    fn coerce(&self, raw: &Value) -> Result<ArgValue, InvalidArgument> {
        let invalid = |reason: String| InvalidArgument::new(self.name, reason);

        match &self.param_type {
            ParamType::String => {
                let text = raw
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected a string, got {}", type_name(raw))))?;
                if self.required && text.trim().is_empty() {
                    return Err(invalid("must not be empty".into()));
                }
                Ok(ArgValue::String(text.to_string()))
            }
            ParamType::Url => {
                let text = raw
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected a URL string, got {}", type_name(raw))))?
                    .trim();
                let url = Url::parse(text)
                    .map_err(|e| invalid(format!("{text:?} is not a valid URL ({e})")))?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(invalid(format!(
                        "unsupported scheme {:?}, expected http or https",
                        url.scheme()
                    )));
                }
                Ok(ArgValue::String(text.to_string()))
            }
            ParamType::Integer { min, max } => {
                let number = coerce_integer(raw)
                    .ok_or_else(|| invalid(format!("expected an integer, got {raw}")))?;
                if number < *min || number > *max {
                    return Err(invalid(format!(
                        "must be between {min} and {max} (got {number})"
                    )));
                }
                Ok(ArgValue::Integer(number))
            }
            ParamType::Boolean => match raw {
                Value::Bool(flag) => Ok(ArgValue::Boolean(*flag)),
                Value::String(text) if text.eq_ignore_ascii_case("true") => {
                    Ok(ArgValue::Boolean(true))
                }
                Value::String(text) if text.eq_ignore_ascii_case("false") => {
                    Ok(ArgValue::Boolean(false))
                }
                other => Err(invalid(format!("expected a boolean, got {other}"))),
            },
            ParamType::Enum(values) => {
                let text = raw
                    .as_str()
                    .ok_or_else(|| invalid(format!("expected a string, got {}", type_name(raw))))?
                    .trim()
                    .to_ascii_lowercase();
                values
                    .iter()
                    .find(|allowed| **allowed == text)
                    .map(|allowed| ArgValue::String((*allowed).to_string()))
                    .ok_or_else(|| {
                        invalid(format!("{text:?} is not one of: {}", values.join(", ")))
                    })
            }
            ParamType::StringMap => {
                let object = raw
                    .as_object()
                    .ok_or_else(|| invalid(format!("expected an object, got {}", type_name(raw))))?;
                object
                    .iter()
                    .map(|(key, value)| match value {
                        Value::String(text) => Ok((key.clone(), text.clone())),
                        other => Err(invalid(format!(
                            "value for {key:?} must be a string, got {}",
                            type_name(other)
                        ))),
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(ArgValue::StringMap)
            }
        }
    }
}

/// Name, description, and argument schema of one tool
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub params: Vec<ParamSpec>,
}

impl ToolDescriptor {
    pub fn new(name: &'static str, description: &'static str, params: Vec<ParamSpec>) -> Self {
        Self {
            name,
            description,
            params,
        }
    }

    /// JSON schema object for the tool's arguments
    pub fn input_schema(&self) -> Map<String, Value> {
        let properties: Map<String, Value> = self
            .params
            .iter()
            .map(|param| (param.name.to_string(), param.json_schema()))
            .collect();
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|param| param.required)
            .map(|param| param.name)
            .collect();

        let mut schema = Map::new();
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        schema
    }

    pub fn input_schema_arc(&self) -> Arc<Map<String, Value>> {
        Arc::new(self.input_schema())
    }

    /// Check raw arguments against the schema, applying coercions and defaults
    pub fn validate(&self, args: &Map<String, Value>) -> Result<ValidatedArgs, InvalidArgument> {
        let mut values = HashMap::with_capacity(self.params.len());

        for param in &self.params {
            let value = match (param.lookup(args), &param.default) {
                (Some(raw), _) => param.coerce(raw)?,
                (None, Some(default)) => param.coerce(default)?,
                (None, None) if param.required => {
                    return Err(InvalidArgument::new(param.name, "is required"));
                }
                (None, None) => continue,
            };
            values.insert(param.name, value);
        }

        let ignored: Vec<&String> = args
            .keys()
            .filter(|key| {
                !self
                    .params
                    .iter()
                    .any(|p| p.name == key.as_str() || p.aliases.contains(&key.as_str()))
            })
            .collect();
        if !ignored.is_empty() {
            debug!(tool = self.name, ?ignored, "Ignoring undeclared arguments");
        }

        Ok(ValidatedArgs { values })
    }
}

/// A validated, coerced argument value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    String(String),
    Integer(i64),
    Boolean(bool),
    StringMap(BTreeMap<String, String>),
}

/// Arguments that passed validation, keyed by canonical parameter name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidatedArgs {
    values: HashMap<&'static str, ArgValue>,
}

impl ValidatedArgs {
    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.values.get(name)
    }

    pub fn str(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(ArgValue::String(text)) => Some(text),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(ArgValue::Integer(number)) => Some(*number),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.values.get(name) {
            Some(ArgValue::Boolean(flag)) => Some(*flag),
            _ => None,
        }
    }

    pub fn string_map(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        match self.values.get(name) {
            Some(ArgValue::StringMap(map)) => Some(map),
            _ => None,
        }
    }

    /// A string argument the schema marks as required
    pub fn required_str(&self, name: &str) -> Result<&str, InvalidArgument> {
        self.str(name)
            .ok_or_else(|| InvalidArgument::new(name, "is required"))
    }
}

fn coerce_integer(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(integral_float)),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .ok()
                .or_else(|| text.parse::<f64>().ok().and_then(integral_float))
        }
        _ => None,
    }
}

fn integral_float(value: f64) -> Option<i64> {
    (value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64)
        .then_some(value as i64)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
