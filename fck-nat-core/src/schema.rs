//! Schema - Attribute types and resource schemas
//!
//! Every resource type a provider can emit has a schema. The synthesizer checks
//! each resource against it before the resource enters a plan, and the
//! template renderer takes CloudFormation names from it.

use std::collections::HashMap;
use std::fmt;
use std::net::Ipv4Addr;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    String,
    Int,
    Bool,
    /// One of a fixed set of strings
    Enum(Vec<String>),
    /// Named refinement of `base` checked by `validate`
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    List(Box<AttributeType>),
    /// String-keyed map with values of one type
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check `value` against this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        // A reference is only known at deploy time; accept it wherever the
        // resolved value would be a string.
        if let Value::ResourceRef(_, _) = value
            && self.resolves_to_string()
        {
            return Ok(());
        }

        match self {
            AttributeType::Custom { validate, .. } => validate(value).map_err(TypeError::Invalid),
            AttributeType::Enum(allowed) => match value {
                Value::String(s) if allowed.contains(s) => Ok(()),
                Value::String(s) => Err(TypeError::NotAllowed {
                    value: s.clone(),
                    allowed: allowed.clone(),
                }),
                other => Err(self.mismatch(other)),
            },
            AttributeType::List(item) => match value {
                Value::List(items) => items.iter().enumerate().try_for_each(|(i, v)| {
                    item.validate(v).map_err(|e| e.at(format!("[{}]", i)))
                }),
                other => Err(self.mismatch(other)),
            },
            AttributeType::Map(item) => match value {
                Value::Map(entries) => entries
                    .iter()
                    .try_for_each(|(k, v)| item.validate(v).map_err(|e| e.at(format!(".{}", k)))),
                other => Err(self.mismatch(other)),
            },
            AttributeType::String if matches!(value, Value::String(_)) => Ok(()),
            AttributeType::Int if matches!(value, Value::Int(_)) => Ok(()),
            AttributeType::Bool if matches!(value, Value::Bool(_)) => Ok(()),
            _ => Err(self.mismatch(value)),
        }
    }

    fn resolves_to_string(&self) -> bool {
        match self {
            AttributeType::String => true,
            AttributeType::Custom { base, .. } => base.resolves_to_string(),
            _ => false,
        }
    }

    fn mismatch(&self, found: &Value) -> TypeError {
        TypeError::Mismatch {
            expected: self.to_string(),
            found: describe(found),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => write!(f, "string"),
            AttributeType::Int => write!(f, "int"),
            AttributeType::Bool => write!(f, "bool"),
            AttributeType::Enum(allowed) => write!(f, "one of {}", allowed.join("|")),
            AttributeType::Custom { name, .. } => write!(f, "{}", name),
            AttributeType::List(item) => write!(f, "list of {}", item),
            AttributeType::Map(item) => write!(f, "map of {}", item),
        }
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("string \"{}\"", s),
        Value::Int(n) => format!("int {}", n),
        Value::Bool(b) => format!("bool {}", b),
        Value::List(_) => "list".to_string(),
        Value::Map(_) => "map".to_string(),
        Value::ResourceRef(binding, attr) => format!("reference {}.{}", binding, attr),
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TypeError {
    #[error("expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },

    #[error("'{value}' is not allowed, use one of: {}", allowed.join(", "))]
    NotAllowed { value: String, allowed: Vec<String> },

    #[error("{0}")]
    Invalid(String),

    #[error("'{0}' is required")]
    Missing(String),

    /// Error inside a list item, map entry or named attribute
    #[error("{path}: {inner}")]
    At { path: String, inner: Box<TypeError> },
}

impl TypeError {
    fn at(self, segment: String) -> Self {
        match self {
            // Keep paths flat: `policies.attach[0]` instead of nested prefixes
            TypeError::At { path, inner } => TypeError::At {
                path: format!("{}{}", segment, path),
                inner,
            },
            other => TypeError::At {
                path: segment,
                inner: Box::new(other),
            },
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Value assumed when the attribute is absent
    pub default: Option<Value>,
    pub description: Option<String>,
    /// CloudFormation property name, e.g. `SubnetId`
    pub provider_name: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            default: None,
            description: None,
            provider_name: None,
        }
    }

    pub fn required(self) -> Self {
        Self {
            required: true,
            ..self
        }
    }

    pub fn with_default(self, value: Value) -> Self {
        Self {
            default: Some(value),
            ..self
        }
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_provider_name(self, name: impl Into<String>) -> Self {
        Self {
            provider_name: Some(name.into()),
            ..self
        }
    }

    fn is_satisfied_by(&self, attributes: &HashMap<String, Value>) -> bool {
        !self.required || self.default.is_some() || attributes.contains_key(&self.name)
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// CloudFormation type, e.g. `AWS::EC2::NetworkInterface`
    pub provider_type: Option<String>,
    /// Attribute other resources reference this one by
    pub identifier: String,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            provider_type: None,
            identifier: "id".to_string(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(self, description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..self
        }
    }

    pub fn with_provider_type(self, type_name: impl Into<String>) -> Self {
        Self {
            provider_type: Some(type_name.into()),
            ..self
        }
    }

    pub fn with_identifier(self, attribute: impl Into<String>) -> Self {
        Self {
            identifier: attribute.into(),
            ..self
        }
    }

    /// Check required attributes and the type of every known attribute.
    /// Attributes without a schema entry pass through unchecked.
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut missing: Vec<_> = self
            .attributes
            .values()
            .filter(|a| !a.is_satisfied_by(attributes))
            .map(|a| TypeError::Missing(a.name.clone()))
            .collect();
        missing.sort_by_key(|e| e.to_string());

        let mut invalid: Vec<_> = attributes
            .iter()
            .filter_map(|(name, value)| {
                let schema = self.attributes.get(name)?;
                schema
                    .attr_type
                    .validate(value)
                    .err()
                    .map(|e| e.at(name.clone()))
            })
            .collect();
        invalid.sort_by_key(|e| e.to_string());

        missing.extend(invalid);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }
}

/// Schemas indexed by resource type
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ResourceSchema>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a schema, replacing any earlier one for the same type
    pub fn register(&mut self, schema: ResourceSchema) {
        self.schemas.insert(schema.resource_type.clone(), schema);
    }

    pub fn get(&self, resource_type: &str) -> Option<&ResourceSchema> {
        self.schemas.get(resource_type)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl FromIterator<ResourceSchema> for SchemaRegistry {
    fn from_iter<I: IntoIterator<Item = ResourceSchema>>(iter: I) -> Self {
        let mut registry = Self::new();
        iter.into_iter().for_each(|schema| registry.register(schema));
        registry
    }
}

/// Reusable attribute types
pub mod types {
    use super::{AttributeType, Value, validate_cidr};

    /// Integer greater than zero
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "positive int".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n > 0 => Ok(()),
                Value::Int(n) => Err(format!("{} is not greater than zero", n)),
                _ => Err("expected an integer".to_string()),
            },
        }
    }

    /// IPv4 CIDR block such as `10.0.0.0/16`
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_cidr(s),
                _ => Err("expected a CIDR string".to_string()),
            },
        }
    }
}

/// Check that `cidr` is an IPv4 address followed by a prefix length of 0-32
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let (address, prefix) = cidr
        .split_once('/')
        .ok_or_else(|| format!("'{}' is not a CIDR block, expected address/prefix", cidr))?;

    address
        .parse::<Ipv4Addr>()
        .map_err(|_| format!("'{}' is not an IPv4 address", address))?;

    match prefix.parse::<u8>() {
        Ok(bits) if bits <= 32 => Ok(()),
        _ => Err(format!("'{}' is not a prefix length between 0 and 32", prefix)),
    }
}
