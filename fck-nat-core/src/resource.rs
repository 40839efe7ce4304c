//! Resource - Representing resources to be provisioned

use std::collections::{HashMap, HashSet};
use std::fmt;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceId {
    /// Resource type (e.g., "security_group", "network_interface")
    pub resource_type: String,
    /// Binding name, unique within a plan
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Reference to an attribute of a provisioned resource
///
/// The concrete value only exists once the resource is deployed, so it is
/// carried around symbolically and rendered as `${binding.attribute}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub binding: String,
    pub attribute: String,
}

impl ResourceRef {
    pub fn new(binding: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            binding: binding.into(),
            attribute: attribute.into(),
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${{{}.{}}}", self.binding, self.attribute)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (binding_name, attribute_name)
    ResourceRef(String, String),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Collect binding names referenced anywhere inside this value
    pub fn collect_dependencies(&self, deps: &mut HashSet<String>) {
        match self {
            Value::ResourceRef(binding_name, _) => {
                deps.insert(binding_name.clone());
            }
            Value::List(items) => {
                for item in items {
                    item.collect_dependencies(deps);
                }
            }
            Value::Map(map) => {
                for v in map.values() {
                    v.collect_dependencies(deps);
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{}", s),
            Value::Int(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::List(items) => {
                let strs: Vec<_> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "[{}]", strs.join(", "))
            }
            Value::Map(map) => {
                let mut keys: Vec<_> = map.keys().collect();
                keys.sort();
                let strs: Vec<_> = keys
                    .into_iter()
                    .map(|k| format!("{}: {}", k, map[k]))
                    .collect();
                write!(f, "{{{}}}", strs.join(", "))
            }
            Value::ResourceRef(binding, attr) => write!(f, "${{{}.{}}}", binding, attr),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<ResourceRef> for Value {
    fn from(r: ResourceRef) -> Self {
        Value::ResourceRef(r.binding, r.attribute)
    }
}

impl From<&ResourceRef> for Value {
    fn from(r: &ResourceRef) -> Self {
        Value::ResourceRef(r.binding.clone(), r.attribute.clone())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

/// Desired resource handed to a provisioner
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that is looked up, not created
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Set the attribute only when a value is present
    pub fn with_optional_attribute(
        self,
        key: impl Into<String>,
        value: Option<impl Into<Value>>,
    ) -> Self {
        match value {
            Some(v) => self.with_attribute(key, v),
            None => self,
        }
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    /// Binding names this resource refers to
    pub fn dependencies(&self) -> HashSet<String> {
        let mut deps = HashSet::new();
        for value in self.attributes.values() {
            value.collect_dependencies(&mut deps);
        }
        deps
    }
}
