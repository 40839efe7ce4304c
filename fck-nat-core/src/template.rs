//! Template - Render a Plan as a CloudFormation-style JSON document
//!
//! Logical ids are the UpperCamelCase form of each binding. Property names come
//! from the schema's `provider_name`, falling back to UpperCamelCase of the
//! attribute name. References to an `id` attribute render as `Ref`, all others
//! as `Fn::GetAtt`. Strings with embedded references render as `Fn::Sub`.

use heck::ToUpperCamelCase;
use serde_json::{Map, json};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, Value};
use crate::schema::SchemaRegistry;

pub fn logical_id(binding: &str) -> String {
    binding.to_upper_camel_case()
}

/// Render the plan; resources go under `Resources`, data sources under `Lookups`
pub fn render(plan: &Plan, schemas: &SchemaRegistry) -> serde_json::Value {
    let mut resources = Map::new();
    let mut lookups = Map::new();

    for effect in plan.effects() {
        let resource = effect.resource();
        let rendered = render_resource(resource, schemas);
        match effect {
            Effect::Create(_) => resources.insert(logical_id(&resource.id.name), rendered),
            Effect::Read(_) => lookups.insert(logical_id(&resource.id.name), rendered),
        };
    }

    let mut document = Map::new();
    if !lookups.is_empty() {
        document.insert("Lookups".to_string(), serde_json::Value::Object(lookups));
    }
    document.insert("Resources".to_string(), serde_json::Value::Object(resources));
    serde_json::Value::Object(document)
}

fn render_resource(resource: &Resource, schemas: &SchemaRegistry) -> serde_json::Value {
    let schema = schemas.get(&resource.id.resource_type);

    let mut properties = Map::new();
    for (name, value) in &resource.attributes {
        let property = schema
            .and_then(|s| s.attributes.get(name))
            .and_then(|a| a.provider_name.clone())
            .unwrap_or_else(|| name.to_upper_camel_case());
        properties.insert(property, value_to_json(value));
    }

    let type_name = schema
        .and_then(|s| s.provider_type.clone())
        .unwrap_or_else(|| resource.id.resource_type.clone());

    json!({
        "Type": type_name,
        "Properties": properties,
    })
}

/// Convert a Value to JSON, rendering references as intrinsic functions
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::String(s) => match substitute_references(s) {
            Some(template) => json!({ "Fn::Sub": template }),
            None => json!(s),
        },
        Value::Int(n) => json!(n),
        Value::Bool(b) => json!(b),
        Value::List(items) => serde_json::Value::Array(items.iter().map(value_to_json).collect()),
        Value::Map(map) => {
            let obj: Map<_, _> = map
                .iter()
                .map(|(k, v)| (k.clone(), value_to_json(v)))
                .collect();
            serde_json::Value::Object(obj)
        }
        Value::ResourceRef(binding, attr) if attr == "id" => json!({ "Ref": logical_id(binding) }),
        Value::ResourceRef(binding, attr) => {
            json!({ "Fn::GetAtt": [logical_id(binding), attr.to_upper_camel_case()] })
        }
    }
}

/// Rewrite `${binding.attribute}` placeholders embedded in a string (such as
/// a rendered bootstrap script) into `Fn::Sub` syntax. Returns None when the
/// string holds no placeholder.
fn substitute_references(s: &str) -> Option<String> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    let mut found = false;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let placeholder = &after[..end];
        match placeholder.split_once('.') {
            Some((binding, attr)) if !binding.is_empty() && !attr.is_empty() => {
                found = true;
                if attr == "id" {
                    out.push_str(&format!("${{{}}}", logical_id(binding)));
                } else {
                    out.push_str(&format!(
                        "${{{}.{}}}",
                        logical_id(binding),
                        attr.to_upper_camel_case()
                    ));
                }
            }
            _ => {
                out.push_str("${");
                out.push_str(placeholder);
                out.push('}');
            }
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);

    found.then_some(out)
}
