//! AWS-specific attribute types

use std::sync::LazyLock;

use fck_nat_core::resource::Value;
use fck_nat_core::schema::AttributeType;
use regex::Regex;

static IAM_ACTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9-]+:[A-Za-z0-9*]+$").expect("IAM action pattern is valid")
});

/// Instance type (e.g., "t4g.micro")
pub fn instance_type() -> AttributeType {
    AttributeType::Custom {
        name: "InstanceType".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if s.contains('.') && !s.starts_with('.') && !s.ends_with('.') => {
                Ok(())
            }
            Value::String(s) => Err(format!("Invalid instance type '{}'", s)),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Port number type (with validation)
pub fn port_number() -> AttributeType {
    AttributeType::Custom {
        name: "PortNumber".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| {
            if let Value::Int(n) = value {
                // -1 stands for all ports when the protocol is -1
                if (-1..=65535).contains(n) {
                    Ok(())
                } else {
                    Err("Port number must be between -1 and 65535".to_string())
                }
            } else {
                Err("Expected integer".to_string())
            }
        },
    }
}

/// Protocol type for security group rules
pub fn protocol() -> AttributeType {
    AttributeType::Enum(vec![
        "tcp".to_string(),
        "udp".to_string(),
        "icmp".to_string(),
        "-1".to_string(), // All traffic
    ])
}

/// Policy language version written into every generated document
pub const POLICY_VERSION: &str = "2012-10-17";

/// IAM policy document: `Version` plus a non-empty `Statement` list
pub fn policy_document() -> AttributeType {
    AttributeType::Custom {
        name: "PolicyDocument".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: validate_document,
    }
}

/// Inline policies: a list of maps with `PolicyName` and `PolicyDocument`
pub fn inline_policies() -> AttributeType {
    AttributeType::Custom {
        name: "InlinePolicies".to_string(),
        base: Box::new(AttributeType::List(Box::new(AttributeType::Map(Box::new(
            AttributeType::String,
        ))))),
        validate: |value| {
            let Value::List(policies) = value else {
                return Err("Expected list of inline policies".to_string());
            };
            for (i, policy) in policies.iter().enumerate() {
                let Value::Map(map) = policy else {
                    return Err(format!("policy {}: Expected map", i));
                };
                match map.get("PolicyName") {
                    Some(Value::String(name)) if !name.is_empty() => {}
                    _ => return Err(format!("policy {}: PolicyName must be a string", i)),
                }
                let document = map
                    .get("PolicyDocument")
                    .ok_or_else(|| format!("policy {}: PolicyDocument is required", i))?;
                validate_document(document).map_err(|e| format!("policy {}: {}", i, e))?;
            }
            Ok(())
        },
    }
}

fn validate_document(value: &Value) -> Result<(), String> {
    let Value::Map(map) = value else {
        return Err("Expected policy document map".to_string());
    };
    match map.get("Version") {
        Some(Value::String(v)) if v == POLICY_VERSION => {}
        _ => return Err(format!("Version must be {}", POLICY_VERSION)),
    }
    match map.get("Statement") {
        Some(Value::List(statements)) if !statements.is_empty() => {
            for (i, statement) in statements.iter().enumerate() {
                validate_statement(statement).map_err(|e| format!("statement {}: {}", i, e))?;
            }
            Ok(())
        }
        _ => Err("Statement must be a non-empty list".to_string()),
    }
}

fn validate_statement(statement: &Value) -> Result<(), String> {
    let Value::Map(map) = statement else {
        return Err("Expected map".to_string());
    };

    match map.get("Effect") {
        Some(Value::String(e)) if e == "Allow" || e == "Deny" => {}
        _ => return Err("Effect must be Allow or Deny".to_string()),
    }

    match map.get("Action") {
        Some(Value::List(actions)) if !actions.is_empty() => {
            for action in actions {
                match action {
                    Value::String(a) if IAM_ACTION_PATTERN.is_match(a) => {}
                    other => return Err(format!("invalid action {}", other)),
                }
            }
        }
        _ => return Err("Action must be a non-empty list".to_string()),
    }

    // Trust policies name a principal instead of resources
    if map.contains_key("Principal") {
        return match map.get("Principal") {
            Some(Value::Map(principal)) if !principal.is_empty() => Ok(()),
            _ => Err("Principal must be a non-empty map".to_string()),
        };
    }

    match map.get("Resource") {
        Some(Value::List(resources)) if !resources.is_empty() => {
            if resources
                .iter()
                .all(|r| matches!(r, Value::String(_) | Value::ResourceRef(_, _)))
            {
                Ok(())
            } else {
                Err("Resource must hold strings or references".to_string())
            }
        }
        _ => Err("Resource must be a non-empty list".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn statement(effect: &str, actions: Vec<&str>, resources: Vec<Value>) -> Value {
        let mut map = HashMap::new();
        map.insert("Effect".to_string(), Value::from(effect));
        map.insert("Action".to_string(), Value::from(actions));
        map.insert("Resource".to_string(), Value::List(resources));
        Value::Map(map)
    }

    fn document(version: &str, statements: Vec<Value>) -> Value {
        let mut map = HashMap::new();
        map.insert("Version".to_string(), Value::from(version));
        map.insert("Statement".to_string(), Value::List(statements));
        Value::Map(map)
    }

    #[test]
    fn valid_policy_document() {
        let t = policy_document();
        let value = document(
            POLICY_VERSION,
            vec![statement(
                "Allow",
                vec!["ec2:AttachNetworkInterface", "ssm:GetParameter"],
                vec![
                    Value::from("*"),
                    Value::from("arn:aws:ssm:*:*:parameter/${param.id}"),
                ],
            )],
        );
        assert!(t.validate(&value).is_ok());
    }

    #[test]
    fn invalid_policy_documents() {
        let t = policy_document();
        let bad_action = document(
            POLICY_VERSION,
            vec![statement("Allow", vec!["AttachNetworkInterface"], vec![Value::from("*")])],
        );
        assert!(t.validate(&bad_action).is_err());

        let bad_effect = document(
            POLICY_VERSION,
            vec![statement("Maybe", vec!["ec2:AttachNetworkInterface"], vec![Value::from("*")])],
        );
        assert!(t.validate(&bad_effect).is_err());

        let no_resources = document(
            POLICY_VERSION,
            vec![statement("Allow", vec!["ec2:AttachNetworkInterface"], vec![])],
        );
        assert!(t.validate(&no_resources).is_err());

        let lowercase_keys = {
            let mut map = HashMap::new();
            map.insert("effect".to_string(), Value::from("Allow"));
            map.insert("actions".to_string(), Value::from(vec!["ec2:AttachNetworkInterface"]));
            map.insert("resources".to_string(), Value::from(vec!["*"]));
            document(POLICY_VERSION, vec![Value::Map(map)])
        };
        assert!(t.validate(&lowercase_keys).is_err());

        let old_version = document(
            "2008-10-17",
            vec![statement("Allow", vec!["ec2:AttachNetworkInterface"], vec![Value::from("*")])],
        );
        assert!(t.validate(&old_version).is_err());
    }

    #[test]
    fn trust_statement_needs_principal_not_resource() {
        let mut principal = HashMap::new();
        principal.insert("Service".to_string(), Value::from("ec2.amazonaws.com"));
        let mut trust = HashMap::new();
        trust.insert("Effect".to_string(), Value::from("Allow"));
        trust.insert("Action".to_string(), Value::from(vec!["sts:AssumeRole"]));
        trust.insert("Principal".to_string(), Value::Map(principal));

        let t = policy_document();
        assert!(t.validate(&document(POLICY_VERSION, vec![Value::Map(trust.clone())])).is_ok());

        trust.insert("Principal".to_string(), Value::Map(HashMap::new()));
        assert!(t.validate(&document(POLICY_VERSION, vec![Value::Map(trust)])).is_err());
    }

    #[test]
    fn inline_policies_need_a_name() {
        let doc = document(
            POLICY_VERSION,
            vec![statement("Allow", vec!["ec2:AssociateAddress"], vec![Value::from("*")])],
        );
        let mut policy = HashMap::new();
        policy.insert("PolicyName".to_string(), Value::from("attach"));
        policy.insert("PolicyDocument".to_string(), doc);

        let t = inline_policies();
        assert!(t.validate(&Value::List(vec![Value::Map(policy.clone())])).is_ok());

        policy.remove("PolicyName");
        assert!(t.validate(&Value::List(vec![Value::Map(policy)])).is_err());
    }

    #[test]
    fn port_number_range() {
        let t = port_number();
        assert!(t.validate(&Value::Int(-1)).is_ok());
        assert!(t.validate(&Value::Int(443)).is_ok());
        assert!(t.validate(&Value::Int(65536)).is_err());
    }

    #[test]
    fn instance_type_shape() {
        let t = instance_type();
        assert!(t.validate(&Value::from("t4g.micro")).is_ok());
        assert!(t.validate(&Value::from("t4g")).is_err());
    }
}
