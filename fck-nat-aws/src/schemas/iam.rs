//! IAM resource schemas and builders

use std::collections::HashMap;

use fck_nat_core::resource::{Resource, Value};
use fck_nat_core::schema::{AttributeSchema, AttributeType, ResourceSchema};

use super::types::{POLICY_VERSION, inline_policies, policy_document};

/// A single Allow/Deny statement of an inline policy
#[derive(Debug, Clone, PartialEq)]
pub struct PolicyStatement {
    pub effect: String,
    pub actions: Vec<String>,
    pub resources: Vec<Value>,
}

impl PolicyStatement {
    pub fn allow<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: "Allow".to_string(),
            actions: actions.into_iter().map(Into::into).collect(),
            resources: Vec::new(),
        }
    }

    pub fn on(mut self, resource: impl Into<Value>) -> Self {
        self.resources.push(resource.into());
        self
    }

    pub fn on_all(self) -> Self {
        self.on("*")
    }
}

impl From<PolicyStatement> for Value {
    fn from(statement: PolicyStatement) -> Self {
        let mut map = HashMap::new();
        map.insert("Effect".to_string(), Value::String(statement.effect));
        map.insert("Action".to_string(), Value::from(statement.actions));
        map.insert("Resource".to_string(), Value::List(statement.resources));
        Value::Map(map)
    }
}

fn document(statements: Vec<Value>) -> Value {
    let mut map = HashMap::new();
    map.insert("Version".to_string(), Value::from(POLICY_VERSION));
    map.insert("Statement".to_string(), Value::List(statements));
    Value::Map(map)
}

/// Trust policy letting `service` assume the role
fn trust_document(service: String) -> Value {
    let mut principal = HashMap::new();
    principal.insert("Service".to_string(), Value::String(service));

    let mut statement = HashMap::new();
    statement.insert("Effect".to_string(), Value::from("Allow"));
    statement.insert("Principal".to_string(), Value::Map(principal));
    statement.insert("Action".to_string(), Value::from(vec!["sts:AssumeRole"]));
    document(vec![Value::Map(statement)])
}

/// Returns the schema for IAM Role
pub fn role_schema() -> ResourceSchema {
    ResourceSchema::new("role")
        .with_description("An IAM role assumed by an AWS service")
        .with_provider_type("AWS::IAM::Role")
        .attribute(
            AttributeSchema::new("assume_role_policy_document", policy_document())
                .required()
                .with_description("Trust policy naming the service principal")
                .with_provider_name("AssumeRolePolicyDocument"),
        )
        .attribute(
            AttributeSchema::new("policies", inline_policies())
                .with_description("Inline policies, one document per policy name")
                .with_provider_name("Policies"),
        )
        .attribute(
            AttributeSchema::new(
                "managed_policy_arns",
                AttributeType::List(Box::new(AttributeType::String)),
            )
            .with_description("Managed policies attached to the role")
            .with_provider_name("ManagedPolicyArns"),
        )
}

/// Role builder; statements added under the same policy name share a document
#[derive(Debug, Clone)]
pub struct RoleBuilder {
    name: String,
    assumed_by: String,
    policies: Vec<(String, Vec<PolicyStatement>)>,
    managed_policies: Vec<String>,
}

impl RoleBuilder {
    pub fn new(name: impl Into<String>, assumed_by: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            assumed_by: assumed_by.into(),
            policies: Vec::new(),
            managed_policies: Vec::new(),
        }
    }

    pub fn inline_policy(mut self, name: impl Into<String>, statement: PolicyStatement) -> Self {
        let name = name.into();
        match self.policies.iter_mut().find(|(n, _)| *n == name) {
            Some((_, statements)) => statements.push(statement),
            None => self.policies.push((name, vec![statement])),
        }
        self
    }

    pub fn managed_policy(mut self, policy_name: &str) -> Self {
        self.managed_policies
            .push(format!("arn:aws:iam::aws:policy/{}", policy_name));
        self
    }

    pub fn build(self) -> Resource {
        let policies: Vec<Value> = self
            .policies
            .into_iter()
            .map(|(name, statements)| {
                let mut policy = HashMap::new();
                policy.insert("PolicyName".to_string(), Value::String(name));
                policy.insert(
                    "PolicyDocument".to_string(),
                    document(statements.into_iter().map(Value::from).collect()),
                );
                Value::Map(policy)
            })
            .collect();

        let mut role = Resource::new("role", self.name)
            .with_attribute("assume_role_policy_document", trust_document(self.assumed_by));
        if !policies.is_empty() {
            role = role.with_attribute("policies", Value::List(policies));
        }
        if !self.managed_policies.is_empty() {
            role = role.with_attribute("managed_policy_arns", self.managed_policies);
        }
        role
    }
}

/// Returns the schema for IAM Instance Profile
pub fn instance_profile_schema() -> ResourceSchema {
    ResourceSchema::new("instance_profile")
        .with_description("Instance profile passing a role to EC2 instances")
        .with_provider_type("AWS::IAM::InstanceProfile")
        .attribute(
            AttributeSchema::new("roles", AttributeType::List(Box::new(AttributeType::String)))
                .required()
                .with_provider_name("Roles"),
        )
}

pub fn instance_profile(name: impl Into<String>, role: Value) -> Resource {
    Resource::new("instance_profile", name).with_attribute("roles", Value::List(vec![role]))
}

/// Returns all IAM-related schemas
pub fn schemas() -> Vec<ResourceSchema> {
    vec![role_schema(), instance_profile_schema()]
}
