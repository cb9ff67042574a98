use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::Str;

use super::{Metadata, kind};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub api_version: Str,
    pub kind: kind::Deployment,
    pub metadata: Metadata,
    pub spec: DeploymentSpec,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    pub template: PodTemplate,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PodTemplate {
    pub spec: PodSpec,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<Container>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerations: Option<Vec<Toleration>>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Container {
    pub name: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Resources>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Resources {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<Quantities>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limits: Option<Quantities>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Quantities {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effect: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

impl Toleration {
    /// The single entry used to pin a deployment onto its dedicated node
    /// group.
    pub fn dedicated(value: &str) -> Self {
        Self {
            key: Some(Str::from("dedicated")),
            operator: Some(Str::from("Equal")),
            value: Some(Str::from(value)),
            effect: Some(Str::from("NoSchedule")),
            rest: IndexMap::new(),
        }
    }
}
