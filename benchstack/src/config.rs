use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::Str;

/// Root of the benchmark stack configuration file.
///
/// `cluster` and `persistence` are oneof blocks: exactly one variant must be
/// populated. The variants are plain `Option`s so that an empty or
/// over-populated block is representable and can be rejected with a useful
/// message during resolution rather than at decode time.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BenchConfig {
    pub cluster: Cluster,
    pub persistence: Persistence,
    pub temporal: Temporal,
    #[serde(default, skip_serializing_if = "Endpoints::is_empty")]
    pub endpoints: Endpoints,
    #[serde(default, skip_serializing_if = "Monitoring::is_empty")]
    pub monitoring: Monitoring,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cluster {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eks: Option<EksCluster>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EksCluster {
    pub name: Str,
    pub region: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_type: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<u32>,
    /// When set, every deployment is pinned to a node group dedicated to its
    /// manifest group via tolerations.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub dedicated_nodes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Persistence {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rds: Option<Rds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cassandra: Option<Cassandra>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Rds {
    pub engine: RdsEngine,
    pub user: Str,
    pub password: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RdsEngine {
    Postgres,
    Mysql,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Cassandra {
    pub user: Str,
    pub password: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
}

/// Oneof with a single supported variant.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Visibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opensearch: Option<OpenSearch>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OpenSearch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<Str>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Temporal {
    pub history_shards: u32,
    pub frontend: ServiceSizing,
    pub history: ServiceSizing,
    pub matching: ServiceSizing,
    pub workers: WorkerSizing,
    pub soak_test: SoakSizing,
    /// Rendered verbatim into the dynamic-config file; the keys are opaque
    /// Temporal setting names.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub dynamic_config: IndexMap<Str, serde_yaml::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceSizing {
    pub pods: u32,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub cpu: Limits,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub memory: Limits,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WorkerSizing {
    pub pods: u32,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub cpu: Limits,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub memory: Limits,
    /// Poller totals across all worker pods; the per-pod share is derived.
    pub workflow_pollers: u32,
    pub activity_pollers: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SoakSizing {
    pub pods: u32,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub cpu: Limits,
    #[serde(default, skip_serializing_if = "Limits::is_unset")]
    pub memory: Limits,
    /// Total concurrent workflows across the soak test.
    pub concurrent_workflows: u32,
}

/// A request/limit pair. Quantities are opaque Kubernetes strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Limits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<Str>,
}

impl Limits {
    pub fn is_unset(&self) -> bool {
        self.request.is_none() && self.limit.is_none()
    }
}

/// Statically known resource addresses consumed by the static provisioner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboards: Option<Str>,
}

impl Endpoints {
    pub fn is_empty(&self) -> bool {
        self.database.is_none()
            && self.visibility.is_none()
            && self.metrics.is_none()
            && self.dashboards.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Monitoring {
    /// Signing region for the metrics datasource. Defaults to the cluster
    /// region.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dashboard_folder: Option<Str>,
}

impl Monitoring {
    pub fn is_empty(&self) -> bool {
        self.region.is_none() && self.dashboard_folder.is_none()
    }
}
