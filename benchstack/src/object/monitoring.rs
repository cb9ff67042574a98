use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::Str;

use super::{Metadata, kind};

/// The metrics collector definition (prometheus-operator `Prometheus` CR).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Prometheus {
    pub api_version: Str,
    pub kind: kind::Prometheus,
    pub metadata: Metadata,
    pub spec: PrometheusSpec,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrometheusSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replicas: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replica_external_label_name: Option<Str>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remote_write: Vec<RemoteWrite>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteWrite {
    pub url: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sigv4: Option<Sigv4>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queue_config: Option<QueueConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub write_relabel_configs: Vec<RelabelConfig>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Sigv4 {
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub region: Str,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_shards: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_samples_per_send: Option<u32>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RelabelConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_labels: Vec<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_label: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

/// The metrics data-source definition (grafana-operator `GrafanaDatasource`
/// CR).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDatasource {
    pub api_version: Str,
    pub kind: kind::GrafanaDatasource,
    pub metadata: Metadata,
    pub spec: GrafanaDatasourceSpec,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDatasourceSpec {
    pub datasource: DatasourceConfig,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasourceConfig {
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub url: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_data: Option<JsonData>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_v4_auth: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_v4_auth_type: Option<Str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sig_v4_region: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

/// The dashboard host definition (grafana-operator `Grafana` CR).
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Grafana {
    pub api_version: Str,
    pub kind: kind::Grafana,
    pub metadata: Metadata,
    pub spec: GrafanaSpec,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct External {
    #[serde(default, skip_serializing_if = "Str::is_empty")]
    pub url: Str,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}
