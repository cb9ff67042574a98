pub mod monitoring;
pub mod workload;

pub use self::monitoring::{Grafana, GrafanaDatasource, Prometheus};
pub use self::workload::Deployment;

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

use crate::Str;
use crate::error::Error;

/// Kind strings that serialize and deserialize as themselves, so a typed
/// struct can only ever hold a document of its own kind.
pub mod kind {
    use serde::de;

    use crate::Str;

    macro_rules! kinds {
        ($($name:ident = $value:literal),* $(,)?) => {$(
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
            pub struct $name;

            impl $name {
                pub const NAME: &'static str = $value;
            }

            impl serde::Serialize for $name {
                fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.serialize_str($value)
                }
            }

            impl<'de> serde::Deserialize<'de> for $name {
                fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let kind = Str::deserialize(deserializer)?;
                    if kind == $value {
                        Ok($name)
                    } else {
                        Err(de::Error::custom(format_args!(
                            "expected kind `{}`, found `{kind}`",
                            $value
                        )))
                    }
                }
            }
        )*};
    }

    kinds! {
        ConfigMap = "ConfigMap",
        Deployment = "Deployment",
        Grafana = "Grafana",
        GrafanaDatasource = "GrafanaDatasource",
        Prometheus = "Prometheus",
    }
}

/// Identity of a manifest document within a group.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ObjectId {
    pub kind: Str,
    pub name: Str,
    pub namespace: Option<Str>,
}

impl ObjectId {
    pub fn new(kind: impl Into<Str>, name: impl Into<Str>, namespace: Option<Str>) -> Self {
        Self { kind: kind.into(), name: name.into(), namespace }
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.name)?;
        if let Some(namespace) = &self.namespace {
            write!(f, ".{namespace}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Object metadata. Only the fields the pipeline reads are typed; everything
/// else rides along in `rest`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: Str,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<Str>,
    #[serde(flatten)]
    pub rest: IndexMap<Str, Value>,
}

impl Metadata {
    pub fn id(&self, kind: &str) -> ObjectId {
        ObjectId::new(kind, self.name.clone(), self.namespace.clone())
    }
}

/// A decoded manifest document. The kinds the pipeline transforms get typed
/// variants; everything else is carried opaquely and round-trips untouched.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Object {
    Deployment(Deployment),
    Prometheus(Prometheus),
    Datasource(GrafanaDatasource),
    Grafana(Grafana),
    Other(Other),
}

impl Object {
    /// Classify and decode one YAML document. Consumed kinds with a broken
    /// shape are rejected here, before any transformation runs.
    pub fn decode(value: Value) -> anyhow::Result<Self> {
        let id = probe_id(&value)?;
        let object = match id.kind.as_str() {
            kind::Deployment::NAME => Self::Deployment(typed(value, &id)?),
            kind::Prometheus::NAME => Self::Prometheus(typed(value, &id)?),
            kind::GrafanaDatasource::NAME => Self::Datasource(typed(value, &id)?),
            kind::Grafana::NAME => Self::Grafana(typed(value, &id)?),
            _ => Self::Other(Other { id, value }),
        };
        Ok(object)
    }

    pub fn id(&self) -> ObjectId {
        match self {
            Self::Deployment(deployment) => deployment.metadata.id(kind::Deployment::NAME),
            Self::Prometheus(prometheus) => prometheus.metadata.id(kind::Prometheus::NAME),
            Self::Datasource(datasource) => datasource.metadata.id(kind::GrafanaDatasource::NAME),
            Self::Grafana(grafana) => grafana.metadata.id(kind::Grafana::NAME),
            Self::Other(other) => other.id.clone(),
        }
    }

    pub fn kind(&self) -> &str {
        match self {
            Self::Deployment(_) => kind::Deployment::NAME,
            Self::Prometheus(_) => kind::Prometheus::NAME,
            Self::Datasource(_) => kind::GrafanaDatasource::NAME,
            Self::Grafana(_) => kind::Grafana::NAME,
            Self::Other(other) => &other.id.kind,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Deployment(deployment) => &deployment.metadata.name,
            Self::Prometheus(prometheus) => &prometheus.metadata.name,
            Self::Datasource(datasource) => &datasource.metadata.name,
            Self::Grafana(grafana) => &grafana.metadata.name,
            Self::Other(other) => &other.id.name,
        }
    }
}

/// A document of a kind the pipeline never touches.
#[derive(Debug, Clone, PartialEq)]
pub struct Other {
    id: ObjectId,
    value: Value,
}

impl Other {
    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl Serialize for Other {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

fn probe_id(value: &Value) -> Result<ObjectId, Error> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ManifestApplyFailure("document is missing `kind`".into()))?;
    let metadata = value.get("metadata").ok_or_else(|| {
        Error::ManifestApplyFailure(format!("`{kind}` document is missing `metadata`"))
    })?;
    let name = metadata.get("name").and_then(Value::as_str).ok_or_else(|| {
        Error::ManifestApplyFailure(format!("`{kind}` document is missing `metadata.name`"))
    })?;
    let namespace = metadata.get("namespace").and_then(Value::as_str).map(Str::from);
    Ok(ObjectId::new(kind, name, namespace))
}

fn typed<T: serde::de::DeserializeOwned>(value: Value, id: &ObjectId) -> anyhow::Result<T> {
    Ok(serde_yaml::from_value(value)
        .map_err(|err| Error::ManifestApplyFailure(format!("malformed `{id}`: {err}")))?)
}
