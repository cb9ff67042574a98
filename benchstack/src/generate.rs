use indexmap::IndexMap;
use serde_yaml::{Mapping, Value};

use crate::Str;
use crate::object::{Object, kind};
use crate::resolve::Runtime;

/// Name of the generated ConfigMap the workload launcher mounts as its
/// environment.
pub const ENV_CONFIG_MAP: &str = "temporal-env";

/// Name of the generated ConfigMap carrying the Temporal dynamic-config
/// file.
pub const DYNAMIC_CONFIG_MAP: &str = "temporal-dynamic-config";

pub const DYNAMIC_CONFIG_KEY: &str = "dynamic_config.yaml";

/// The resolver's bound env map as a ConfigMap, one data key per entry.
pub fn env_config_map(runtime: &Runtime) -> anyhow::Result<Object> {
    let data = runtime
        .env()
        .iter()
        .map(|(key, value)| (Value::from(key.as_str()), Value::from(value.as_str())))
        .collect();
    config_map(ENV_CONFIG_MAP, data)
}

/// The `dynamicConfig` block rendered verbatim as a single-file ConfigMap.
pub fn dynamic_config_map(entries: &IndexMap<Str, Value>) -> anyhow::Result<Object> {
    let rendered = serde_yaml::to_string(entries)?;
    let mut data = Mapping::new();
    data.insert(DYNAMIC_CONFIG_KEY.into(), rendered.into());
    config_map(DYNAMIC_CONFIG_MAP, data)
}

fn config_map(name: &str, data: Mapping) -> anyhow::Result<Object> {
    let mut metadata = Mapping::new();
    metadata.insert("name".into(), name.into());

    let mut value = Mapping::new();
    value.insert("apiVersion".into(), "v1".into());
    value.insert("kind".into(), kind::ConfigMap::NAME.into());
    value.insert("metadata".into(), Value::Mapping(metadata));
    value.insert("data".into(), Value::Mapping(data));
    Object::decode(Value::Mapping(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BenchConfig;
    use crate::resolve;

    fn runtime() -> Runtime {
        let config: BenchConfig = serde_yaml::from_str(
            r#"
cluster:
  eks: { name: bench, region: us-east-1 }
persistence:
  rds: { engine: postgres, user: temporal, password: hunter2 }
temporal:
  historyShards: 4
  frontend: { pods: 1 }
  history: { pods: 1 }
  matching: { pods: 1 }
  workers: { pods: 1, workflowPollers: 10, activityPollers: 10 }
  soakTest: { pods: 1, concurrentWorkflows: 10 }
"#,
        )
        .unwrap();
        resolve::resolve(&config).unwrap().runtime
    }

    #[test]
    fn env_config_map_carries_every_entry() {
        let object = env_config_map(&runtime()).unwrap();
        assert_eq!(object.id().to_string(), "ConfigMap/temporal-env");

        let value = serde_yaml::to_value(&object).unwrap();
        let data = value.get("data").unwrap().as_mapping().unwrap();
        assert_eq!(data.get("DB").unwrap(), &Value::from("postgres12"));
        assert_eq!(data.get("DB_PORT").unwrap(), &Value::from("5432"));
        assert_eq!(data.len(), runtime().env().len());
    }

    #[test]
    fn dynamic_config_map_renders_one_file() {
        let mut entries = IndexMap::new();
        entries.insert(
            Str::from("history.cacheMaxSize"),
            serde_yaml::from_str::<Value>("[{ value: 4096 }]").unwrap(),
        );
        let object = dynamic_config_map(&entries).unwrap();
        assert_eq!(object.id().to_string(), "ConfigMap/temporal-dynamic-config");

        let value = serde_yaml::to_value(&object).unwrap();
        let file = value
            .get("data")
            .and_then(|data| data.get(DYNAMIC_CONFIG_KEY))
            .and_then(Value::as_str)
            .unwrap();
        let parsed: IndexMap<Str, Value> = serde_yaml::from_str(file).unwrap();
        assert_eq!(parsed, entries);
    }
}
