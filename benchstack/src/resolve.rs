use compact_str::{ToCompactString, format_compact};
use indexmap::IndexMap;

use crate::Str;
use crate::config::{BenchConfig, RdsEngine};
use crate::error::Error;
use crate::provision::Outputs;

/// Fixed personality of a persistence engine: the Temporal persistence
/// plugin name, the default wire port, and the env var prefix its
/// credentials and seed hosts are published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Engine {
    pub plugin: &'static str,
    pub default_port: u16,
    pub env_prefix: &'static str,
}

impl Engine {
    pub const CASSANDRA: Self = Self {
        plugin: "cassandra",
        default_port: 9042,
        env_prefix: "CASSANDRA_",
    };

    pub fn of_rds(engine: RdsEngine) -> Self {
        match engine {
            RdsEngine::Postgres => Self {
                plugin: "postgres12",
                default_port: 5432,
                env_prefix: "POSTGRES_",
            },
            RdsEngine::Mysql => Self {
                plugin: "mysql8",
                default_port: 3306,
                env_prefix: "MYSQL_",
            },
        }
    }
}

/// Everything downstream of validation: the engine personality, the runtime
/// env map (seed hosts still unbound), derived per-pod sizing, and the few
/// cluster facts the transform planner needs.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub engine: Engine,
    pub runtime: Runtime,
    pub sizing: Sizing,
    pub region: Str,
    pub dedicated_nodes: bool,
}

/// Environment consumed by the Temporal server and the benchmark workers.
/// Seed-host keys depend on provisioned addresses and are bound separately
/// once provisioning outputs exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Runtime {
    env: IndexMap<Str, Str>,
    seeds_key: Str,
    visibility: bool,
}

impl Runtime {
    /// Fill in the endpoint-dependent keys. Outputs that were not provisioned
    /// leave their keys absent, which keeps `render` usable without any
    /// static addresses.
    pub fn bind_endpoints(&mut self, outputs: &Outputs) {
        if let Some(database) = outputs.get("database") {
            self.env.insert(self.seeds_key.clone(), database.address.clone());
        }
        if self.visibility {
            if let Some(visibility) = outputs.get("visibility") {
                self.env.insert("ES_SEEDS".into(), visibility.address.clone());
            }
        }
    }

    pub fn env(&self) -> &IndexMap<Str, Str> {
        &self.env
    }
}

/// Per-pod shares derived from configured totals by ceiling division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sizing {
    pub workflow_pollers_per_worker: u32,
    pub activity_pollers_per_worker: u32,
    pub concurrent_workflows_per_frontend: u32,
}

pub fn resolve(config: &BenchConfig) -> Result<Resolved, Error> {
    let eks = match &config.cluster.eks {
        Some(eks) => eks,
        None => {
            return Err(Error::InvalidConfiguration(
                "cluster: exactly one of `eks` must be set, found none".into(),
            ));
        }
    };

    let persistence = &config.persistence;
    let (engine, user, password, database, port) = match (&persistence.rds, &persistence.cassandra) {
        (Some(rds), None) => (
            Engine::of_rds(rds.engine),
            &rds.user,
            &rds.password,
            rds.database.as_ref(),
            rds.port,
        ),
        (None, Some(cassandra)) => (
            Engine::CASSANDRA,
            &cassandra.user,
            &cassandra.password,
            cassandra.database.as_ref(),
            cassandra.port,
        ),
        (None, None) => {
            return Err(Error::InvalidConfiguration(
                "persistence: exactly one of `rds` or `cassandra` must be set, found none".into(),
            ));
        }
        (Some(_), Some(_)) => {
            return Err(Error::InvalidConfiguration(
                "persistence: exactly one of `rds` or `cassandra` must be set, found both".into(),
            ));
        }
    };

    let opensearch = match &persistence.visibility {
        None => None,
        Some(visibility) => match &visibility.opensearch {
            Some(opensearch) => Some(opensearch),
            None => {
                return Err(Error::InvalidConfiguration(
                    "persistence.visibility: exactly one of `opensearch` must be set, found none"
                        .into(),
                ));
            }
        },
    };

    let temporal = &config.temporal;
    if temporal.history_shards == 0 {
        return Err(Error::InvalidConfiguration(
            "temporal.historyShards must be at least 1".into(),
        ));
    }
    for (block, pods) in [
        ("frontend", temporal.frontend.pods),
        ("history", temporal.history.pods),
        ("matching", temporal.matching.pods),
        ("workers", temporal.workers.pods),
        ("soakTest", temporal.soak_test.pods),
    ] {
        if pods == 0 {
            return Err(Error::InvalidConfiguration(format!(
                "temporal.{block}.pods must be at least 1"
            )));
        }
    }

    let sizing = Sizing {
        workflow_pollers_per_worker: temporal
            .workers
            .workflow_pollers
            .div_ceil(temporal.workers.pods),
        activity_pollers_per_worker: temporal
            .workers
            .activity_pollers
            .div_ceil(temporal.workers.pods),
        concurrent_workflows_per_frontend: temporal
            .soak_test
            .concurrent_workflows
            .div_ceil(temporal.frontend.pods),
    };

    let port = port.unwrap_or(engine.default_port);
    let prefix = engine.env_prefix;

    let mut env = IndexMap::new();
    env.insert(Str::from("DB"), Str::from(engine.plugin));
    env.insert(Str::from("DB_PORT"), port.to_compact_string());
    env.insert(
        Str::from("DBNAME"),
        database.cloned().unwrap_or_else(|| Str::from("temporal")),
    );
    env.insert(
        Str::from("NUM_HISTORY_SHARDS"),
        temporal.history_shards.to_compact_string(),
    );
    env.insert(format_compact!("{prefix}USER"), user.clone());
    env.insert(format_compact!("{prefix}PWD"), password.clone());

    if let Some(opensearch) = opensearch {
        env.insert(Str::from("ENABLE_ES"), Str::from("true"));
        env.insert(
            Str::from("ES_VERSION"),
            opensearch.version.clone().unwrap_or_else(|| Str::from("v7")),
        );
        env.insert(Str::from("ES_PORT"), Str::from("9200"));
    }

    env.insert(
        Str::from("WORKFLOW_POLLERS"),
        sizing.workflow_pollers_per_worker.to_compact_string(),
    );
    env.insert(
        Str::from("ACTIVITY_POLLERS"),
        sizing.activity_pollers_per_worker.to_compact_string(),
    );
    env.insert(
        Str::from("CONCURRENT_WORKFLOWS"),
        sizing.concurrent_workflows_per_frontend.to_compact_string(),
    );

    let runtime = Runtime {
        env,
        seeds_key: format_compact!("{prefix}SEEDS"),
        visibility: opensearch.is_some(),
    };

    Ok(Resolved {
        engine,
        runtime,
        sizing,
        region: config
            .monitoring
            .region
            .clone()
            .unwrap_or_else(|| eks.region.clone()),
        dedicated_nodes: eks.dedicated_nodes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        Cassandra, Cluster, EksCluster, Endpoints, Limits, Monitoring, OpenSearch, Persistence,
        Rds, ServiceSizing, SoakSizing, Temporal, Visibility, WorkerSizing,
    };
    use crate::provision::Endpoint;

    fn sizing(pods: u32) -> ServiceSizing {
        ServiceSizing { pods, cpu: Limits::default(), memory: Limits::default() }
    }

    fn config() -> BenchConfig {
        BenchConfig {
            cluster: Cluster {
                eks: Some(EksCluster {
                    name: "bench".into(),
                    region: "us-east-1".into(),
                    version: None,
                    node_type: None,
                    nodes: None,
                    dedicated_nodes: false,
                }),
            },
            persistence: Persistence {
                rds: Some(Rds {
                    engine: RdsEngine::Postgres,
                    user: "temporal".into(),
                    password: "hunter2".into(),
                    database: None,
                    port: None,
                }),
                cassandra: None,
                visibility: None,
            },
            temporal: Temporal {
                history_shards: 512,
                frontend: sizing(2),
                history: sizing(3),
                matching: sizing(2),
                workers: WorkerSizing {
                    pods: 3,
                    cpu: Limits::default(),
                    memory: Limits::default(),
                    workflow_pollers: 80,
                    activity_pollers: 100,
                },
                soak_test: SoakSizing {
                    pods: 1,
                    cpu: Limits::default(),
                    memory: Limits::default(),
                    concurrent_workflows: 500,
                },
                dynamic_config: IndexMap::new(),
            },
            endpoints: Endpoints::default(),
            monitoring: Monitoring::default(),
        }
    }

    #[test]
    fn postgres_env() {
        let resolved = resolve(&config()).unwrap();
        let env = resolved.runtime.env();
        assert_eq!(env["DB"], "postgres12");
        assert_eq!(env["DB_PORT"], "5432");
        assert_eq!(env["DBNAME"], "temporal");
        assert_eq!(env["NUM_HISTORY_SHARDS"], "512");
        assert_eq!(env["POSTGRES_USER"], "temporal");
        assert_eq!(env["POSTGRES_PWD"], "hunter2");
        assert!(!env.contains_key("ENABLE_ES"));
        assert!(!env.contains_key("POSTGRES_SEEDS"));
        assert_eq!(resolved.region, "us-east-1");
    }

    #[test]
    fn engine_triples() {
        let mut config = config();
        config.persistence.rds.as_mut().unwrap().engine = RdsEngine::Mysql;
        let resolved = resolve(&config).unwrap();
        assert_eq!(resolved.engine.plugin, "mysql8");
        assert_eq!(resolved.runtime.env()["DB_PORT"], "3306");
        assert!(resolved.runtime.env().contains_key("MYSQL_USER"));

        config.persistence.rds = None;
        config.persistence.cassandra = Some(Cassandra {
            user: "cass".into(),
            password: "cass".into(),
            database: Some("bench".into()),
            port: None,
            replicas: None,
        });
        let resolved = resolve(&config).unwrap();
        assert_eq!(resolved.engine.plugin, "cassandra");
        assert_eq!(resolved.runtime.env()["DB_PORT"], "9042");
        assert_eq!(resolved.runtime.env()["DBNAME"], "bench");
    }

    #[test]
    fn port_override_wins() {
        let mut config = config();
        config.persistence.rds.as_mut().unwrap().port = Some(6543);
        let resolved = resolve(&config).unwrap();
        assert_eq!(resolved.runtime.env()["DB_PORT"], "6543");
    }

    #[test]
    fn visibility_env() {
        let mut config = config();
        config.persistence.visibility = Some(Visibility {
            opensearch: Some(OpenSearch { version: None }),
        });
        let resolved = resolve(&config).unwrap();
        let env = resolved.runtime.env();
        assert_eq!(env["ENABLE_ES"], "true");
        assert_eq!(env["ES_VERSION"], "v7");
        assert_eq!(env["ES_PORT"], "9200");
    }

    #[test]
    fn empty_visibility_oneof_is_rejected() {
        let mut config = config();
        config.persistence.visibility = Some(Visibility { opensearch: None });
        let err = resolve(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
    }

    #[test]
    fn persistence_oneof_is_enforced() {
        let mut config = config();
        config.persistence.cassandra = Some(Cassandra {
            user: "cass".into(),
            password: "cass".into(),
            database: None,
            port: None,
            replicas: None,
        });
        let err = resolve(&config).unwrap_err();
        assert!(err.to_string().contains("found both"), "{err}");

        config.persistence.rds = None;
        config.persistence.cassandra = None;
        let err = resolve(&config).unwrap_err();
        assert!(err.to_string().contains("found none"), "{err}");
    }

    #[test]
    fn missing_cluster_is_rejected() {
        let mut config = config();
        config.cluster.eks = None;
        let err = resolve(&config).unwrap_err();
        assert!(matches!(err, Error::InvalidConfiguration(_)), "{err}");
    }

    #[test]
    fn per_pod_shares_round_up() {
        let resolved = resolve(&config()).unwrap();
        // 80 pollers over 3 pods, 100 over 3, 500 workflows over 2 frontends.
        assert_eq!(resolved.sizing.workflow_pollers_per_worker, 27);
        assert_eq!(resolved.sizing.activity_pollers_per_worker, 34);
        assert_eq!(resolved.sizing.concurrent_workflows_per_frontend, 250);
        let env = resolved.runtime.env();
        assert_eq!(env["WORKFLOW_POLLERS"], "27");
        assert_eq!(env["ACTIVITY_POLLERS"], "34");
        assert_eq!(env["CONCURRENT_WORKFLOWS"], "250");
    }

    #[test]
    fn zero_pods_is_rejected_before_division() {
        let mut config = config();
        config.temporal.workers.pods = 0;
        let err = resolve(&config).unwrap_err();
        assert!(err.to_string().contains("workers.pods"), "{err}");
    }

    #[test]
    fn binds_provisioned_seed_hosts() {
        let mut config = config();
        config.persistence.visibility = Some(Visibility {
            opensearch: Some(OpenSearch { version: None }),
        });
        let mut resolved = resolve(&config).unwrap();

        let mut outputs = Outputs::default();
        outputs.insert("database".into(), Endpoint::new("db.example.com"));
        outputs.insert("visibility".into(), Endpoint::new("es.example.com"));
        resolved.runtime.bind_endpoints(&outputs);

        let env = resolved.runtime.env();
        assert_eq!(env["POSTGRES_SEEDS"], "db.example.com");
        assert_eq!(env["ES_SEEDS"], "es.example.com");
    }

    #[test]
    fn unbound_outputs_leave_seeds_absent() {
        let mut resolved = resolve(&config()).unwrap();
        resolved.runtime.bind_endpoints(&Outputs::default());
        assert!(!resolved.runtime.env().contains_key("POSTGRES_SEEDS"));
    }

    #[test]
    fn monitoring_region_overrides_cluster_region() {
        let mut config = config();
        config.monitoring.region = Some("eu-west-1".into());
        assert_eq!(resolve(&config).unwrap().region, "eu-west-1");
    }
}
