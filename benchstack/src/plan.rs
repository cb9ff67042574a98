use crate::config::BenchConfig;
use crate::group::GroupName;
use crate::provision::Outputs;
use crate::resolve::Resolved;
use crate::transform::{
    PatchDatasource, PatchGrafanaHost, PatchRemoteWrite, ScaleDeployment, SetResources, Tolerate,
    Transform,
};

/// Deployment names the sizing blocks map onto.
pub const FRONTEND: &str = "temporal-frontend";
pub const HISTORY: &str = "temporal-history";
pub const MATCHING: &str = "temporal-matching";
pub const WORKERS: &str = "benchmark-workers";
pub const SOAK_TEST: &str = "benchmark-soak-test";

/// Monitoring object names.
pub const PROMETHEUS: &str = "prometheus";
pub const GRAFANA: &str = "grafana";

/// Map resolver output and provisioning outputs onto the transform list for
/// one group. Endpoint-gated patches are included only when their resource
/// was provisioned; the datasource patch always runs (it honors its own
/// empty-endpoint rule) so the signing metadata is stamped either way.
pub fn transforms(
    group: GroupName,
    config: &BenchConfig,
    resolved: &Resolved,
    outputs: &Outputs,
) -> Vec<Box<dyn Transform>> {
    let temporal = &config.temporal;
    let mut transforms: Vec<Box<dyn Transform>> = Vec::new();

    match group {
        GroupName::Temporal => {
            for (name, sizing) in [
                (FRONTEND, &temporal.frontend),
                (HISTORY, &temporal.history),
                (MATCHING, &temporal.matching),
            ] {
                transforms.push(Box::new(ScaleDeployment {
                    name: name.into(),
                    replicas: sizing.pods,
                }));
                transforms.push(Box::new(SetResources {
                    name: name.into(),
                    cpu: sizing.cpu.clone(),
                    memory: sizing.memory.clone(),
                }));
            }
        }
        GroupName::Benchmark => {
            let workers = &temporal.workers;
            transforms.push(Box::new(ScaleDeployment { name: WORKERS.into(), replicas: workers.pods }));
            transforms.push(Box::new(SetResources {
                name: WORKERS.into(),
                cpu: workers.cpu.clone(),
                memory: workers.memory.clone(),
            }));

            let soak = &temporal.soak_test;
            transforms.push(Box::new(ScaleDeployment { name: SOAK_TEST.into(), replicas: soak.pods }));
            transforms.push(Box::new(SetResources {
                name: SOAK_TEST.into(),
                cpu: soak.cpu.clone(),
                memory: soak.memory.clone(),
            }));
        }
        GroupName::Monitoring => {
            if let Some(metrics) = outputs.get("metrics") {
                transforms.push(Box::new(PatchRemoteWrite {
                    name: PROMETHEUS.into(),
                    region: resolved.region.clone(),
                    endpoint: metrics.address.clone(),
                }));
            }
            transforms.push(Box::new(PatchDatasource {
                name: PROMETHEUS.into(),
                region: resolved.region.clone(),
                endpoint: outputs
                    .get("metrics")
                    .map(|endpoint| endpoint.address.clone())
                    .unwrap_or_default(),
            }));
            if let Some(dashboards) = outputs.get("dashboards") {
                transforms.push(Box::new(PatchGrafanaHost {
                    name: GRAFANA.into(),
                    endpoint: dashboards.address.clone(),
                }));
            }
        }
    }

    if resolved.dedicated_nodes {
        transforms.push(Box::new(Tolerate { dedicated: group.dir().into() }));
    }

    transforms
}
