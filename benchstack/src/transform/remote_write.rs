use compact_str::format_compact;
use indexmap::IndexMap;
use tracing::debug;

use crate::Str;
use crate::object::Object;
use crate::object::monitoring::{QueueConfig, RelabelConfig, RemoteWrite, Sigv4};

use super::Transform;

/// Rewires the one matching Prometheus to ship samples to a remote
/// workspace: a single sigv4-signed remote-write entry, one collector
/// replica, and the replica external label cleared so series names stay
/// stable across restarts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRemoteWrite {
    pub name: Str,
    pub region: Str,
    pub endpoint: Str,
}

impl Transform for PatchRemoteWrite {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Prometheus(prometheus) = object else { return Ok(()) };
        if prometheus.metadata.name != self.name {
            return Ok(());
        }
        debug!(name = %self.name, endpoint = %self.endpoint, "patching remote write");

        let spec = &mut prometheus.spec;
        spec.replicas = Some(1);
        spec.replica_external_label_name = Some(Str::new(""));
        spec.remote_write = vec![RemoteWrite {
            url: format_compact!("{}api/v1/remote_write", self.endpoint),
            sigv4: Some(Sigv4 { region: self.region.clone(), rest: IndexMap::new() }),
            queue_config: Some(QueueConfig {
                capacity: Some(2500),
                max_shards: Some(200),
                max_samples_per_send: Some(1000),
                rest: IndexMap::new(),
            }),
            write_relabel_configs: vec![
                // The soak test exports its own `namespace` label, which the
                // collector renames to `exported_namespace` on ingest. Put it
                // back, then drop the renamed one.
                RelabelConfig {
                    source_labels: vec![Str::from("exported_namespace")],
                    target_label: Some(Str::from("namespace")),
                    ..RelabelConfig::default()
                },
                RelabelConfig {
                    regex: Some(Str::from("exported_namespace")),
                    action: Some(Str::from("labeldrop")),
                    ..RelabelConfig::default()
                },
            ],
            rest: IndexMap::new(),
        }];
        Ok(())
    }
}
