use compact_str::format_compact;
use tracing::debug;

use crate::Str;
use crate::object::Object;
use crate::object::monitoring::External;

use super::Transform;

/// Sets the external URL of the one matching Grafana object to
/// `https://<endpoint>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchGrafanaHost {
    pub name: Str,
    pub endpoint: Str,
}

impl Transform for PatchGrafanaHost {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Grafana(grafana) = object else { return Ok(()) };
        if grafana.metadata.name != self.name {
            return Ok(());
        }
        debug!(name = %self.name, endpoint = %self.endpoint, "patching grafana host");
        let external = grafana.spec.external.get_or_insert_with(External::default);
        external.url = format_compact!("https://{}", self.endpoint);
        Ok(())
    }
}
