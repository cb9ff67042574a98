use tracing::debug;

use crate::Str;
use crate::object::Object;
use crate::object::workload::Toleration;

use super::Transform;

/// Pins every deployment in the group onto its dedicated node group by
/// overwriting `spec.template.spec.tolerations` with the single `dedicated`
/// entry. No name filter; non-deployments are untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tolerate {
    pub dedicated: Str,
}

impl Transform for Tolerate {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Deployment(deployment) = object else { return Ok(()) };
        debug!(name = %deployment.metadata.name, dedicated = %self.dedicated, "tolerating dedicated nodes");
        deployment.spec.template.spec.tolerations = Some(vec![Toleration::dedicated(&self.dedicated)]);
        Ok(())
    }
}
