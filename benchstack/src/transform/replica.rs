use tracing::debug;

use crate::Str;
use crate::object::Object;

use super::Transform;

/// Pins `spec.replicas` on the one deployment with a matching name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaleDeployment {
    pub name: Str,
    pub replicas: u32,
}

impl Transform for ScaleDeployment {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Deployment(deployment) = object else { return Ok(()) };
        if deployment.metadata.name != self.name {
            return Ok(());
        }
        debug!(name = %self.name, replicas = self.replicas, "scaling deployment");
        deployment.spec.replicas = Some(self.replicas);
        Ok(())
    }
}
