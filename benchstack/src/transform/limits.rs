use tracing::debug;

use crate::Str;
use crate::config::Limits;
use crate::error::Error;
use crate::object::Object;
use crate::object::workload::{Quantities, Resources};

use super::Transform;

/// Sets cpu/memory requests and limits on the first container of the one
/// deployment with a matching name. Only fields present in the configured
/// `Limits` are written; everything else keeps its current value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetResources {
    pub name: Str,
    pub cpu: Limits,
    pub memory: Limits,
}

impl Transform for SetResources {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Deployment(deployment) = object else { return Ok(()) };
        if deployment.metadata.name != self.name {
            return Ok(());
        }
        let Some(container) = deployment.spec.template.spec.containers.first_mut() else {
            return Err(Error::ManifestApplyFailure(format!(
                "deployment `{}` has no containers in its pod template",
                self.name
            ))
            .into());
        };
        if self.cpu.is_unset() && self.memory.is_unset() {
            return Ok(());
        }
        debug!(name = %self.name, container = %container.name, "setting container resources");

        let resources = container.resources.get_or_insert_with(Resources::default);
        if self.cpu.request.is_some() || self.memory.request.is_some() {
            let requests = resources.requests.get_or_insert_with(Quantities::default);
            if let Some(cpu) = &self.cpu.request {
                requests.cpu = Some(cpu.clone());
            }
            if let Some(memory) = &self.memory.request {
                requests.memory = Some(memory.clone());
            }
        }
        if self.cpu.limit.is_some() || self.memory.limit.is_some() {
            let limits = resources.limits.get_or_insert_with(Quantities::default);
            if let Some(cpu) = &self.cpu.limit {
                limits.cpu = Some(cpu.clone());
            }
            if let Some(memory) = &self.memory.limit {
                limits.memory = Some(memory.clone());
            }
        }
        Ok(())
    }
}
