use tracing::debug;

use crate::Str;
use crate::object::Object;
use crate::object::monitoring::JsonData;

use super::Transform;

/// Points the one matching GrafanaDatasource at the metrics endpoint and
/// stamps the sigv4 signing metadata. An empty endpoint leaves the manifest's
/// own URL in place; the signing fields are always overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDatasource {
    pub name: Str,
    pub region: Str,
    pub endpoint: Str,
}

impl Transform for PatchDatasource {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()> {
        let Object::Datasource(datasource) = object else { return Ok(()) };
        if datasource.metadata.name != self.name {
            return Ok(());
        }
        debug!(name = %self.name, region = %self.region, "patching datasource");

        let config = &mut datasource.spec.datasource;
        if !self.endpoint.is_empty() {
            config.url = self.endpoint.clone();
        }
        let json_data = config.json_data.get_or_insert_with(JsonData::default);
        json_data.sig_v4_auth = Some(true);
        json_data.sig_v4_auth_type = Some(Str::from("ec2_iam_role"));
        json_data.sig_v4_region = Some(self.region.clone());
        Ok(())
    }
}
