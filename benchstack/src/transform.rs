mod dashboard;
mod datasource;
mod limits;
mod remote_write;
mod replica;
mod toleration;

pub use self::dashboard::PatchGrafanaHost;
pub use self::datasource::PatchDatasource;
pub use self::limits::SetResources;
pub use self::remote_write::PatchRemoteWrite;
pub use self::replica::ScaleDeployment;
pub use self::toleration::Tolerate;

use anyhow::Context;

use crate::group::ManifestGroup;
use crate::object::Object;

/// One in-place edit of a manifest object. Implementations check their own
/// kind/name predicate and are a no-op on everything else, so the pipeline
/// needs no routing table. A transform that matches nothing in the group is
/// silently a no-op; re-applying the configured list must be idempotent.
pub trait Transform: std::fmt::Debug {
    fn apply(&self, object: &mut Object) -> anyhow::Result<()>;
}

/// Apply `transforms` in configured order, each over every object in stored
/// order.
#[tracing::instrument(skip_all, fields(transforms = transforms.len(), objects = group.len()))]
pub fn apply_all(group: &mut ManifestGroup, transforms: &[Box<dyn Transform>]) -> anyhow::Result<()> {
    for transform in transforms {
        for object in group.iter_mut() {
            let id = object.id();
            transform
                .apply(object)
                .with_context(|| format!("applying {transform:?} to `{id}`"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_yaml::Value;

    use super::*;
    use crate::config::Limits;
    use crate::object::ObjectId;

    fn group() -> ManifestGroup {
        let mut group = ManifestGroup::default();
        group
            .push_documents(
                r#"
apiVersion: apps/v1
kind: Deployment
metadata: { name: temporal-frontend }
spec:
  template:
    spec:
      containers: [{ name: server, image: temporalio/server:1.22 }]
---
apiVersion: v1
kind: Service
metadata: { name: temporal-frontend }
spec:
  ports: [{ port: 7233 }]
"#,
            )
            .unwrap();
        group
    }

    fn snapshot(group: &ManifestGroup) -> Vec<Value> {
        group
            .iter()
            .map(|object| serde_yaml::to_value(object).unwrap())
            .collect()
    }

    #[test]
    fn unmatched_transforms_change_nothing() {
        let mut group = group();
        let before = snapshot(&group);
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(ScaleDeployment { name: "nonexistent".into(), replicas: 9 }),
            Box::new(PatchGrafanaHost { name: "grafana".into(), endpoint: "g.example".into() }),
        ];
        apply_all(&mut group, &transforms).unwrap();
        assert_eq!(snapshot(&group), before);
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(ScaleDeployment { name: "temporal-frontend".into(), replicas: 3 }),
            Box::new(SetResources {
                name: "temporal-frontend".into(),
                cpu: Limits { request: Some("2".into()), limit: Some("4".into()) },
                memory: Limits { request: Some("4Gi".into()), limit: None },
            }),
            Box::new(Tolerate { dedicated: "temporal".into() }),
        ];

        let mut once = group();
        apply_all(&mut once, &transforms).unwrap();
        let mut twice = group();
        apply_all(&mut twice, &transforms).unwrap();
        apply_all(&mut twice, &transforms).unwrap();
        assert_eq!(snapshot(&once), snapshot(&twice));
    }

    #[test]
    fn later_transforms_overwrite_earlier_ones() {
        let mut group = group();
        let transforms: Vec<Box<dyn Transform>> = vec![
            Box::new(ScaleDeployment { name: "temporal-frontend".into(), replicas: 3 }),
            Box::new(ScaleDeployment { name: "temporal-frontend".into(), replicas: 5 }),
        ];
        apply_all(&mut group, &transforms).unwrap();

        let id = ObjectId::new("Deployment", "temporal-frontend", None);
        let Some(Object::Deployment(deployment)) = group.get(&id) else {
            panic!("deployment missing")
        };
        assert_eq!(deployment.spec.replicas, Some(5));
    }

    #[test]
    fn untouched_objects_round_trip_through_the_pipeline() {
        let mut group = group();
        let original: Value = serde_yaml::from_str(
            "apiVersion: v1\nkind: Service\nmetadata: { name: temporal-frontend }\nspec:\n  ports: [{ port: 7233 }]\n",
        )
        .unwrap();
        let transforms: Vec<Box<dyn Transform>> =
            vec![Box::new(ScaleDeployment { name: "temporal-frontend".into(), replicas: 2 })];
        apply_all(&mut group, &transforms).unwrap();

        let mut out = Vec::new();
        group.write_to(&mut out).unwrap();
        let rendered = String::from_utf8(out).unwrap();
        let service = serde_yaml::Deserializer::from_str(&rendered)
            .map(|doc| Value::deserialize(doc).unwrap())
            .find(|doc| doc.get("kind").and_then(Value::as_str) == Some("Service"))
            .unwrap();
        assert_eq!(service, original);
    }
}
