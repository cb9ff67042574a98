use std::fmt;
use std::io;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use indexmap::IndexMap;
use indexmap::map::Entry;
use serde::Deserialize;
use serde_yaml::Value;

use crate::PathExt;
use crate::error::Error;
use crate::object::{Object, ObjectId};

/// The three manifest groups of a deployment, in apply order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupName {
    Temporal,
    Benchmark,
    Monitoring,
}

impl GroupName {
    pub const ALL: [GroupName; 3] = [Self::Temporal, Self::Benchmark, Self::Monitoring];

    /// Subdirectory the group's manifests are loaded from. Doubles as the
    /// dedicated node group identifier when node pinning is on.
    pub fn dir(self) -> &'static str {
        match self {
            Self::Temporal => "temporal",
            Self::Benchmark => "benchmark",
            Self::Monitoring => "monitoring",
        }
    }
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}

impl FromStr for GroupName {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "temporal" => Ok(Self::Temporal),
            "benchmark" => Ok(Self::Benchmark),
            "monitoring" => Ok(Self::Monitoring),
            _ => anyhow::bail!("unknown group `{s}`, expected `temporal`, `benchmark`, or `monitoring`"),
        }
    }
}

/// An ordered set of manifest objects keyed by identity. Load order is file
/// order (lexicographic) then document order within a file, and is preserved
/// through transformation and apply.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestGroup {
    objects: IndexMap<ObjectId, Object>,
}

impl ManifestGroup {
    /// Load every `*.yaml`/`*.yml` file in `path`, multi-document aware.
    #[tracing::instrument(skip_all, fields(path = %path.pretty()))]
    pub fn load_dir(path: &Path) -> anyhow::Result<Self> {
        let mut files = Vec::new();
        let entries = std::fs::read_dir(path)
            .with_context(|| format!("reading manifest directory `{}`", path.pretty()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "yaml" || ext == "yml") {
                files.push(path);
            }
        }
        files.sort();

        let mut group = Self::default();
        for file in files {
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("reading `{}`", file.pretty()))?;
            group
                .push_documents(&text)
                .with_context(|| format!("loading `{}`", file.pretty()))?;
        }
        tracing::debug!(objects = group.len(), "loaded manifest group");
        Ok(group)
    }

    /// Decode and insert every document in a multi-document YAML string.
    pub fn push_documents(&mut self, text: &str) -> anyhow::Result<()> {
        for (index, document) in serde_yaml::Deserializer::from_str(text).enumerate() {
            let value = Value::deserialize(document)
                .map_err(|err| Error::ManifestApplyFailure(format!("document {index}: {err}")))?;
            if matches!(value, Value::Null) {
                continue;
            }
            let object = Object::decode(value).with_context(|| format!("document {index}"))?;
            self.insert(object)
                .map_err(|conflict| Error::ManifestApplyFailure(conflict.to_string()))
                .with_context(|| format!("document {index}"))?;
        }
        Ok(())
    }

    pub fn insert(&mut self, object: Object) -> Result<(), Conflict> {
        match self.objects.entry(object.id()) {
            Entry::Occupied(entry) => Err(Conflict { id: entry.key().clone() }),
            Entry::Vacant(entry) => {
                entry.insert(object);
                Ok(())
            }
        }
    }

    pub fn get(&self, id: &ObjectId) -> Option<&Object> {
        self.objects.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Object> {
        self.objects.values_mut()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Serialize as multi-document YAML, a `---` marker before each document.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> anyhow::Result<()> {
        for object in self.iter() {
            writeln!(out, "---")?;
            serde_yaml::to_writer(&mut *out, object)
                .with_context(|| format!("serializing `{}`", object.id()))?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ManifestGroup {
    type Item = &'a Object;
    type IntoIter = indexmap::map::Values<'a, ObjectId, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.objects.values()
    }
}

/// Two documents in one group share a `kind/name[.namespace]` identity.
#[derive(Debug)]
pub struct Conflict {
    pub id: ObjectId,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manifest `{}` is defined more than once in the group", self.id)
    }
}

impl std::error::Error for Conflict {}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::error::Error;

    const DEPLOYMENT: &str = r#"
apiVersion: apps/v1
kind: Deployment
metadata: { name: temporal-frontend }
spec:
  template:
    spec:
      containers: [{ name: server }]
"#;

    #[test]
    fn loads_files_in_lexicographic_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("b.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata: { name: svc-b }\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("a.yaml"),
            "apiVersion: v1\nkind: Service\nmetadata: { name: svc-a }\n---\napiVersion: v1\nkind: Service\nmetadata: { name: svc-a2 }\n",
        )
        .unwrap();
        fs::write(dir.path().join("ignored.txt"), "not yaml").unwrap();

        let group = ManifestGroup::load_dir(dir.path()).unwrap();
        let names: Vec<_> = group.iter().map(|object| object.name().to_owned()).collect();
        assert_eq!(names, ["svc-a", "svc-a2", "svc-b"]);
    }

    #[test]
    fn empty_documents_are_skipped() {
        let mut group = ManifestGroup::default();
        group
            .push_documents("---\n# comment only\n---\napiVersion: v1\nkind: Service\nmetadata: { name: svc }\n")
            .unwrap();
        assert_eq!(group.len(), 1);
    }

    #[test]
    fn duplicate_identity_is_rejected() {
        let mut group = ManifestGroup::default();
        group.push_documents(DEPLOYMENT).unwrap();
        let err = group.push_documents(DEPLOYMENT).unwrap_err();
        let err = err.downcast_ref::<Error>().unwrap();
        assert!(
            err.to_string().contains("Deployment/temporal-frontend"),
            "{err}"
        );
    }

    #[test]
    fn same_name_different_kind_is_fine() {
        let mut group = ManifestGroup::default();
        group.push_documents(DEPLOYMENT).unwrap();
        group
            .push_documents("apiVersion: v1\nkind: Service\nmetadata: { name: temporal-frontend }\n")
            .unwrap();
        assert_eq!(group.len(), 2);
    }

    #[test]
    fn writes_multi_document_yaml() {
        let mut group = ManifestGroup::default();
        group.push_documents(DEPLOYMENT).unwrap();
        group
            .push_documents("apiVersion: v1\nkind: Service\nmetadata: { name: svc }\n")
            .unwrap();

        let mut out = Vec::new();
        group.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("---\n").count(), 2);

        let docs: Vec<Value> = serde_yaml::Deserializer::from_str(&text)
            .map(|doc| Value::deserialize(doc).unwrap())
            .collect();
        assert_eq!(docs.len(), 2);
    }
}
