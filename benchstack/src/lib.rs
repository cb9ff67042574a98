pub mod apply;
pub mod config;
pub mod error;
pub mod generate;
pub mod grafana;
pub mod group;
pub mod object;
pub mod plan;
pub mod provision;
pub mod resolve;
pub mod transform;

pub use self::error::Error;

use std::fmt;
use std::io;
use std::ops::Deref;
use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use compact_str::CompactString;

use self::apply::{Applier, Buffer};
use self::config::BenchConfig;
use self::group::{GroupName, ManifestGroup};
use self::provision::StaticProvisioner;

pub type Str = CompactString;

/// File name looked up when the configuration path points at a directory.
pub const CONFIG_FILE: &str = "benchstack.yaml";

/// A deserialized value together with the canonical path it came from.
#[derive(Debug, Clone)]
pub struct Located<T> {
    value: T,
    path: PathBuf,
}

impl<T> Located<T> {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T> Deref for Located<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.value
    }
}

#[tracing::instrument(skip_all, fields(path = %path.pretty()))]
pub fn load_config(path: &Path) -> anyhow::Result<Located<BenchConfig>> {
    ensure!(path.exists(), "configuration `{}` does not exist", path.pretty());
    let mut path = path
        .canonicalize()
        .with_context(|| format!("canonicalizing `{}`", path.pretty()))?;

    if path.is_dir() {
        path.push(CONFIG_FILE);
        ensure!(path.exists(), "configuration `{}` does not exist", path.pretty());
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("reading configuration `{}`", path.pretty()))?;
    let config = serde_yaml::from_str(&text)
        .map_err(|err| Error::InvalidConfiguration(format!("`{}`: {err}", path.pretty())))?;
    Ok(Located { value: config, path })
}

/// Run the full pipeline and hand each finished group to `applier` in the
/// fixed temporal, benchmark, monitoring order.
#[tracing::instrument(skip_all, fields(config = %config_path.pretty()))]
async fn run(
    config_path: &Path,
    manifests_dir: &Path,
    only: Option<GroupName>,
    strict: bool,
    applier: &mut dyn Applier,
) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let mut resolved = resolve::resolve(&config)?;

    let graph = if strict {
        provision::deploy_graph(&config)
    } else {
        provision::render_graph(&config)
    };
    let provisioner = StaticProvisioner::new(config.endpoints.clone());
    let outputs = graph.provision(&provisioner).await?;
    resolved.runtime.bind_endpoints(&outputs);

    for name in GroupName::ALL {
        if only.is_some_and(|only| only != name) {
            continue;
        }

        let dir = manifests_dir.join(name.dir());
        let mut group = ManifestGroup::load_dir(&dir)
            .with_context(|| format!("loading group `{name}`"))?;

        match name {
            GroupName::Temporal if !config.temporal.dynamic_config.is_empty() => {
                insert_generated(&mut group, generate::dynamic_config_map(&config.temporal.dynamic_config)?)?;
            }
            GroupName::Benchmark => {
                insert_generated(&mut group, generate::env_config_map(&resolved.runtime)?)?;
            }
            _ => {}
        }

        let transforms = plan::transforms(name, &config, &resolved, &outputs);
        transform::apply_all(&mut group, &transforms)
            .with_context(|| format!("transforming group `{name}`"))?;

        applier.apply(name, &group).await?;
    }

    Ok(())
}

fn insert_generated(group: &mut ManifestGroup, object: object::Object) -> anyhow::Result<()> {
    group
        .insert(object)
        .map_err(|conflict| Error::ManifestApplyFailure(format!("generated {conflict}")))?;
    Ok(())
}

/// Render the transformed groups as multi-document YAML without touching a
/// cluster. Resources without a statically known address are left unbound.
pub async fn render(
    config_path: &Path,
    manifests_dir: &Path,
    only: Option<GroupName>,
    out: &mut impl io::Write,
) -> anyhow::Result<()> {
    let mut buffer = Buffer::default();
    run(config_path, manifests_dir, only, false, &mut buffer).await?;
    for (_, rendered) in &buffer.rendered {
        out.write_all(rendered.as_bytes())?;
    }
    Ok(())
}

/// Provision resources, then transform and apply every group.
pub async fn deploy(
    config_path: &Path,
    manifests_dir: &Path,
    applier: &mut dyn Applier,
) -> anyhow::Result<()> {
    run(config_path, manifests_dir, None, true, applier).await
}

pub(crate) trait PathExt {
    fn pretty(&self) -> impl fmt::Display + '_;
}

impl PathExt for Path {
    fn pretty(&self) -> impl fmt::Display + '_ {
        match std::env::current_dir() {
            Ok(cwd) => self.strip_prefix(cwd).unwrap_or(self).display(),
            Err(_) => self.display(),
        }
    }
}
