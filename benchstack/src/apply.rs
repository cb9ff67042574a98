use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::info;

use crate::error::Error;
use crate::group::{GroupName, ManifestGroup};

/// Destination of a finished manifest group. The group is consumed
/// read-only; appliers never mutate objects.
#[async_trait::async_trait]
pub trait Applier: Send {
    async fn apply(&mut self, group: GroupName, manifests: &ManifestGroup) -> anyhow::Result<()>;
}

/// Streams each group as multi-document YAML to `kubectl apply -f -` against
/// the current kubecontext.
#[derive(Debug, Clone, Copy, Default)]
pub struct Kubectl;

#[async_trait::async_trait]
impl Applier for Kubectl {
    async fn apply(&mut self, group: GroupName, manifests: &ManifestGroup) -> anyhow::Result<()> {
        if manifests.is_empty() {
            return Ok(());
        }
        let mut rendered = Vec::new();
        manifests.write_to(&mut rendered)?;

        info!(group = %group, objects = manifests.len(), "applying manifests");
        let mut child = Command::new("kubectl")
            .args(["apply", "-f", "-"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("spawning kubectl")?;

        let mut stdin = child.stdin.take().context("kubectl stdin unavailable")?;
        stdin.write_all(&rendered).await.context("writing manifests to kubectl")?;
        drop(stdin);

        let output = child.wait_with_output().await.context("waiting for kubectl")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ManifestApplyFailure(format!(
                "kubectl apply failed for group `{group}`: {}",
                stderr.trim()
            ))
            .into());
        }
        Ok(())
    }
}

/// Collects rendered groups instead of applying them. Backs `render` and the
/// tests.
#[derive(Debug, Default)]
pub struct Buffer {
    pub rendered: Vec<(GroupName, String)>,
}

#[async_trait::async_trait]
impl Applier for Buffer {
    async fn apply(&mut self, group: GroupName, manifests: &ManifestGroup) -> anyhow::Result<()> {
        let mut out = Vec::new();
        manifests.write_to(&mut out)?;
        self.rendered.push((group, String::from_utf8(out)?));
        Ok(())
    }
}
