use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::info;

use crate::{PathExt, Str};

/// Minimal Grafana HTTP client covering what dashboard upload needs: folder
/// lookup/creation and dashboard upsert.
pub struct Client {
    http: reqwest::Client,
    base: Str,
    token: Str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Folder {
    pub uid: Str,
    pub title: Str,
}

/// A dashboard definition. The model schema is opaque; only the title is
/// read, to match on upsert.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub title: Str,
    pub model: serde_json::Value,
}

impl Dashboard {
    /// Read a definition file. YAML is a superset of JSON, so both work.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading dashboard `{}`", path.pretty()))?;
        let model: serde_json::Value = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing dashboard `{}`", path.pretty()))?;
        let title = model
            .get("title")
            .and_then(serde_json::Value::as_str)
            .with_context(|| format!("dashboard `{}` has no string `title`", path.pretty()))?
            .into();
        Ok(Self { title, model })
    }
}

impl Client {
    pub fn new(host: &str, token: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("building http client")?;
        Ok(Self { http, base: host.trim_end_matches('/').into(), token: token.into() })
    }

    /// Find a folder by title, creating it when absent.
    pub async fn find_or_create_folder(&self, title: &str) -> anyhow::Result<Folder> {
        let folders: Vec<Folder> = self.get("/api/folders").await?;
        if let Some(folder) = folders.into_iter().find(|folder| folder.title == title) {
            return Ok(folder);
        }
        info!(title, "creating dashboard folder");
        self.post("/api/folders", &json!({ "title": title })).await
    }

    /// Create or overwrite the dashboard in `folder`, matched by uid/title.
    pub async fn upsert_dashboard(&self, folder: &Folder, dashboard: &Dashboard) -> anyhow::Result<()> {
        info!(title = %dashboard.title, folder = %folder.title, "upserting dashboard");
        let _: serde_json::Value = self
            .post(
                "/api/dashboards/db",
                &json!({
                    "dashboard": dashboard.model,
                    "folderUid": folder.uid,
                    "overwrite": true,
                }),
            )
            .await?;
        Ok(())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let response = self
            .http
            .get(format!("{}{path}", self.base))
            .bearer_auth(&self.token)
            .send()
            .await
            .with_context(|| format!("GET {path}"))?;
        Self::decode(path, response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &serde_json::Value) -> anyhow::Result<T> {
        let response = self
            .http
            .post(format!("{}{path}", self.base))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("POST {path}"))?;
        Self::decode(path, response).await
    }

    async fn decode<T: DeserializeOwned>(path: &str, response: reqwest::Response) -> anyhow::Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("{path} returned {status}: {}", body.trim());
        }
        response.json().await.with_context(|| format!("decoding {path} response"))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn loads_dashboard_title_from_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.yaml");
        fs::write(
            &path,
            "title: Temporal Benchmarks\npanels:\n  - type: timeseries\n    title: State transitions\n",
        )
        .unwrap();

        let dashboard = Dashboard::load(&path).unwrap();
        assert_eq!(dashboard.title, "Temporal Benchmarks");
        assert!(dashboard.model.get("panels").unwrap().is_array());
    }

    #[test]
    fn rejects_dashboards_without_a_title() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stack.yaml");
        fs::write(&path, "panels: []\n").unwrap();
        let err = Dashboard::load(&path).unwrap_err();
        assert!(err.to_string().contains("title"), "{err}");
    }
}
