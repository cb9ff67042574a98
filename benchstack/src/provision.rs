use std::fmt;

use anyhow::bail;
use indexmap::IndexMap;
use tracing::info;

use crate::Str;
use crate::config::{BenchConfig, Endpoints};
use crate::error::Error;

/// Address of a provisioned resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub address: Str,
    pub port: Option<u16>,
}

impl Endpoint {
    pub fn new(address: impl Into<Str>) -> Self {
        Self { address: address.into(), port: None }
    }
}

/// What a node asks its provisioner for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Database,
    Visibility,
    Metrics,
    Dashboards,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Database => "database",
            Self::Visibility => "visibility",
            Self::Metrics => "metrics",
            Self::Dashboards => "dashboards",
        })
    }
}

/// One provisionable resource plus the nodes that must exist before it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub name: Str,
    pub kind: ResourceKind,
    pub after: Vec<Str>,
}

impl Node {
    pub fn new(kind: ResourceKind) -> Self {
        Self { name: kind.to_string().into(), kind, after: Vec::new() }
    }

    pub fn after(mut self, dep: impl Into<Str>) -> Self {
        self.after.push(dep.into());
        self
    }
}

/// Creates a resource and reports the address to reach it on. Retries and
/// rollback are the provider's concern, not ours.
#[async_trait::async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, node: &Node) -> anyhow::Result<Endpoint>;
}

/// Dependency graph over named nodes. Execution is strictly sequential in
/// topological order; each call is awaited to completion before any
/// dependent starts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    nodes: IndexMap<Str, Node>,
}

impl Graph {
    pub fn add(&mut self, node: Node) {
        self.nodes.insert(node.name.clone(), node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Topological order over the nodes, ties broken by insertion order.
    /// Unknown `after` references and cycles are configuration errors and are
    /// reported before anything is provisioned.
    pub fn execution_order(&self) -> Result<Vec<&Node>, Error> {
        #[derive(Clone, Copy, PartialEq)]
        enum State {
            Visiting,
            Done,
        }

        fn visit<'a>(
            graph: &'a Graph,
            node: &'a Node,
            states: &mut IndexMap<&'a str, State>,
            order: &mut Vec<&'a Node>,
        ) -> Result<(), Error> {
            match states.get(node.name.as_str()) {
                Some(State::Done) => return Ok(()),
                Some(State::Visiting) => {
                    return Err(Error::InvalidConfiguration(format!(
                        "resource dependency cycle through `{}`",
                        node.name
                    )));
                }
                None => {}
            }
            states.insert(&node.name, State::Visiting);
            for dep in &node.after {
                let Some(dep_node) = graph.nodes.get(dep) else {
                    return Err(Error::InvalidConfiguration(format!(
                        "resource `{}` depends on unknown resource `{dep}`",
                        node.name
                    )));
                };
                visit(graph, dep_node, states, order)?;
            }
            states.insert(&node.name, State::Done);
            order.push(node);
            Ok(())
        }

        let mut states = IndexMap::new();
        let mut order = Vec::with_capacity(self.nodes.len());
        for node in self.nodes.values() {
            visit(self, node, &mut states, &mut order)?;
        }
        Ok(order)
    }

    /// Provision every node in execution order. The first failure aborts the
    /// run with the node name attached; already-provisioned resources are
    /// left standing.
    pub async fn provision(&self, provisioner: &dyn Provisioner) -> Result<Outputs, Error> {
        let order = self.execution_order()?;
        let mut outputs = Outputs::default();
        for node in order {
            info!(resource = %node.name, kind = %node.kind, "provisioning");
            let endpoint = provisioner.provision(node).await.map_err(|cause| {
                Error::ResourceProvisioningFailure { name: node.name.clone(), cause }
            })?;
            outputs.insert(node.name.clone(), endpoint);
        }
        Ok(outputs)
    }
}

/// Addresses keyed by node name, in provisioning order. Lookups are explicit;
/// a name that was never provisioned is simply absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    endpoints: IndexMap<Str, Endpoint>,
}

impl Outputs {
    pub fn insert(&mut self, name: Str, endpoint: Endpoint) {
        self.endpoints.insert(name, endpoint);
    }

    pub fn get(&self, name: &str) -> Option<&Endpoint> {
        self.endpoints.get(name)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// Resolves every resource from the addresses pinned in the configuration
/// `endpoints` block.
#[derive(Debug, Clone, Default)]
pub struct StaticProvisioner {
    endpoints: Endpoints,
}

impl StaticProvisioner {
    pub fn new(endpoints: Endpoints) -> Self {
        Self { endpoints }
    }
}

#[async_trait::async_trait]
impl Provisioner for StaticProvisioner {
    async fn provision(&self, node: &Node) -> anyhow::Result<Endpoint> {
        let address = match node.kind {
            ResourceKind::Database => &self.endpoints.database,
            ResourceKind::Visibility => &self.endpoints.visibility,
            ResourceKind::Metrics => &self.endpoints.metrics,
            ResourceKind::Dashboards => &self.endpoints.dashboards,
        };
        match address {
            Some(address) => Ok(Endpoint::new(address.clone())),
            None => bail!("no static endpoint configured for `{}`", node.name),
        }
    }
}

/// Graph for a full deploy: everything the configuration says the stack
/// needs. Nodes whose address cannot be resolved fail the run.
pub fn deploy_graph(config: &BenchConfig) -> Graph {
    let mut graph = Graph::default();
    graph.add(Node::new(ResourceKind::Database));
    if config.persistence.visibility.is_some() {
        graph.add(Node::new(ResourceKind::Visibility));
    }
    if config.endpoints.metrics.is_some() {
        graph.add(Node::new(ResourceKind::Metrics));
    }
    if config.endpoints.dashboards.is_some() {
        graph.add(Node::new(ResourceKind::Dashboards));
    }
    graph
}

/// Graph for `render`: only resources with a statically pinned address, so a
/// config without endpoints still renders (seed hosts and endpoint-gated
/// patches are simply omitted).
pub fn render_graph(config: &BenchConfig) -> Graph {
    let mut graph = Graph::default();
    let endpoints = &config.endpoints;
    if endpoints.database.is_some() {
        graph.add(Node::new(ResourceKind::Database));
    }
    if config.persistence.visibility.is_some() && endpoints.visibility.is_some() {
        graph.add(Node::new(ResourceKind::Visibility));
    }
    if endpoints.metrics.is_some() {
        graph.add(Node::new(ResourceKind::Metrics));
    }
    if endpoints.dashboards.is_some() {
        graph.add(Node::new(ResourceKind::Dashboards));
    }
    graph
}
