//! Fan-out/fan-in executor: the per-node state machine.
//!
//! For each node the executor computes the children, spawns one concurrent
//! outbound call per child before awaiting any of them, drains the replies in
//! arrival order through a channel buffered to the child count, folds each
//! reply into the accumulating aggregate, runs the node's tasklet under its
//! duration-bounded cancellation, and produces the merged reply.
//!
//! Failure policy (fail-loud, no retries):
//! - a transport failure reaching a child aborts this node's whole response;
//! - a non-OK child status degrades this node's outgoing status and
//!   execution continues;
//! - an undecodable child body counts as an aggregation error: it degrades
//!   the status and contributes no entries.

use callmesh_core::{Aggregate, Config, NodeDescriptor, ServerId, TaskKind};
use callmesh_tasklets::TaskOutcome;
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

/// Errors that abort a node's response.
#[derive(Debug, Error)]
pub enum ExecError {
    /// The outbound HTTP client could not be constructed.
    #[error("failed to build outbound HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// A spawned child call failed at the transport level.
    ///
    /// Fatal to the current node; the whole subtree response is aborted and
    /// nothing is retried.
    #[error("child node {index} unreachable: {cause}")]
    ChildUnreachable {
        /// Index of the child that could not be reached.
        index: u32,
        /// Transport-level cause.
        cause: String,
    },

    /// A child completion went missing, which means its task panicked.
    #[error("lost completion for a spawned child call")]
    LostChild,

    /// The node's tasklet panicked instead of completing.
    #[error("tasklet panicked: {0}")]
    TaskletPanicked(String),

    /// The `fail` tasklet asked for the connection to be severed.
    ///
    /// Not an error in the ordinary sense: the transport shell reacts by
    /// terminating the connection without writing a response.
    #[error("connection severed by fail tasklet")]
    ConnectionDrop,
}

/// What one child call produced.
struct ChildReply {
    index: u32,
    result: Result<Aggregate, ExecError>,
}

/// Executes nodes of simulated call trees.
///
/// Cheap to clone; the reqwest client is internally shared. The server ID is
/// immutable and injected at construction.
#[derive(Debug, Clone)]
pub struct Executor {
    server_id: ServerId,
    target_url: String,
    client: reqwest::Client,
}

impl Executor {
    /// Create an executor sending child calls to `config.target_url`.
    ///
    /// # Errors
    ///
    /// Fails only if the outbound HTTP client cannot be built.
    pub fn new(server_id: ServerId, config: &Config) -> Result<Self, ExecError> {
        let mut builder = reqwest::Client::builder();
        if config.upstream_timeout_ms > 0 {
            builder = builder.timeout(Duration::from_millis(config.upstream_timeout_ms));
        }
        let client = builder.build().map_err(ExecError::ClientBuild)?;

        Ok(Self {
            server_id,
            target_url: config.target_url.clone(),
            client,
        })
    }

    /// The identifier this instance reports results under.
    #[must_use]
    pub fn server_id(&self) -> ServerId {
        self.server_id
    }

    /// Handle one node: fan out to its children, fan the results back in,
    /// then run the node's tasklet.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ChildUnreachable`] if any child call fails at the
    /// transport level and [`ExecError::ConnectionDrop`] if the node ran the
    /// `fail` tasklet.
    pub async fn handle(&self, node: NodeDescriptor) -> Result<Aggregate, ExecError> {
        tracing::info!(
            server = %self.server_id,
            request = %node.request_id,
            index = node.index,
            parent = node.parent_index,
            depth = node.depth,
            "node started"
        );

        let children = node.children();
        let mut aggregate = Aggregate::of_node(self.server_id, &node);

        if !children.is_empty() {
            self.fan_out(&node, children, &mut aggregate).await?;
        }

        if let Some(kind) = node.task {
            self.run_tasklet(kind, node.task_duration_ms).await?;
        }

        tracing::info!(
            server = %self.server_id,
            request = %node.request_id,
            index = node.index,
            degraded = aggregate.degraded,
            "node finished"
        );
        Ok(aggregate)
    }

    /// Spawn all child calls concurrently, then drain exactly one completion
    /// per child in arrival order, merging as they come.
    async fn fan_out(
        &self,
        node: &NodeDescriptor,
        children: Vec<NodeDescriptor>,
        aggregate: &mut Aggregate,
    ) -> Result<(), ExecError> {
        let count = children.len();
        let (tx, mut rx) = mpsc::channel::<ChildReply>(count);

        for child in children {
            let executor = self.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let index = child.index;
                let result = executor.call_child(&child).await;
                // Receiver only closes if the parent aborted; nothing to do.
                let _ = tx.send(ChildReply { index, result }).await;
            });
        }
        drop(tx);

        for _ in 0..count {
            let reply = rx.recv().await.ok_or(ExecError::LostChild)?;
            match reply.result {
                Ok(child_aggregate) => {
                    if child_aggregate.degraded {
                        tracing::warn!(
                            request = %node.request_id,
                            child = reply.index,
                            "child reported degraded status"
                        );
                    }
                    aggregate.merge(child_aggregate);
                }
                Err(e) => {
                    tracing::error!(
                        request = %node.request_id,
                        child = reply.index,
                        error = %e,
                        "child call failed"
                    );
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Send one child descriptor to the internal endpoint and decode the
    /// reply.
    async fn call_child(&self, child: &NodeDescriptor) -> Result<Aggregate, ExecError> {
        let url = format!("{}/internal", self.target_url);
        let response = self
            .client
            .post(&url)
            .json(child)
            .send()
            .await
            .map_err(|e| ExecError::ChildUnreachable {
                index: child.index,
                cause: e.to_string(),
            })?;

        // Non-OK is a soft condition: the subtree degrades but keeps going.
        let degraded = !response.status().is_success();

        match response.json::<BTreeMap<String, String>>().await {
            Ok(entries) => Ok(Aggregate::from_entries(entries, degraded)),
            Err(e) => {
                tracing::warn!(
                    child = child.index,
                    error = %e,
                    "child reply body undecodable, degrading"
                );
                Ok(Aggregate::from_entries(BTreeMap::new(), true))
            }
        }
    }

    /// Run the node's tasklet on its own task, firing the one-shot cancel
    /// after the node's duration. Suspends until the tasklet has stopped.
    async fn run_tasklet(&self, kind: TaskKind, duration_ms: u64) -> Result<(), ExecError> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let tasklet = tokio::spawn(callmesh_tasklets::run(kind, cancel_rx));

        tokio::time::sleep(Duration::from_millis(duration_ms)).await;
        let _ = cancel_tx.send(());

        match tasklet.await {
            Ok(TaskOutcome::Completed) => Ok(()),
            Ok(TaskOutcome::SeverConnection) => Err(ExecError::ConnectionDrop),
            Err(e) => Err(ExecError::TaskletPanicked(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callmesh_core::{RootParams, Topology};
    use std::time::Instant;

    fn executor() -> Executor {
        Executor::new(ServerId::new(), &Config::default()).unwrap()
    }

    fn single_node(task: Option<TaskKind>, duration_ms: u64) -> NodeDescriptor {
        NodeDescriptor::root(RootParams {
            topology: Topology::Fan,
            size: 1,
            task,
            task_duration_ms: duration_ms,
        })
    }

    #[tokio::test]
    async fn leaf_node_yields_singleton_without_network() {
        let executor = executor();
        let aggregate = executor.handle(single_node(None, 50)).await.unwrap();
        assert_eq!(aggregate.entries.len(), 1);
        assert_eq!(
            aggregate.entries[&executor.server_id().to_string()],
            "0001"
        );
        assert!(!aggregate.degraded);
    }

    #[tokio::test]
    async fn sleep_tasklet_bounds_the_response_time() {
        let executor = executor();
        let start = Instant::now();
        let aggregate = executor
            .handle(single_node(Some(TaskKind::Sleep), 50))
            .await
            .unwrap();
        assert!(!aggregate.degraded);
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(50), "ended early: {elapsed:?}");
        assert!(elapsed < Duration::from_millis(500), "blocked too long: {elapsed:?}");
    }

    #[tokio::test]
    async fn fail_tasklet_requests_connection_drop() {
        let executor = executor();
        let err = executor
            .handle(single_node(Some(TaskKind::Fail), 10))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecError::ConnectionDrop));
    }

    #[tokio::test]
    async fn unreachable_child_is_fatal() {
        // Point the executor at a port nothing listens on.
        let config = Config {
            target_url: "http://127.0.0.1:9".to_string(),
            upstream_timeout_ms: 1000,
            ..Config::default()
        };
        let executor = Executor::new(ServerId::new(), &config).unwrap();
        let root = NodeDescriptor::root(RootParams {
            topology: Topology::Fan,
            size: 2,
            ..RootParams::default()
        });
        let err = executor.handle(root).await.unwrap_err();
        assert!(matches!(err, ExecError::ChildUnreachable { index: 2, .. }));
    }
}
