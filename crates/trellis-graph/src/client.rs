//! Neo4j connection management and statement execution.

use neo4rs::{BoltNull, BoltType, ConfigBuilder, Graph, Query, Row, Txn};
use serde::Deserialize;

use trellis_core::{config, CoreError, ParamMap, Value};

use crate::statement::Statement;

/// Errors from graph operations.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Config error: {0}")]
    Config(#[from] CoreError),
}

/// Configuration for connecting to Neo4j.
///
/// Loaded from the `[neo4j]` section of `<prefix>.toml` or
/// `TRELLIS__NEO4J__*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_uri")]
    pub uri: String,
    #[serde(default = "default_user")]
    pub user: String,
    #[serde(default = "default_password")]
    pub password: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "trellis-dev".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl GraphConfig {
    /// Load the `neo4j` section, falling back to defaults when it is absent.
    pub fn load(file_prefix: &str) -> Result<Self, GraphError> {
        let loaded = config::load_section(file_prefix, config::ENV_PREFIX, "neo4j")?;
        Ok(loaded.unwrap_or_default())
    }
}

/// Whether a job may change the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Rolled back when finished.
    Read,
    /// Committed when finished.
    Write,
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Get a reference to the underlying neo4rs Graph for direct operations.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }

    /// Start building a statement.
    pub fn new_request(&self) -> Statement {
        Statement::new()
    }

    /// Open a transaction for one or more statements.
    pub async fn begin(&self, mode: AccessMode) -> Result<Job, GraphError> {
        let txn = self.graph.start_txn().await?;
        Ok(Job { txn, mode })
    }

    /// Run one statement in a read job and collect its rows.
    pub async fn read(&self, statement: &Statement) -> Result<Vec<Row>, GraphError> {
        self.run_single(AccessMode::Read, statement).await
    }

    /// Run one statement in a write job, commit, and collect its rows.
    pub async fn write(&self, statement: &Statement) -> Result<Vec<Row>, GraphError> {
        self.run_single(AccessMode::Write, statement).await
    }

    async fn run_single(
        &self,
        mode: AccessMode,
        statement: &Statement,
    ) -> Result<Vec<Row>, GraphError> {
        let mut job = self.begin(mode).await?;
        let rows = job.execute(statement).await?;
        job.finish().await?;
        Ok(rows)
    }
}

/// A unit of work bound to one transaction.
///
/// Dropping a job without finishing it leaves the transaction uncommitted.
pub struct Job {
    txn: Txn,
    mode: AccessMode,
}

impl Job {
    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    /// Evaluate and run a statement, draining all rows.
    pub async fn execute(&mut self, statement: &Statement) -> Result<Vec<Row>, GraphError> {
        let (text, params) = statement.eval();
        tracing::debug!(mode = ?self.mode, query = %text, params = %params, "Executing statement");

        let mut stream = self.txn.execute(bind_query(&text, &params)).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next(self.txn.handle()).await? {
            rows.push(row);
        }

        tracing::debug!(rows = rows.len(), "Statement complete");
        Ok(rows)
    }

    /// Commit a write job; roll back a read job.
    pub async fn finish(self) -> Result<(), GraphError> {
        match self.mode {
            AccessMode::Write => self.txn.commit().await?,
            AccessMode::Read => self.txn.rollback().await?,
        }
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), GraphError> {
        self.txn.rollback().await?;
        Ok(())
    }
}

/// Convert a statement into a driver query with every parameter bound.
pub fn to_query(statement: &Statement) -> Query {
    let (text, params) = statement.eval();
    bind_query(&text, &params)
}

fn bind_query(text: &str, params: &ParamMap) -> Query {
    params
        .iter()
        .fold(neo4rs::query(text), |q, (key, value)| q.param(key, to_bolt(value)))
}

/// Map a parameter value onto the driver's wire type.
pub fn to_bolt(value: &Value) -> BoltType {
    match value {
        Value::Null => BoltType::Null(BoltNull),
        Value::Bool(b) => BoltType::from(*b),
        Value::Int(i) => BoltType::from(*i),
        Value::Float(f) => BoltType::from(*f),
        Value::String(s) => BoltType::from(s.as_str()),
        Value::List(items) => BoltType::from(items.iter().map(to_bolt).collect::<Vec<_>>()),
        Value::DateTime(dt) => BoltType::from(dt.fixed_offset()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{HasProperties, Node};

    #[test]
    fn test_default_config() {
        let config = GraphConfig::default();
        assert_eq!(config.uri, "bolt://localhost:7687");
        assert_eq!(config.user, "neo4j");
        assert_eq!(config.max_connections, 16);
        assert_eq!(config.fetch_size, 256);
    }

    #[test]
    fn test_load_without_sources_uses_defaults() {
        let config = GraphConfig::load("trellis-test-does-not-exist").unwrap();
        assert_eq!(config.uri, GraphConfig::default().uri);
    }

    #[test]
    fn test_to_bolt_scalars() {
        assert_eq!(to_bolt(&Value::Int(20)), BoltType::from(20i64));
        assert_eq!(to_bolt(&Value::from("John")), BoltType::from("John"));
        assert_eq!(to_bolt(&Value::Bool(true)), BoltType::from(true));
        assert!(matches!(to_bolt(&Value::Null), BoltType::Null(_)));
        assert!(matches!(to_bolt(&Value::from(vec![1, 2])), BoltType::List(_)));
    }

    #[test]
    fn test_to_query_binds_every_param() {
        let user = Node::new("user").with_prop("name", "John").with_prop("age", 20);
        let statement = Statement::new()
            .match_(&user)
            .return_(user.properties(&["name"]));
        let query = to_query(&statement);
        assert!(query.has_param_key("user_name"));
        assert!(query.has_param_key("user_age"));
    }

    #[test]
    fn test_bind_query_uses_evaluated_params() {
        let params = ParamMap::new().with("user_name", "John").with("user_age", 20);
        let query = bind_query("MATCH (user{name: $user_name}) RETURN user", &params);
        assert!(query.has_param_key("user_name"));
        assert!(query.has_param_key("user_age"));
        assert!(!query.has_param_key("user_id"));
    }
}
