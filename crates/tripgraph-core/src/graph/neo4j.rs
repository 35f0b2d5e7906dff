use async_trait::async_trait;
use neo4rs::{query, Graph, Query};
use tracing::{debug, info};

use super::{GraphConnection, GraphStore, Statement};
use crate::config::StoreSettings;
use crate::error::{LoaderError, Result};

/// Neo4j over Bolt, via `neo4rs`.
#[derive(Debug, Clone)]
pub struct Neo4jStore {
    settings: StoreSettings,
}

impl Neo4jStore {
    pub fn new(settings: StoreSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl GraphStore for Neo4jStore {
    type Connection = Neo4jConnection;

    async fn connect(&self) -> Result<Neo4jConnection> {
        let uri = self.settings.uri.as_str();
        let unreachable = |message: String| LoaderError::Connectivity {
            uri: uri.to_string(),
            message,
        };

        let graph = Graph::new(uri, self.settings.user.as_str(), self.settings.password.as_str())
            .await
            .map_err(|err| unreachable(err.to_string()))?;

        let connection = Neo4jConnection { graph };
        connection
            .run(&Statement::Ping)
            .await
            .map_err(|err| unreachable(err.to_string()))?;

        info!(uri, "connected to graph store");
        Ok(connection)
    }
}

pub struct Neo4jConnection {
    graph: Graph,
}

#[async_trait]
impl GraphConnection for Neo4jConnection {
    async fn run(&self, statement: &Statement<'_>) -> Result<usize> {
        let mut stream = self.graph.execute(to_query(statement)).await?;
        let mut rows = 0;
        while stream.next().await?.is_some() {
            rows += 1;
        }
        Ok(rows)
    }

    async fn close(self) -> Result<()> {
        // neo4rs releases its pooled Bolt connections on drop.
        drop(self.graph);
        debug!("graph connection closed");
        Ok(())
    }
}

fn to_query(statement: &Statement<'_>) -> Query {
    let q = query(statement.cypher());
    match statement {
        Statement::Ping => q,
        Statement::MergeLocation { zone_id } => q.param("location_id", *zone_id),
        Statement::MergeTrip(trip) => q
            .param("pickup", trip.pickup_zone)
            .param("dropoff", trip.dropoff_zone)
            .param("distance", trip.distance)
            .param("fare", trip.fare)
            .param("pickup_dt", trip.pickup_at)
            .param("dropoff_dt", trip.dropoff_at),
    }
}
