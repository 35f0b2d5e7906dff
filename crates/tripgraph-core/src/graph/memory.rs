use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tokio::sync::Mutex;
use tracing::debug;

use super::{GraphConnection, GraphStore, Statement};
use crate::error::{LoaderError, Result};

pub const MEMORY_URI: &str = "memory://";

/// A directed `TRIP` relationship as stored.
#[derive(Debug, Clone, PartialEq)]
pub struct TripEdge {
    pub from: i64,
    pub to: i64,
    pub distance: f64,
    pub fare: f64,
    pub pickup_dt: NaiveDateTime,
    pub dropoff_dt: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphSnapshot {
    pub locations: BTreeSet<i64>,
    pub trips: Vec<TripEdge>,
}

#[derive(Debug, Default)]
struct MemoryState {
    graph: GraphSnapshot,
    refuse_connections: usize,
    fail_statement: Option<usize>,
    connect_attempts: usize,
    connections_closed: usize,
    statements_run: usize,
}

/// In-process graph with the same MERGE semantics as the Neo4j statements.
///
/// Clones share state, so a test can hold one handle while the pipeline drives another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `count` connection attempts.
    pub async fn refuse_connections(&self, count: usize) {
        self.state.lock().await.refuse_connections = count;
    }

    /// Fail the `nth` statement (1-based, counted over the store's lifetime).
    pub async fn fail_statement(&self, nth: usize) {
        self.state.lock().await.fail_statement = Some(nth);
    }

    pub async fn snapshot(&self) -> GraphSnapshot {
        self.state.lock().await.graph.clone()
    }

    pub async fn connect_attempts(&self) -> usize {
        self.state.lock().await.connect_attempts
    }

    pub async fn connections_closed(&self) -> usize {
        self.state.lock().await.connections_closed
    }

    pub async fn statements_run(&self) -> usize {
        self.state.lock().await.statements_run
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    type Connection = MemoryConnection;

    async fn connect(&self) -> Result<MemoryConnection> {
        let mut state = self.state.lock().await;
        state.connect_attempts += 1;

        if state.refuse_connections > 0 {
            state.refuse_connections -= 1;
            return Err(LoaderError::Connectivity {
                uri: MEMORY_URI.to_string(),
                message: "connection refused".to_string(),
            });
        }

        Ok(MemoryConnection {
            state: Arc::clone(&self.state),
        })
    }
}

pub struct MemoryConnection {
    state: Arc<Mutex<MemoryState>>,
}

#[async_trait]
impl GraphConnection for MemoryConnection {
    async fn run(&self, statement: &Statement<'_>) -> Result<usize> {
        let mut state = self.state.lock().await;
        state.statements_run += 1;
        if state.fail_statement == Some(state.statements_run) {
            return Err(LoaderError::Store(format!(
                "statement {} rejected",
                state.statements_run
            )));
        }

        let graph = &mut state.graph;
        match statement {
            Statement::Ping => Ok(1),
            Statement::MergeLocation { zone_id } => {
                graph.locations.insert(*zone_id);
                Ok(0)
            }
            Statement::MergeTrip(trip) => {
                if !graph.locations.contains(&trip.pickup_zone)
                    || !graph.locations.contains(&trip.dropoff_zone)
                {
                    return Ok(0);
                }

                let edge = TripEdge {
                    from: trip.pickup_zone,
                    to: trip.dropoff_zone,
                    distance: trip.distance,
                    fare: trip.fare,
                    pickup_dt: trip.pickup_at,
                    dropoff_dt: trip.dropoff_at,
                };
                if !graph.trips.contains(&edge) {
                    graph.trips.push(edge);
                }
                Ok(1)
            }
        }
    }

    async fn close(self) -> Result<()> {
        self.state.lock().await.connections_closed += 1;
        debug!("memory graph connection closed");
        Ok(())
    }
}
