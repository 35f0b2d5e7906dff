//! Graph store seam: the statements the loader issues and the connection traits the
//! pipeline drives them through.

pub mod memory;
pub mod neo4j;

use async_trait::async_trait;

use crate::error::Result;
use crate::transform::TripRecord;

pub use memory::{GraphSnapshot, MemoryConnection, MemoryStore, TripEdge};
pub use neo4j::{Neo4jConnection, Neo4jStore};

pub const PING: &str = "RETURN 1 AS ok";

pub const MERGE_LOCATION: &str = "MERGE (l:Location {name: $location_id})";

pub const MERGE_TRIP: &str = r#"
    MATCH (start:Location {name: $pickup}), (end:Location {name: $dropoff})
    MERGE (start)-[:TRIP {
        distance: $distance,
        fare: $fare,
        pickup_dt: $pickup_dt,
        dropoff_dt: $dropoff_dt
    }]->(end)
    RETURN 1 AS matched
"#;

/// A single parameterised write. Each one is its own server-side unit of work.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Statement<'a> {
    Ping,
    MergeLocation { zone_id: i64 },
    MergeTrip(&'a TripRecord),
}

impl Statement<'_> {
    pub fn cypher(&self) -> &'static str {
        match self {
            Statement::Ping => PING,
            Statement::MergeLocation { .. } => MERGE_LOCATION,
            Statement::MergeTrip(_) => MERGE_TRIP,
        }
    }
}

#[async_trait]
pub trait GraphStore: Send + Sync {
    type Connection: GraphConnection;

    /// Opens a connection and verifies the store answers. Failure is
    /// [`crate::error::LoaderError::Connectivity`].
    async fn connect(&self) -> Result<Self::Connection>;
}

#[async_trait]
pub trait GraphConnection: Send + Sync {
    /// Runs one statement to completion and returns the number of rows it produced.
    async fn run(&self, statement: &Statement<'_>) -> Result<usize>;

    async fn close(self) -> Result<()>;
}
