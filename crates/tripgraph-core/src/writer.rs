//! Idempotent upserts of `Location` nodes and `TRIP` relationships.

use tracing::debug;

use crate::error::{LoaderError, Result};
use crate::graph::{GraphConnection, Statement};
use crate::transform::TripRecord;

/// One logical unit of work over a connection. Every statement still commits on
/// its own; nothing is rolled back if a later statement fails.
pub struct Session<'c, C: GraphConnection> {
    connection: &'c C,
    statements: usize,
}

impl<'c, C: GraphConnection> Session<'c, C> {
    pub fn new(connection: &'c C) -> Self {
        Self {
            connection,
            statements: 0,
        }
    }

    pub fn statements(&self) -> usize {
        self.statements
    }

    async fn run(&mut self, statement: Statement<'_>) -> Result<usize> {
        self.statements += 1;
        debug!(statement = self.statements, cypher = statement.cypher(), "running statement");
        self.connection.run(&statement).await
    }
}

/// Ensures a `Location` node keyed on `zone_id` exists.
pub async fn upsert_location<C: GraphConnection>(
    session: &mut Session<'_, C>,
    zone_id: i64,
) -> Result<()> {
    session.run(Statement::MergeLocation { zone_id }).await?;
    Ok(())
}

/// Ensures a `TRIP` edge with exactly this attribute tuple joins the trip's endpoints.
/// Both `Location` nodes must already exist.
pub async fn upsert_trip<C: GraphConnection>(
    session: &mut Session<'_, C>,
    trip: &TripRecord,
) -> Result<()> {
    let matched = session.run(Statement::MergeTrip(trip)).await?;
    if matched == 0 {
        return Err(LoaderError::Write {
            pickup: trip.pickup_zone,
            dropoff: trip.dropoff_zone,
        });
    }
    Ok(())
}
