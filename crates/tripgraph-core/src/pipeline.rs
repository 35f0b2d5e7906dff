//! One end-to-end run: connect, load, transform, write, close.

use std::path::Path;

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::error::Result;
use crate::graph::{GraphConnection, GraphStore};
use crate::retry::{retry_with_policy, RetryError, RetryPolicy};
use crate::source::load_trip_frame;
use crate::transform::{distinct_zones, transform_trips};
use crate::writer::{upsert_location, upsert_trip, Session};
use crate::zones::ZoneFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Disconnected,
    Connected,
    Loading,
    WritingNodes,
    WritingRelationships,
    Closed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub rows_read: usize,
    pub trips_retained: usize,
    pub locations_upserted: usize,
    pub trips_upserted: usize,
}

/// Loads the parquet file at `source` into the store.
pub async fn run_once<S: GraphStore>(
    store: &S,
    source: &Path,
    zones: &ZoneFilter,
) -> Result<LoadSummary> {
    run_with_loader(store, zones, || load_trip_frame(source)).await
}

/// Same as [`run_once`] for a frame that is already in memory.
pub async fn load_frame<S: GraphStore>(
    store: &S,
    frame: &DataFrame,
    zones: &ZoneFilter,
) -> Result<LoadSummary> {
    run_with_loader(store, zones, || Ok(frame.clone())).await
}

/// [`run_once`] under the retry policy. Every attempt starts from scratch.
pub async fn run_with_retry<S: GraphStore>(
    store: &S,
    source: &Path,
    zones: &ZoneFilter,
    policy: &RetryPolicy,
) -> std::result::Result<LoadSummary, RetryError> {
    retry_with_policy(policy, move |attempt| {
        info!(attempt, max_attempts = policy.max_attempts, "starting load attempt");
        run_once(store, source, zones)
    })
    .await
}

async fn run_with_loader<S, F>(store: &S, zones: &ZoneFilter, load: F) -> Result<LoadSummary>
where
    S: GraphStore,
    F: FnOnce() -> Result<DataFrame>,
{
    enter(Stage::Disconnected);
    let connection = store.connect().await?;
    enter(Stage::Connected);

    let outcome = load_and_write(&connection, zones, load).await;
    let closed = connection.close().await;
    enter(Stage::Closed);

    match (outcome, closed) {
        (Ok(summary), Ok(())) => {
            info!(
                rows_read = summary.rows_read,
                trips_retained = summary.trips_retained,
                locations_upserted = summary.locations_upserted,
                trips_upserted = summary.trips_upserted,
                "load complete"
            );
            Ok(summary)
        }
        (Ok(_), Err(err)) => Err(err),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close_err)) => {
            warn!(error = %close_err, "failed to close graph connection after a failed load");
            Err(err)
        }
    }
}

async fn load_and_write<C, F>(connection: &C, zones: &ZoneFilter, load: F) -> Result<LoadSummary>
where
    C: GraphConnection,
    F: FnOnce() -> Result<DataFrame>,
{
    enter(Stage::Loading);
    let frame = load()?;
    let trips = transform_trips(&frame, zones)?;

    let mut summary = LoadSummary {
        rows_read: frame.height(),
        trips_retained: trips.len(),
        ..LoadSummary::default()
    };

    let mut session = Session::new(connection);

    enter(Stage::WritingNodes);
    for zone_id in distinct_zones(&trips) {
        upsert_location(&mut session, zone_id).await?;
        summary.locations_upserted += 1;
    }

    enter(Stage::WritingRelationships);
    for trip in &trips {
        upsert_trip(&mut session, trip).await?;
        summary.trips_upserted += 1;
    }

    info!(statements = session.statements(), "session finished");
    Ok(summary)
}

fn enter(stage: Stage) {
    info!(stage = ?stage, "pipeline stage");
}
