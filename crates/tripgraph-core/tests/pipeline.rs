use std::time::Duration;

use polars::df;
use polars::prelude::*;
use tokio::time::Instant;
use tripgraph_core::graph::MemoryStore;
use tripgraph_core::{
    load_frame, run_once, run_with_retry, LoadSummary, LoaderError, RetryError, RetryPolicy,
    ZoneFilter,
};

fn one_trip(pickup: i64, dropoff: i64) -> PolarsResult<DataFrame> {
    df!(
        "VendorID" => &[2i32],
        "tpep_pickup_datetime" => &["2022-03-01 08:00:00"],
        "tpep_dropoff_datetime" => &["2022-03-01 08:20:00"],
        "passenger_count" => &[1.0f64],
        "trip_distance" => &[5.0f64],
        "PULocationID" => &[pickup],
        "DOLocationID" => &[dropoff],
        "fare_amount" => &[10.0f64],
    )
}

fn write_parquet(frame: &mut DataFrame) -> anyhow::Result<tempfile::NamedTempFile> {
    let mut file = tempfile::NamedTempFile::new()?;
    ParquetWriter::new(file.as_file_mut()).finish(frame)?;
    Ok(file)
}

#[tokio::test]
async fn bronx_trip_creates_two_locations_and_one_edge() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let summary = load_frame(&store, &one_trip(3, 18)?, ZoneFilter::bronx()).await?;

    assert_eq!(
        summary,
        LoadSummary {
            rows_read: 1,
            trips_retained: 1,
            locations_upserted: 2,
            trips_upserted: 1,
        }
    );

    let graph = store.snapshot().await;
    assert_eq!(graph.locations.into_iter().collect::<Vec<_>>(), vec![3, 18]);
    assert_eq!(graph.trips.len(), 1);

    let edge = &graph.trips[0];
    assert_eq!((edge.from, edge.to), (3, 18));
    assert_eq!((edge.distance, edge.fare), (5.0, 10.0));
    assert_eq!(edge.pickup_dt.to_string(), "2022-03-01 08:00:00");
    assert_eq!(edge.dropoff_dt.to_string(), "2022-03-01 08:20:00");
    assert_eq!(store.connections_closed().await, 1);
    Ok(())
}

#[tokio::test]
async fn trip_from_outside_the_borough_writes_nothing() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    let summary = load_frame(&store, &one_trip(1, 18)?, ZoneFilter::bronx()).await?;

    assert_eq!(summary.trips_retained, 0);
    let graph = store.snapshot().await;
    assert!(graph.locations.is_empty());
    assert!(graph.trips.is_empty());
    assert_eq!(store.statements_run().await, 0);
    Ok(())
}

#[tokio::test]
async fn shared_zones_are_upserted_once_per_run() -> anyhow::Result<()> {
    let frame = df!(
        "tpep_pickup_datetime" => &["2022-03-01 08:00:00", "2022-03-01 09:00:00", "2022-03-01 10:00:00"],
        "tpep_dropoff_datetime" => &["2022-03-01 08:20:00", "2022-03-01 09:20:00", "2022-03-01 10:20:00"],
        "PULocationID" => &[3i64, 18, 20],
        "DOLocationID" => &[18i64, 3, 3],
        "trip_distance" => &[5.0f64, 4.0, 3.0],
        "fare_amount" => &[10.0f64, 9.0, 8.0],
    )?;

    let store = MemoryStore::new();
    let summary = load_frame(&store, &frame, ZoneFilter::bronx()).await?;

    assert_eq!(summary.locations_upserted, 3);
    assert_eq!(summary.trips_upserted, 3);
    assert_eq!(store.statements_run().await, 6);
    Ok(())
}

#[tokio::test]
async fn connection_is_closed_when_the_source_is_missing() {
    let store = MemoryStore::new();
    let dir = tempfile::tempdir().unwrap();

    let err = run_once(&store, &dir.path().join("missing.parquet"), ZoneFilter::bronx())
        .await
        .unwrap_err();

    assert!(matches!(err, LoaderError::Load { .. }));
    assert_eq!(store.connect_attempts().await, 1);
    assert_eq!(store.connections_closed().await, 1);
}

#[tokio::test]
async fn connection_is_closed_when_a_write_fails() -> anyhow::Result<()> {
    let store = MemoryStore::new();
    store.fail_statement(3).await;

    let err = load_frame(&store, &one_trip(3, 18)?, ZoneFilter::bronx())
        .await
        .unwrap_err();

    assert!(matches!(err, LoaderError::Store(_)));
    assert_eq!(store.connections_closed().await, 1);
    // Node writes that landed before the failure stay in the store.
    assert_eq!(store.snapshot().await.locations.len(), 2);
    Ok(())
}

#[tokio::test]
async fn schema_errors_surface_before_any_write() -> anyhow::Result<()> {
    let frame = one_trip(3, 18)?.drop("fare_amount")?;
    let store = MemoryStore::new();

    let err = load_frame(&store, &frame, ZoneFilter::bronx()).await.unwrap_err();

    assert!(matches!(err, LoaderError::Schema { ref missing } if missing == &["fare_amount"]));
    assert_eq!(store.statements_run().await, 0);
    assert_eq!(store.connections_closed().await, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn store_refusing_three_connections_is_loaded_on_the_fourth() -> anyhow::Result<()> {
    let file = write_parquet(&mut one_trip(3, 18)?)?;
    let store = MemoryStore::new();
    store.refuse_connections(3).await;

    let started = Instant::now();
    let summary = run_with_retry(
        &store,
        file.path(),
        ZoneFilter::bronx(),
        &RetryPolicy::default(),
    )
    .await?;

    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(30) && waited < Duration::from_secs(31));
    assert_eq!(store.connect_attempts().await, 4);
    assert_eq!(store.connections_closed().await, 1);
    // two locations and one trip, written exactly once
    assert_eq!(store.statements_run().await, 3);
    assert_eq!(summary.trips_upserted, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn retry_after_partial_write_converges_on_the_same_graph() -> anyhow::Result<()> {
    let file = write_parquet(&mut one_trip(3, 18)?)?;
    let store = MemoryStore::new();
    store.fail_statement(3).await;

    run_with_retry(&store, file.path(), ZoneFilter::bronx(), &RetryPolicy::default()).await?;

    let graph = store.snapshot().await;
    assert_eq!(graph.locations.len(), 2);
    assert_eq!(graph.trips.len(), 1);
    assert_eq!(store.connect_attempts().await, 2);
    assert_eq!(store.connections_closed().await, 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn unreachable_store_exhausts_all_attempts() {
    let store = MemoryStore::new();
    store.refuse_connections(usize::MAX).await;
    let dir = tempfile::tempdir().unwrap();

    let err = run_with_retry(
        &store,
        &dir.path().join("trips.parquet"),
        ZoneFilter::bronx(),
        &RetryPolicy::default(),
    )
    .await
    .unwrap_err();

    let RetryError::Exhausted {
        attempts,
        last_error,
    } = err;
    assert_eq!(attempts, 10);
    assert!(matches!(last_error, LoaderError::Connectivity { .. }));
    assert_eq!(store.connect_attempts().await, 10);
    assert_eq!(store.connections_closed().await, 0);
}
