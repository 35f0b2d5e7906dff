use std::fs::File;
use std::path::Path;

use polars::prelude::*;
use tracing::info;

use crate::error::{LoaderError, Result};

/// Reads a parquet trip file fully into memory.
pub fn load_trip_frame(path: &Path) -> Result<DataFrame> {
    let load_error = |message: String| LoaderError::Load {
        path: path.to_path_buf(),
        message,
    };

    let file = File::open(path).map_err(|err| load_error(err.to_string()))?;
    let frame = ParquetReader::new(file)
        .finish()
        .map_err(|err| load_error(err.to_string()))?;

    info!(
        path = %path.display(),
        rows = frame.height(),
        columns = frame.width(),
        "loaded trip file"
    );
    Ok(frame)
}
