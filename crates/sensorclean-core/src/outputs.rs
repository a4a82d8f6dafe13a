use std::fs::File;
use std::io::Write;
use std::path::Path;

use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;

use crate::error::Result;
use crate::types::CleanedSample;

/// Writes `_time,cleaned` rows. Missing values become empty fields.
pub fn write_csv<W: Write>(writer: W, samples: &[CleanedSample]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    if samples.is_empty() {
        writer.write_record(["_time", "cleaned"])?;
    }
    for sample in samples {
        writer.serialize(sample)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(mut writer: W, samples: &[CleanedSample]) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, samples)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

/// Stage diagnostics export, see [`crate::StageOutputs::to_dataframe`].
pub fn write_parquet(path: impl AsRef<Path>, df: &DataFrame) -> Result<()> {
    let mut file = File::create(path.as_ref())?;
    let mut clone = df.clone();
    ParquetWriter::new(&mut file)
        .with_compression(ParquetCompression::Zstd(None))
        .with_statistics(StatisticsOptions::default())
        .finish(&mut clone)?;
    Ok(())
}
