//! Export the aligned monthly set to CSV.
//!
//! One row per timeline month, one column per series. Months without a value
//! (before a series' first observation) are left empty so spreadsheets read
//! them as blanks rather than zeros.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::AppError;
use crate::resample::AlignedSet;

/// Write the aligned set as `date,<id>,<id>,...` rows.
pub fn write_aligned_csv(path: &Path, aligned: &AlignedSet) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut out = BufWriter::new(file);

    write_aligned(&mut out, aligned)
        .and_then(|_| out.flush())
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV '{}': {e}", path.display())))?;

    info!(path = %path.display(), rows = aligned.timeline().len(), "wrote aligned CSV");
    Ok(())
}

fn write_aligned(out: &mut impl Write, aligned: &AlignedSet) -> std::io::Result<()> {
    let mut header = String::from("date");
    for id in aligned.ids() {
        header.push(',');
        header.push_str(id);
    }
    writeln!(out, "{header}")?;

    for (i, month) in aligned.timeline().months().iter().enumerate() {
        let mut row = month.format("%Y-%m-%d").to_string();
        for series in aligned.iter() {
            row.push(',');
            if let Some(v) = series.points.get(i).and_then(|p| p.value) {
                row.push_str(&format!("{v:.4}"));
            }
        }
        writeln!(out, "{row}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use crate::domain::RawSeries;
    use crate::resample::align;

    fn m(y: i32, mo: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, mo, 1).unwrap()
    }

    #[test]
    fn csv_leaves_missing_months_blank() {
        let aligned = align(&[
            RawSeries::from_pairs("FEDFUNDS", [(m(2024, 1), 5.33), (m(2024, 2), 5.33), (m(2024, 3), 5.25)]),
            RawSeries::from_pairs("DRCCLACBS", [(m(2024, 2), 3.1)]),
        ])
        .unwrap();

        let mut buf = Vec::new();
        write_aligned(&mut buf, &aligned).unwrap();
        let expected = concat!(
            "date,FEDFUNDS,DRCCLACBS\n",
            "2024-01-01,5.3300,\n",
            "2024-02-01,5.3300,3.1000\n",
            "2024-03-01,5.2500,3.1000\n",
        );
        assert_eq!(String::from_utf8(buf).unwrap(), expected);
    }

    #[test]
    fn unwritable_path_is_a_usage_error() {
        let aligned = align(&[RawSeries::empty("FEDFUNDS")]).unwrap();
        let err = write_aligned_csv(Path::new("/nonexistent-dir/aligned.csv"), &aligned).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
