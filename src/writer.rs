//! CSV output of the ranked result

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Decimal128Array, RecordBatch, StringArray};
use arrow::csv::WriterBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;

use crate::error::{Error, Result};
use crate::ranker::NationRevenue;
use crate::revenue::OUTPUT_SCALE;

const REVENUE_PRECISION: u8 = 38;

/// Result rows as a `n_name: Utf8, revenue: Decimal128(38, 4)` batch
pub fn to_record_batch(results: &[NationRevenue]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("n_name", DataType::Utf8, false),
        Field::new(
            "revenue",
            DataType::Decimal128(REVENUE_PRECISION, OUTPUT_SCALE),
            false,
        ),
    ]));

    let names = StringArray::from_iter_values(results.iter().map(|r| r.nation.as_str()));
    let revenue =
        Decimal128Array::from_iter_values(results.iter().map(|r| r.revenue.to_output_raw()))
            .with_precision_and_scale(REVENUE_PRECISION, OUTPUT_SCALE)?;

    Ok(RecordBatch::try_new(
        schema,
        vec![Arc::new(names) as ArrayRef, Arc::new(revenue) as ArrayRef],
    )?)
}

/// Write `n_name,revenue` with a header row, revenue with 4 fractional digits
pub fn write_csv<W: Write>(out: W, results: &[NationRevenue]) -> Result<()> {
    let batch = to_record_batch(results)?;
    let mut writer = WriterBuilder::new().with_header(true).build(out);
    writer.write(&batch)?;
    writer.into_inner().flush().map_err(ArrowError::from)?;
    Ok(())
}

/// Write the result file at `path`
///
/// A failed write removes the partial file so no truncated result is left
/// behind.
pub fn write_results(path: &Path, results: &[NationRevenue]) -> Result<()> {
    let output_error = |source: Box<dyn std::error::Error + Send + Sync>| Error::Output {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(|e| output_error(e.into()))?;
    write_csv(BufWriter::new(file), results).map_err(|e| {
        let _ = fs::remove_file(path);
        output_error(e.into())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revenue::Revenue;

    /// `value` in ten-thousandths
    fn row(nation: &str, value: i128) -> NationRevenue {
        NationRevenue {
            nation: nation.to_string(),
            revenue: Revenue::from_raw(value * 100_000_000),
        }
    }

    fn render(results: &[NationRevenue]) -> String {
        let mut buf = Vec::new();
        write_csv(&mut buf, results).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_csv_layout() {
        let text = render(&[row("CHINA", 9_500_000), row("INDIA", 12_345), row("JAPAN", 0)]);
        assert_eq!(text, "n_name,revenue\nCHINA,950.0000\nINDIA,1.2345\nJAPAN,0.0000\n");
    }

    #[test]
    fn test_revenue_rounded_to_four_digits() {
        // 945.004725
        let exact = NationRevenue {
            nation: "CHINA".to_string(),
            revenue: Revenue::disc_price(1_000_005_000, 55_000),
        };
        assert_eq!(render(&[exact]), "n_name,revenue\nCHINA,945.0047\n");
    }

    /// Takes the first write, then fails on flush and every later write
    struct FailingSink {
        written: usize,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written > 0 {
                return Err(std::io::Error::other("disk full"));
            }
            self.written += buf.len();
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::Error::other("disk full"))
        }
    }

    #[test]
    fn test_sink_failure_is_reported() {
        let err = write_csv(FailingSink { written: 0 }, &[row("CHINA", 1)]).unwrap_err();
        assert!(matches!(err, Error::Arrow(_)));
    }

    #[test]
    fn test_empty_result_is_header_only() {
        assert_eq!(render(&[]), "n_name,revenue\n");
    }

    #[test]
    fn test_write_results_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("q5.csv");
        write_results(&path, &[row("VIETNAM", 55_060_000_000)]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "n_name,revenue\nVIETNAM,5506000.0000\n"
        );
    }

    #[test]
    fn test_unwritable_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("q5.csv");
        let err = write_results(&path, &[]).unwrap_err();
        assert!(matches!(err, Error::Output { .. }));
    }
}
