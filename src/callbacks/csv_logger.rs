use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::callbacks::{Callback, Control, EpochContext};
use crate::data::csv::quote_csv_field;
use crate::error::{NnError, Result};

/// Writes the training log as CSV: a header taken from the first epoch's
/// metric names, then one row per epoch. Numbers use six decimals.
pub struct CsvLogger {
    path: PathBuf,
    out: BufWriter<File>,
    columns: Option<Vec<String>>,
}

impl CsvLogger {
    pub fn new(path: impl Into<PathBuf>) -> Result<CsvLogger> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| NnError::io(&path, e))?;
        Ok(CsvLogger { path, out: BufWriter::new(file), columns: None })
    }
}

impl Callback for CsvLogger {
    fn name(&self) -> &str {
        "csv_logger"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        let io_err = |e| NnError::io(&self.path, e);
        if self.columns.is_none() {
            let names: Vec<String> = ctx.epoch_metrics.keys().cloned().collect();
            let header: Vec<String> = names.iter().map(|n| quote_csv_field(n)).collect();
            writeln!(self.out, "epoch,learning_rate,{}", header.join(",")).map_err(io_err)?;
            self.columns = Some(names);
        }
        let columns = self.columns.as_deref().unwrap_or_default();
        let values: Vec<String> = columns.iter()
            .map(|c| ctx.epoch_metrics.get(c).map(|v| format!("{v:.6}")).unwrap_or_default())
            .collect();
        writeln!(self.out, "{},{:.6},{}", ctx.epoch, ctx.learning_rate, values.join(",")).map_err(io_err)?;
        self.out.flush().map_err(io_err)?;
        Ok(Control::proceed())
    }
}
