use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::callbacks::{read_records, Callback, Control, EpochContext};
use crate::error::{NnError, Result};

/// Appends one `epoch,name,value` record per metric per epoch.
///
/// The file is created (or truncated) when the callback is built and stays
/// open until the callback is dropped or closed.
pub struct History {
    path: PathBuf,
    out: BufWriter<File>,
}

impl History {
    pub fn new(path: impl Into<PathBuf>) -> Result<History> {
        let path = path.into();
        let file = File::create(&path).map_err(|e| NnError::io(&path, e))?;
        Ok(History { path, out: BufWriter::new(file) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read_to_strings(&mut self) -> Result<Vec<String>> {
        self.out.flush().map_err(|e| NnError::io(&self.path, e))?;
        read_records(&self.path)
    }

    pub fn close(mut self) -> Result<()> {
        self.out.flush().map_err(|e| NnError::io(&self.path, e))
    }
}

impl Callback for History {
    fn name(&self) -> &str {
        "history"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        for (name, value) in ctx.epoch_metrics {
            writeln!(self.out, "{},{},{:.6}", ctx.epoch, name, value)
                .map_err(|e| NnError::io(&self.path, e))?;
        }
        self.out.flush().map_err(|e| NnError::io(&self.path, e))?;
        Ok(Control::proceed())
    }
}
