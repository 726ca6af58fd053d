use std::str::FromStr;

use tracing::info;

use crate::callbacks::{Callback, Control, EpochContext, MetricHistory};
use crate::error::{NnError, Result};

/// Direction of the windowed comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Trigger when the forward difference drops below `min_delta`.
    Min,
    /// Trigger when the forward difference exceeds `min_delta`.
    Max,
    /// Trigger on either.
    Auto,
}

impl FromStr for Mode {
    type Err = NnError;

    fn from_str(s: &str) -> Result<Mode> {
        match s {
            "min" => Ok(Mode::Min),
            "max" => Ok(Mode::Max),
            "auto" => Ok(Mode::Auto),
            other => Err(NnError::InvalidConfig(format!(
                "mode must be one of min, max, auto; got {other:?}"
            ))),
        }
    }
}

/// Sliding comparison over the last `at` values of a monitored series.
///
/// For every offset `j` in the window the forward difference
/// `v[j + patience] - v[j]` is tested against `min_delta` under `mode`.
#[derive(Debug, Clone, PartialEq)]
pub struct PlateauWindow {
    monitor: String,
    patience: usize,
    at: usize,
    min_delta: f64,
    mode: Mode,
}

impl PlateauWindow {
    pub fn new(monitor: impl Into<String>, patience: usize, at: usize, min_delta: f64, mode: Mode) -> Result<PlateauWindow> {
        if patience == 0 || patience >= at {
            return Err(NnError::InvalidConfig(format!(
                "need 0 < patience < at, got patience {patience} and at {at}"
            )));
        }
        if !min_delta.is_finite() {
            return Err(NnError::InvalidConfig("min_delta must be finite".into()));
        }
        Ok(PlateauWindow { monitor: monitor.into(), patience, at, min_delta, mode })
    }

    pub fn monitor(&self) -> &str {
        &self.monitor
    }

    /// `false` until the series holds at least `at` values.
    pub fn triggered(&self, history: &MetricHistory) -> Result<bool> {
        let series = history.get(&self.monitor).ok_or_else(|| {
            NnError::InvalidConfig(format!("no recorded series named {:?}", self.monitor))
        })?;
        if series.len() < self.at {
            return Ok(false);
        }
        let window = &series[series.len() - self.at..];
        Ok(window.windows(self.patience + 1).any(|w| {
            let forward = w[self.patience] - w[0];
            match self.mode {
                Mode::Min => forward < self.min_delta,
                Mode::Max => forward > self.min_delta,
                Mode::Auto => forward < self.min_delta || forward > self.min_delta,
            }
        }))
    }
}

/// Stops training once the monitored series trips its window.
pub struct EarlyStopper {
    window: PlateauWindow,
    stopped_epoch: Option<usize>,
}

impl EarlyStopper {
    pub fn new(monitor: impl Into<String>, patience: usize, at: usize, min_delta: f64, mode: Mode) -> Result<EarlyStopper> {
        Ok(EarlyStopper::from_window(PlateauWindow::new(monitor, patience, at, min_delta, mode)?))
    }

    pub fn from_window(window: PlateauWindow) -> EarlyStopper {
        EarlyStopper { window, stopped_epoch: None }
    }

    /// Epoch at which the stopper fired, if it has.
    pub fn stopped_epoch(&self) -> Option<usize> {
        self.stopped_epoch
    }
}

impl Callback for EarlyStopper {
    fn name(&self) -> &str {
        "early_stopping"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        if !self.window.triggered(ctx.history)? {
            return Ok(Control::proceed());
        }
        info!(epoch = ctx.epoch, monitor = self.window.monitor(), "early stopping");
        self.stopped_epoch = Some(ctx.epoch);
        Ok(Control::stop())
    }
}
