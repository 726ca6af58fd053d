use tracing::info;

use crate::callbacks::{Callback, Control, EpochContext, Mode, PlateauWindow};
use crate::error::{NnError, Result};

/// Scales the learning rate by `factor` whenever the monitored series trips
/// its window. A result below `minimum_lr` is replaced by `minimum_lr * 100`,
/// and from then on that recovered rate is the floor.
pub struct ReduceLearningRateOnPlateau {
    window: PlateauWindow,
    factor: f64,
    minimum_lr: f64,
    reducing: bool,
    floor_recovered: bool,
}

impl ReduceLearningRateOnPlateau {
    pub fn new(
        monitor: impl Into<String>,
        patience: usize,
        at: usize,
        min_delta: f64,
        mode: Mode,
        factor: f64,
        minimum_lr: f64,
    ) -> Result<ReduceLearningRateOnPlateau> {
        let window = PlateauWindow::new(monitor, patience, at, min_delta, mode)?;
        ReduceLearningRateOnPlateau::from_window(window, factor, minimum_lr)
    }

    pub fn from_window(window: PlateauWindow, factor: f64, minimum_lr: f64) -> Result<ReduceLearningRateOnPlateau> {
        if !(factor > 0.0 && factor.is_finite()) {
            return Err(NnError::InvalidConfig(format!("factor must be positive, got {factor}")));
        }
        if !(minimum_lr >= 0.0 && minimum_lr.is_finite()) {
            return Err(NnError::InvalidConfig(format!(
                "minimum learning rate must be non-negative, got {minimum_lr}"
            )));
        }
        Ok(ReduceLearningRateOnPlateau {
            window,
            factor,
            minimum_lr,
            reducing: false,
            floor_recovered: false,
        })
    }

    /// Whether a reduction has happened at least once.
    pub fn is_reducing(&self) -> bool {
        self.reducing
    }

    /// Whether a floor breach has been corrected.
    pub fn floor_recovered(&self) -> bool {
        self.floor_recovered
    }

    /// The rate that follows `lr` after one reduction.
    pub fn reduced(&mut self, lr: f64) -> f64 {
        let next = lr * self.factor;
        let recovered = self.minimum_lr * 100.0;
        let floor = if self.floor_recovered { recovered } else { self.minimum_lr };
        if next < floor {
            self.floor_recovered = true;
            recovered
        } else {
            next
        }
    }
}

impl Callback for ReduceLearningRateOnPlateau {
    fn name(&self) -> &str {
        "reduce_lr_on_plateau"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        if !self.window.triggered(ctx.history)? {
            return Ok(Control::proceed());
        }
        self.reducing = true;
        let lr = self.reduced(ctx.learning_rate);
        info!(epoch = ctx.epoch, from = ctx.learning_rate, to = lr, "reducing learning rate");
        Ok(Control::set_learning_rate(lr))
    }
}
