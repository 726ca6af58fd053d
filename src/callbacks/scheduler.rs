use crate::callbacks::{Callback, Control, EpochContext};
use crate::error::Result;

/// Replaces the learning rate with `schedule(current)` after every epoch.
pub struct LearningRateScheduler {
    schedule: Box<dyn Fn(f64) -> f64 + Send>,
}

impl LearningRateScheduler {
    pub fn new(schedule: impl Fn(f64) -> f64 + Send + 'static) -> LearningRateScheduler {
        LearningRateScheduler { schedule: Box::new(schedule) }
    }

    pub fn apply(&self, lr: f64) -> f64 {
        (self.schedule)(lr)
    }
}

impl Callback for LearningRateScheduler {
    fn name(&self) -> &str {
        "lr_scheduler"
    }

    fn on_epoch_end(&mut self, ctx: &EpochContext<'_>) -> Result<Control> {
        Ok(Control::set_learning_rate(self.apply(ctx.learning_rate)))
    }
}
