//! Trigger components that decide when a run is launched and with what
//! configuration: a cron scheduler and a polling storage sensor.

mod schedule;
mod sensor;

pub use schedule::CronScheduler;
pub use sensor::{PollingSensor, SensorEvaluation};
