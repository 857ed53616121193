//! Domain records flowing through the pipeline.

mod stock;

pub use stock::{Aggregation, Stock};
