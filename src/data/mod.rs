//! Data module - CSV loading, normalization and load bookkeeping

pub mod annotation;
pub mod catalog;
mod loader;
mod processor;
pub mod record;
pub mod store;

pub use annotation::Band;
pub use catalog::{ChartKind, DatasetId, DatasetSpec};
pub use loader::LoaderError;
pub use processor::{DEFAULT_PLACEHOLDER, YOY_SUFFIX};
pub use record::{Dataset, Period, Record};
pub use store::{DatasetStore, LoadSlot, LoadStatus, LoadTicket};
