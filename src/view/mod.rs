//! View module - toggle state and row/column selection

mod selector;
mod toggles;

pub use selector::{ColumnGate, ColumnGroup, FilteredView, ViewSelector, ViewSpec};
pub use toggles::{Season, ToggleState, UnitMode, ViewMode};
