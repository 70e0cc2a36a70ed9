//! FILENAME: core/report-engine/src/lib.rs
//! Tabular report engine.
//!
//! This crate turns a raw record set plus a small set of user-editable view
//! parameters (filters, grouping, aggregation, sort) into render-ready rows,
//! a summary row and a list of removable "active setting" chips. It has no
//! I/O and no logging; the session crate owns state and collaborators.
//!
//! Layers:
//! - `definition`: Schema, records and the editable report state (what the report IS)
//! - `filter`: Predicate evaluation over the filter set
//! - `aggregate`: Accumulators and per-measure reductions
//! - `engine`: Sorting, grouping and the full pipeline (HOW we calculate)
//! - `view`: Renderable output (WHAT we display)
//! - `chips`: Derived active-setting badges
//! - `editor`: Per-field filter editors
//! - `packed`: Filter values packed into transport keys
//! - `report`: Serializable report definition (the saved snapshot)

pub mod definition;
pub mod error;
pub mod filter;
pub mod aggregate;
pub mod engine;
pub mod view;
pub mod chips;
pub mod editor;
pub mod packed;
pub mod report;

pub use definition::*;
pub use error::ReportError;
pub use filter::{apply_filters, field_matches, record_matches};
pub use aggregate::{aggregate_records, AggregateAccumulator, AggregateValues};
pub use engine::{
    calculate_report, compute_summary_row, group_records, sort_records,
    GROUP_KEY_SEPARATOR,
};
pub use view::*;
pub use chips::{clear_all, remove_chip, synthesize_chips, Chip, ChipKind};
pub use editor::{
    DateRangeEditor, EditorModel, FilterEditor, FilterPatch, NumberRangeEditor,
    ValueListEditor,
};
pub use report::{ReportDefinition, ReportMeta, SaveMode, SorterWire, WireDateRange, WireFilter};
