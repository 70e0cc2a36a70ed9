//! FILENAME: app/report-session/src/lib.rs
//! Report builder session.
//!
//! Owns one user's view state on top of `report-engine` and talks to the
//! outside world through small seams: a record source, a column state store,
//! an async dimension lookup and a report sink.

pub mod logging;
pub mod config;
pub mod error;
pub mod store;
pub mod source;
pub mod lookup;
pub mod sink;
pub mod session;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use lookup::{DimensionLookup, OptionCache, OptionLoad, StaticLookup};
pub use session::{ReportSession, SaveForm};
pub use sink::{MemorySink, ReportSink, SinkError};
pub use source::{RecordSource, SalesDemoSource, StaticSource, DEMO_CATEGORIES, DEMO_STATES};
pub use store::{ColumnStateStore, JsonFileStore, MemoryStore};

/// Option lookup for the sales demo schema.
pub fn demo_lookup(config: &SessionConfig) -> StaticLookup {
    StaticLookup::new(config.option_latency())
        .with_values("state", &DEMO_STATES)
        .with_values("category", &DEMO_CATEGORIES)
}
