//! Catalog query pipeline.
//!
//! Turns optional listing parameters (sort, direction, category, q) into a
//! compiled SQL query plus the display metadata the templates need. The
//! pipeline is split in three:
//! - `types`: typed request parameters, predicates, ordering, and the
//!   selection outcome (proceed vs. abort-with-message),
//! - `query`: the accumulating builder compiled via SeaQuery,
//! - `service`: execution against PostgreSQL and active-filter resolution.

mod query;
mod service;
mod types;

pub use query::CatalogQuery;
pub use service::{CatalogOutcome, CatalogPage, CatalogService, Pager};
pub use types::{
    CatalogParams, CatalogSelection, Ordering, Predicate, Selection, SelectionAbort,
    SortDirection, SortKey, interpret_params,
};
