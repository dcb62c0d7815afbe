pub mod client;
pub mod error;
pub mod fields;
pub mod models;
pub mod normalize;
pub mod report;
pub mod retry;
pub mod search;

pub use client::{Auth, JiraClient, JiraConfig};
pub use error::Error;
pub use models::*;

// Field resolver re-exports
pub use fields::{FieldResolver, ResolvedField, ResolvedFields};

// Search re-exports
pub use search::{SearchOutcome, SearchService};

// Retry policy re-export
pub use retry::RetryPolicy;

// Normalizer re-exports
pub use normalize::{NormalizedValue, map_search_page, normalize_value};

// Report building re-exports
pub use report::{
    build_count_tables, build_report, field_header, resolve_output_columns,
    resolve_requested_fields,
};
