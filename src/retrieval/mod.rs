//! Query-time retrieval filtering

pub mod funnel;

pub use funnel::{citations, select_context};
