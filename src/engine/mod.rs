mod contract;
mod local;
pub mod metrics;
#[cfg(test)]
mod tests;

pub use contract::{Dependencies, QueryEngine};
pub use local::{LocalQueryEngine, QUERY_NODE_ROLE};
