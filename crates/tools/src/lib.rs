//! Tool surface for the Crabdesk agent.
//!
//! The catalog describes the four callable actions — knowledge search,
//! ticket creation, external fetch, direct reply — and the fetcher
//! implements the one tool that leaves the process boundary, under a
//! restricted URL policy with a bounded timeout.

pub mod catalog;
pub mod fetch;

pub use catalog::standard_catalog;
pub use fetch::HttpFetcher;
