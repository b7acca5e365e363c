//! HTTP client for the upstream options reference-data API.

mod rest;

pub use rest::{ContractsClient, ContractsResponse};
