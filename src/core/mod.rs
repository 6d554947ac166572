pub mod config;
pub mod extractor;
pub mod staging;
pub mod store;
pub mod committer;
pub mod ingest;
