pub mod catalog;
pub mod coordinator;
pub mod ingest;
pub mod reactor;
pub mod state;
