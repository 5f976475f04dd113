pub mod clients;
pub mod error;
pub mod notify;
pub mod pipeline;
pub mod publisher;
pub mod snapshot;
