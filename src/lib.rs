pub mod analysis;
pub mod config;
pub mod feed;
pub mod ledger;
pub mod pipeline;
pub mod publisher;
pub mod sanitize;
