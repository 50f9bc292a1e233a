pub mod cache;
pub mod error;
pub mod history;
pub mod metrics;
pub mod preprocess;
pub mod selector;
pub mod state;
pub mod store;
