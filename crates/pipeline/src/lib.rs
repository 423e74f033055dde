pub mod admin;
pub mod backoff;
pub mod delivery;
pub mod escalation;
pub mod lock;
pub mod metrics;
pub mod processor;
pub mod queue;
pub mod retention;
pub mod store;
