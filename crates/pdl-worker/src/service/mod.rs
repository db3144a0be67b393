//! Worker state, configuration and the Postgres-backed result store.

mod config;
mod state;
mod store;

pub use config::WorkerConfig;
pub use state::WorkerState;
pub use store::PgResultStore;
