//! OCR provider client and its configuration.

mod adv_client;
mod adv_config;

pub use adv_client::AdvClient;
pub use adv_config::AdvConfig;
