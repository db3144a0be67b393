//! Input selection.

use std::path::PathBuf;

use clap::Args;
use pdl_core::source::DEFAULT_STORAGE_URL_PREFIX;
use pdl_worker::Stage;
use serde::{Deserialize, Serialize};

/// Which stage to run and over which spreadsheet.
#[derive(Debug, Clone, Args, Serialize, Deserialize)]
pub struct InputConfig {
    /// Pipeline stage: `download` (or `1`), `recognize` (or `2`).
    #[arg(long, env = "PDL_STAGE", value_enum)]
    pub stage: Stage,

    /// Spreadsheet of customer records; the first row is a header.
    #[arg(long = "data", env = "PDL_DATA", default_value = "excel/pan_all.xlsx")]
    pub data: PathBuf,

    /// URL prefix stripped from storage paths in the spreadsheet.
    #[arg(
        long = "storage-url-prefix",
        env = "PDL_STORAGE_URL_PREFIX",
        default_value = DEFAULT_STORAGE_URL_PREFIX
    )]
    pub storage_url_prefix: String,
}
