pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod features;
pub mod model;
pub mod utils;

pub use crate::adapters::{LocalStorage, Sources};
pub use crate::app::{run_stage, Stage};
pub use crate::config::AppConfig;
pub use crate::core::EtlEngine;
pub use crate::utils::error::{PipelineError, Result};
