pub mod etl;
pub mod records;

pub use crate::domain::ports::{Counted, Pipeline, Storage};
pub use crate::utils::error::Result;
pub use etl::EtlEngine;
