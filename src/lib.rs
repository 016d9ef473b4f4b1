pub mod ndc;
pub mod rxnav;
pub mod eligibility;
pub mod server;
pub mod service;
pub mod config;
pub mod error;
pub mod utils;

pub use error::{Result, DrugError};
pub use config::Config;
pub use service::{Bootstrap, DrugService};
