pub mod cli;
pub mod config;
pub mod observability;
pub mod plan_file;

pub use config::Config;
pub use plan_file::PlanFile;
