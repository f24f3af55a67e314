pub mod food;
pub mod profile;
pub mod recipe;

pub use food::*;
pub use profile::*;
pub use recipe::*;
