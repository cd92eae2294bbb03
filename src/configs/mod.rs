pub mod base;
pub mod logging;
pub mod services;

pub use base::*;
pub use logging::*;
pub use services::*;
