pub mod credentials;
pub mod error;
pub mod output_macros;

pub use credentials::generate_password;
pub use error::{Result, SlicerError};
