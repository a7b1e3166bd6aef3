pub mod error;

pub use error::{DiskmonError, Result};
