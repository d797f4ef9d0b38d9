mod docker;
mod legacy;
mod models;

pub use docker::*;
pub use legacy::*;
pub use models::*;
