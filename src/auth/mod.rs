mod credentials;
mod token;

pub use credentials::ScmToken;
pub use token::{SECRET_LENGTH, SecretGenerator};
