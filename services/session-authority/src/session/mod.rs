pub mod issuer;

pub use issuer::{SessionIssuer, TokenPair, DEFAULT_ROLE};
