pub mod generator;
pub mod service;

pub use generator::RecoveryTokenGenerator;
pub use service::{RecoveryPolicy, RecoveryTokenService};
