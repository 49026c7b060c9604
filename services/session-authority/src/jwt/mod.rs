pub mod claims;
pub mod codec;
pub mod factory;

pub use claims::{
    AccessClaims, BaseClaims, RefreshClaims, Role, SessionClaims, SubjectId, TokenKind,
};
pub use codec::TokenCodec;
pub use factory::ClaimFactory;
