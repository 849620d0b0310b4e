pub mod claims;
pub mod errors;
pub mod signer;

pub use claims::ClaimParts;
pub use claims::TokenClaims;
pub use errors::TokenError;
pub use signer::TokenKind;
pub use signer::TokenLifetimes;
pub use signer::TokenSecrets;
pub use signer::TokenSigner;
