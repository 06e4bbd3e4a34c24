//! Participant identities: wallet addresses, wallets and identity providers.
//!
//! The engine only ever sees an [`Address`]. It performs a weak shape check
//! (58 characters of RFC 4648 base32) and trusts the caller's identity
//! provider for everything else. [`Wallet`] is the reference provider:
//! an Ed25519 key pair whose address embeds the public key and a checksum.

pub mod address;
pub mod wallet;

pub use address::{Address, ADDRESS_LEN};
pub use wallet::{Wallet, WalletSummary};

/// Source of the identity acting in the current call.
pub trait IdentityProvider {
    /// The connected identity, or `None` when nobody is signed in.
    fn current_identity(&self) -> Option<Address>;
}

/// Identity provider that always answers with the same address.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(pub Option<Address>);

impl StaticIdentity {
    pub fn signed_in(address: Address) -> Self {
        Self(Some(address))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_identity(&self) -> Option<Address> {
        self.0.clone()
    }
}
