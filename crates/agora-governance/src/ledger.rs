//! Identity and weight ledger.
//!
//! Holds the attested balance of every verified participant, the
//! one-level delegation forest, and the set of identity hashes that have
//! already been attested. Attestations are signed off-chain by an admin
//! over [`attestation_digest`].

use std::collections::HashMap;

use agora_crypto::{hash_with_domain, Keypair};
use agora_types::{Address, Ed25519PublicKey, Ed25519Signature, Hash};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authority::SharedAuthority;
use crate::error::{GovernanceError, Result};
use crate::events::GovernanceEvent;
use crate::round::WeightProvider;
use crate::Weight;

/// Per-address ledger entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Balance vouched for by an admin
    pub attested_balance: Weight,
    /// Identity hash consumed by the attestation
    pub email_hash: Option<Hash>,
    /// Account that received this account's weight
    pub delegated_to: Option<Address>,
    /// Whether this address may sign attestations
    pub is_admin: bool,
    /// Whether an attestation was recorded
    pub is_verified: bool,
}

/// Admin signature over an attestation digest.
///
/// Ed25519 cannot recover a public key from a signature, so the signer's
/// key travels with the signature and the ledger derives its address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attestation {
    /// Public key of the signing admin
    pub signer: Ed25519PublicKey,
    /// Signature over the attestation digest
    pub signature: Ed25519Signature,
}

impl Attestation {
    /// Sign `digest` with an admin key.
    pub fn sign(admin: &Keypair, digest: &Hash) -> Self {
        Self {
            signer: admin.public_key(),
            signature: admin.sign_digest(digest),
        }
    }

    /// Address of the key that produced this attestation, if the signature
    /// over `digest` is valid.
    pub fn recover(&self, digest: &Hash) -> Result<Address> {
        agora_crypto::ed25519_verify(&self.signer, digest.as_bytes(), &self.signature)?;
        Ok(self.signer.to_address())
    }
}

/// Digest an admin signs to attest `balance` for `subject`.
///
/// Layout: `subject (20) || balance as u128 big-endian (16) || email_hash (32)`,
/// hashed under the ledger's domain separator.
pub fn attestation_digest(domain: &str, subject: &Address, balance: Weight, email_hash: &Hash) -> Hash {
    let mut payload = [0u8; 68];
    payload[..20].copy_from_slice(subject.as_bytes());
    payload[20..36].copy_from_slice(&balance.to_be_bytes());
    payload[36..].copy_from_slice(email_hash.as_bytes());
    hash_with_domain(&payload, domain)
}

/// Answers "has this address voted in the round that currently gates
/// delegation for `factory`?".
pub trait VoteStatusProvider {
    fn has_voted_in_active_round(&self, factory: &Address, voter: &Address) -> Result<bool>;
}

/// Provider for a ledger that is not bound to any factory yet.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRounds;

impl VoteStatusProvider for NoRounds {
    fn has_voted_in_active_round(&self, _factory: &Address, _voter: &Address) -> Result<bool> {
        Ok(false)
    }
}

/// Attested balances, delegations and admin keys.
#[derive(Debug, Clone)]
pub struct IdentityLedger {
    /// Contract address of this ledger
    address: Address,
    /// Owner check for admin and factory settings
    authority: SharedAuthority,
    /// Domain every attestation digest is hashed under
    domain_separator: String,
    accounts: HashMap<Address, Account>,
    /// email hash -> account that consumed it
    attested_emails: HashMap<Hash, Address>,
    /// delegate -> delegators (reverse lookup)
    delegators: HashMap<Address, Vec<Address>>,
    /// Factory whose active round gates delegation
    round_factory: Option<Address>,
}

impl IdentityLedger {
    /// Create an empty ledger at `address`.
    pub fn new(address: Address, authority: SharedAuthority, domain_separator: impl Into<String>) -> Self {
        Self {
            address,
            authority,
            domain_separator: domain_separator.into(),
            accounts: HashMap::new(),
            attested_emails: HashMap::new(),
            delegators: HashMap::new(),
            round_factory: None,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn domain_separator(&self) -> &str {
        &self.domain_separator
    }

    pub fn round_factory(&self) -> Option<Address> {
        self.round_factory
    }

    /// Toggle the admin flag of `address`. Authority-only.
    pub fn set_admin(&mut self, caller: Address, address: Address, is_admin: bool) -> Result<()> {
        self.authority.ensure(&caller)?;
        self.accounts.entry(address).or_default().is_admin = is_admin;
        info!(admin = %address, is_admin, "Admin flag updated");
        Ok(())
    }

    /// Bind the factory whose active round gates delegation. Authority-only.
    pub fn set_round_factory(&mut self, caller: Address, factory: Address) -> Result<()> {
        self.authority.ensure(&caller)?;
        self.round_factory = Some(factory);
        info!(factory = %factory, "Round factory bound");
        Ok(())
    }

    /// Digest for `subject` under this ledger's domain separator.
    pub fn attestation_digest(&self, subject: &Address, balance: Weight, email_hash: &Hash) -> Hash {
        attestation_digest(&self.domain_separator, subject, balance, email_hash)
    }

    /// Record an admin-signed attestation of `balance` for `caller`.
    pub fn attest(
        &mut self,
        caller: Address,
        balance: Weight,
        attestation: &Attestation,
        email_hash: Hash,
    ) -> Result<GovernanceEvent> {
        let digest = self.attestation_digest(&caller, balance, &email_hash);
        let signer = attestation.recover(&digest)?;
        if !self.is_admin(&signer) {
            debug!(signer = %signer, "Attestation signed by non-admin");
            return Err(GovernanceError::InvalidSignature);
        }

        if self.attested_emails.contains_key(&email_hash) {
            return Err(GovernanceError::EmailAlreadyAttested(email_hash));
        }

        if self.is_verified(&caller) {
            return Err(GovernanceError::AddressAlreadyAttested);
        }

        let account = self.accounts.entry(caller).or_default();
        account.attested_balance = balance;
        account.email_hash = Some(email_hash);
        account.is_verified = true;
        self.attested_emails.insert(email_hash, caller);

        info!(account = %caller, balance, signer = %signer, "Balance attested");
        Ok(GovernanceEvent::Attested {
            ledger: self.address,
            account: caller,
            balance,
            email_hash,
        })
    }

    /// Own attested balance plus the balance of every direct delegator.
    pub fn current_weight(&self, address: &Address) -> Result<Weight> {
        let own = self.account(address).map(|a| a.attested_balance).unwrap_or(0);
        self.delegators_of(address)
            .iter()
            .filter_map(|d| self.account(d))
            .try_fold(own, |total, a| total.checked_add(a.attested_balance))
            .ok_or(GovernanceError::WeightOverflow)
    }

    /// Delegate the caller's weight to `target`.
    ///
    /// The forest stays at depth one: an account that has received
    /// delegations can no longer delegate, and nobody can delegate to an
    /// account that has delegated.
    pub fn delegate(
        &mut self,
        caller: Address,
        target: Address,
        rounds: &dyn VoteStatusProvider,
    ) -> Result<GovernanceEvent> {
        if caller == target {
            return Err(GovernanceError::SelfDelegation);
        }
        if !self.is_verified(&caller) {
            return Err(GovernanceError::CallerNotVerified);
        }
        if !self.is_verified(&target) {
            return Err(GovernanceError::TargetNotVerified);
        }
        if self.has_delegated(&caller) || !self.delegators_of(&caller).is_empty() {
            return Err(GovernanceError::CallerAlreadyDelegated);
        }
        if self.has_delegated(&target) {
            return Err(GovernanceError::TargetAlreadyDelegated);
        }

        if let Some(factory) = self.round_factory {
            if rounds.has_voted_in_active_round(&factory, &caller)? {
                return Err(GovernanceError::CallerAlreadyVoted);
            }
            if rounds.has_voted_in_active_round(&factory, &target)? {
                return Err(GovernanceError::TargetAlreadyVoted);
            }
        }

        // Both accounts exist: they passed the verification checks above.
        if let Some(account) = self.accounts.get_mut(&caller) {
            account.delegated_to = Some(target);
        }
        self.delegators.entry(target).or_default().push(caller);

        info!(delegator = %caller, delegate = %target, "Weight delegated");
        Ok(GovernanceEvent::Delegated {
            ledger: self.address,
            delegator: caller,
            delegate: target,
        })
    }

    /// Ledger entry of `address`, if it was ever touched.
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn is_admin(&self, address: &Address) -> bool {
        self.account(address).map(|a| a.is_admin).unwrap_or(false)
    }

    pub fn is_verified(&self, address: &Address) -> bool {
        self.account(address).map(|a| a.is_verified).unwrap_or(false)
    }

    /// Account `address` delegated to, if any.
    pub fn delegate_of(&self, address: &Address) -> Option<Address> {
        self.account(address).and_then(|a| a.delegated_to)
    }

    pub fn has_delegated(&self, address: &Address) -> bool {
        self.delegate_of(address).is_some()
    }

    /// Direct delegators of `address`, in delegation order.
    pub fn delegators_of(&self, address: &Address) -> &[Address] {
        self.delegators.get(address).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_email_attested(&self, email_hash: &Hash) -> bool {
        self.attested_emails.contains_key(email_hash)
    }
}

impl WeightProvider for IdentityLedger {
    fn current_weight(&self, voter: &Address) -> Result<Weight> {
        IdentityLedger::current_weight(self, voter)
    }

    fn has_delegated(&self, voter: &Address) -> bool {
        IdentityLedger::has_delegated(self, voter)
    }
}
