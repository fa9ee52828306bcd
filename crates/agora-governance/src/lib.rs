//! Agora Governance - Weighted voting over attested identities.
//!
//! This crate provides:
//! - `IdentityLedger`: admin-signed balance attestation and one-level delegation
//! - `VotingRound`: proposal/nomination catalogs, status machine, weighted tallies
//! - `RoundFactory`: sequential rounds cloned from a template against one ledger
//! - `GovernanceHost`: owns every deployed contract and serializes calls

pub mod authority;
pub mod error;
pub mod events;
pub mod factory;
pub mod host;
pub mod ledger;
pub mod round;

/// Voting weight and attested balance unit.
pub type Weight = u128;

pub use authority::{owner, Authority, RoleList, SharedAuthority, SingleOwner};
pub use error::{ErrorKind, GovernanceError, Result};
pub use events::{GovernanceEvent, RoundCreated};
pub use factory::{ActiveRound, RoundDeployer, RoundFactory, RoundMeta};
pub use host::{GovernanceHost, SharedHost};
pub use ledger::{attestation_digest, Account, Attestation, IdentityLedger, NoRounds, VoteStatusProvider};
pub use round::{
    Nomination, NominationResult, Proposal, ProposalResult, ProposalVote, RoundResults, RoundStatus,
    VoteOption, VotingRound, WeightProvider,
};
