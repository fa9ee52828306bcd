//! Notifications emitted for off-chain indexers.

use agora_types::{Address, Hash};
use serde::{Deserialize, Serialize};

use crate::round::RoundStatus;
use crate::Weight;

/// Emitted by `create_voting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCreated {
    pub index: u64,
    pub round_address: Address,
}

/// Every event the governance contracts emit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GovernanceEvent {
    RoundCreated(RoundCreated),
    Attested {
        ledger: Address,
        account: Address,
        balance: Weight,
        email_hash: Hash,
    },
    Delegated {
        ledger: Address,
        delegator: Address,
        delegate: Address,
    },
    VoteCast {
        round: Address,
        voter: Address,
        weight: Weight,
    },
    StatusChanged {
        round: Address,
        status: RoundStatus,
    },
}

impl GovernanceEvent {
    /// Canonical signature string, used to derive the topic.
    pub fn signature(&self) -> &'static str {
        match self {
            GovernanceEvent::RoundCreated(_) => "RoundCreated(uint64,address)",
            GovernanceEvent::Attested { .. } => "Attested(address,address,uint128,bytes32)",
            GovernanceEvent::Delegated { .. } => "Delegated(address,address,address)",
            GovernanceEvent::VoteCast { .. } => "VoteCast(address,address,uint128)",
            GovernanceEvent::StatusChanged { .. } => "StatusChanged(address,uint8)",
        }
    }

    /// blake3 of the signature string.
    pub fn topic(&self) -> Hash {
        Hash::compute(self.signature().as_bytes())
    }
}

impl From<RoundCreated> for GovernanceEvent {
    fn from(event: RoundCreated) -> Self {
        GovernanceEvent::RoundCreated(event)
    }
}
