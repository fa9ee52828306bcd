//! Contract host.
//!
//! Owns every deployed ledger, factory and round by address and runs calls
//! against them one at a time. Cross-contract lookups (a round asking the
//! ledger for weight, a ledger asking the active round who voted, a factory
//! deploying a clone) are resolved here from stored addresses, so no
//! contract ever holds a reference to another.

use std::collections::HashMap;
use std::sync::Arc;

use agora_types::{Address, Hash};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::authority::{owner, SharedAuthority};
use crate::error::{GovernanceError, Result};
use crate::events::{GovernanceEvent, RoundCreated};
use crate::factory::{RoundDeployer, RoundFactory};
use crate::ledger::{Attestation, IdentityLedger, VoteStatusProvider};
use crate::round::{ProposalVote, RoundStatus, VotingRound};
use crate::Weight;

#[derive(Debug, Clone, Default)]
pub struct GovernanceHost {
    ledgers: HashMap<Address, IdentityLedger>,
    factories: HashMap<Address, RoundFactory>,
    /// Templates and instantiated rounds alike.
    rounds: HashMap<Address, VotingRound>,
    nonces: HashMap<Address, u64>,
    events: Vec<GovernanceEvent>,
}

/// Read-only view answering vote-status queries for ledgers.
struct ActiveRounds<'a> {
    factories: &'a HashMap<Address, RoundFactory>,
    rounds: &'a HashMap<Address, VotingRound>,
}

impl VoteStatusProvider for ActiveRounds<'_> {
    fn has_voted_in_active_round(&self, factory: &Address, voter: &Address) -> Result<bool> {
        let factory = self
            .factories
            .get(factory)
            .ok_or(GovernanceError::UnknownContract(*factory))?;
        let Some(meta) = factory.active_round() else {
            return Ok(false);
        };
        let round = self
            .rounds
            .get(&meta.round_address)
            .ok_or(GovernanceError::UnknownContract(meta.round_address))?;
        Ok(round.has_voted(voter))
    }
}

/// Deploys round clones on behalf of a factory, at addresses derived from
/// the factory's own nonce.
struct RoundInstaller<'a> {
    factory: Address,
    rounds: &'a mut HashMap<Address, VotingRound>,
    nonces: &'a mut HashMap<Address, u64>,
}

impl RoundDeployer for RoundInstaller<'_> {
    fn deploy_round(&mut self, template: &Address, authority: SharedAuthority, ledger: &Address) -> Result<Address> {
        let template = self
            .rounds
            .get(template)
            .ok_or(GovernanceError::UnknownContract(*template))?;

        let nonce = self.nonces.get(&self.factory).copied().unwrap_or(0);
        let address = Address::for_contract(&self.factory, nonce);
        let mut round = template.instantiate(address);
        round.initialize(authority, *ledger)?;

        self.nonces.insert(self.factory, nonce + 1);
        self.rounds.insert(address, round);
        debug!(factory = %self.factory, round = %address, "Round clone deployed");
        Ok(address)
    }
}

impl GovernanceHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_address(&mut self, deployer: &Address) -> Address {
        let nonce = self.nonces.entry(*deployer).or_insert(0);
        let address = Address::for_contract(deployer, *nonce);
        *nonce += 1;
        address
    }

    /// Deploy a ledger owned by `deployer`.
    pub fn deploy_ledger(&mut self, deployer: Address, domain_separator: &str) -> Address {
        self.deploy_ledger_with(deployer, owner(deployer), domain_separator)
    }

    pub fn deploy_ledger_with(&mut self, deployer: Address, authority: SharedAuthority, domain_separator: &str) -> Address {
        let address = self.next_address(&deployer);
        self.ledgers
            .insert(address, IdentityLedger::new(address, authority, domain_separator));
        info!(deployer = %deployer, ledger = %address, "Deployed identity ledger");
        address
    }

    /// Deploy a template round owned by `deployer`, bound to `ledger`.
    pub fn deploy_round_template(&mut self, deployer: Address, ledger: Address) -> Result<Address> {
        if !self.ledgers.contains_key(&ledger) {
            return Err(GovernanceError::UnknownContract(ledger));
        }
        let address = self.next_address(&deployer);
        let mut round = VotingRound::new(address);
        round.initialize(owner(deployer), ledger)?;
        self.rounds.insert(address, round);
        info!(deployer = %deployer, round = %address, "Deployed round template");
        Ok(address)
    }

    pub fn deploy_factory(&mut self, deployer: Address) -> Address {
        self.deploy_factory_with(deployer, owner(deployer))
    }

    pub fn deploy_factory_with(&mut self, deployer: Address, authority: SharedAuthority) -> Address {
        let address = self.next_address(&deployer);
        self.factories.insert(address, RoundFactory::new(address, authority));
        info!(deployer = %deployer, factory = %address, "Deployed round factory");
        address
    }

    pub fn ledger(&self, address: &Address) -> Result<&IdentityLedger> {
        self.ledgers
            .get(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn ledger_mut(&mut self, address: &Address) -> Result<&mut IdentityLedger> {
        self.ledgers
            .get_mut(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn round(&self, address: &Address) -> Result<&VotingRound> {
        self.rounds
            .get(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn round_mut(&mut self, address: &Address) -> Result<&mut VotingRound> {
        self.rounds
            .get_mut(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn factory(&self, address: &Address) -> Result<&RoundFactory> {
        self.factories
            .get(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn factory_mut(&mut self, address: &Address) -> Result<&mut RoundFactory> {
        self.factories
            .get_mut(address)
            .ok_or(GovernanceError::UnknownContract(*address))
    }

    pub fn attest(
        &mut self,
        ledger: Address,
        caller: Address,
        balance: Weight,
        attestation: &Attestation,
        email_hash: Hash,
    ) -> Result<()> {
        let event = self.ledger_mut(&ledger)?.attest(caller, balance, attestation, email_hash)?;
        self.events.push(event);
        Ok(())
    }

    pub fn delegate(&mut self, ledger: Address, caller: Address, target: Address) -> Result<()> {
        let rounds = ActiveRounds {
            factories: &self.factories,
            rounds: &self.rounds,
        };
        let event = self
            .ledgers
            .get_mut(&ledger)
            .ok_or(GovernanceError::UnknownContract(ledger))?
            .delegate(caller, target, &rounds)?;
        self.events.push(event);
        Ok(())
    }

    pub fn current_weight(&self, ledger: Address, address: &Address) -> Result<Weight> {
        self.ledger(&ledger)?.current_weight(address)
    }

    /// Whether `voter` has voted in the round that currently gates
    /// delegation on `ledger`.
    pub fn has_voted_in_active_round(&self, ledger: Address, voter: &Address) -> Result<bool> {
        let Some(factory) = self.ledger(&ledger)?.round_factory() else {
            return Ok(false);
        };
        ActiveRounds {
            factories: &self.factories,
            rounds: &self.rounds,
        }
        .has_voted_in_active_round(&factory, voter)
    }

    pub fn vote(
        &mut self,
        round: Address,
        caller: Address,
        proposal_votes: &[ProposalVote],
        nomination_indices: &[u64],
    ) -> Result<()> {
        let round_contract = self
            .rounds
            .get_mut(&round)
            .ok_or(GovernanceError::UnknownContract(round))?;
        let ledger_address = round_contract.ledger().ok_or(GovernanceError::NotInitialized)?;
        let ledger = self
            .ledgers
            .get(&ledger_address)
            .ok_or(GovernanceError::UnknownContract(ledger_address))?;

        let event = round_contract.vote(caller, proposal_votes, nomination_indices, ledger)?;
        self.events.push(event);
        Ok(())
    }

    pub fn set_round_status(&mut self, round: Address, caller: Address, status: RoundStatus) -> Result<()> {
        let event = self.round_mut(&round)?.set_status(caller, status)?;
        self.events.push(event);
        Ok(())
    }

    pub fn create_voting(&mut self, factory: Address, caller: Address, title: Vec<u8>, date: u64) -> Result<RoundCreated> {
        let factory_contract = self
            .factories
            .get_mut(&factory)
            .ok_or(GovernanceError::UnknownContract(factory))?;
        let mut installer = RoundInstaller {
            factory,
            rounds: &mut self.rounds,
            nonces: &mut self.nonces,
        };
        let created = factory_contract.create_voting(caller, title, date, &mut installer)?;
        self.events.push(created.into());
        Ok(created)
    }

    /// Append-only log of every event emitted through the host.
    pub fn events(&self) -> &[GovernanceEvent] {
        &self.events
    }
}

/// Thread-safe handle to a [`GovernanceHost`].
///
/// Both `call` and `transact` hold the lock for the whole closure, so
/// concurrent callers are totally ordered.
#[derive(Debug, Clone, Default)]
pub struct SharedHost {
    inner: Arc<Mutex<GovernanceHost>>,
}

impl SharedHost {
    /// Wrap `host` for shared use.
    pub fn new(host: GovernanceHost) -> Self {
        Self {
            inner: Arc::new(Mutex::new(host)),
        }
    }

    /// Run a single host operation under the lock.
    ///
    /// Every host operation validates before it mutates, so a failed call
    /// leaves the state untouched without a snapshot.
    pub fn call<T>(&self, f: impl FnOnce(&mut GovernanceHost) -> Result<T>) -> Result<T> {
        f(&mut self.inner.lock())
    }

    /// Run several operations as one batch, restoring the prior state if
    /// the closure fails.
    ///
    /// The rollback snapshot is a full clone of the host, including every
    /// round and the event log, so each batch costs O(total state). Use
    /// [`SharedHost::call`] for single operations.
    pub fn transact<T>(&self, f: impl FnOnce(&mut GovernanceHost) -> Result<T>) -> Result<T> {
        let mut host = self.inner.lock();
        let snapshot = host.clone();
        let result = f(&mut host);
        if result.is_err() {
            *host = snapshot;
        }
        result
    }

    /// Read-only access under the lock.
    pub fn read<T>(&self, f: impl FnOnce(&GovernanceHost) -> T) -> T {
        f(&self.inner.lock())
    }
}
