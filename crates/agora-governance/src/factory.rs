//! Round factory.
//!
//! Clones a template round for every `create_voting` call, wires the clone
//! to the shared ledger and keeps an ordered, 1-indexed registry. The
//! factory also decides which round is "active" for delegation checks.

use agora_types::Address;
use serde::Serialize;
use tracing::info;

use crate::authority::SharedAuthority;
use crate::error::{GovernanceError, Result};
use crate::events::RoundCreated;

/// Deploys an initialized clone of a template round.
///
/// Implementations must either return the address of a fully initialized
/// round or leave no trace of the attempt.
pub trait RoundDeployer {
    /// Clone `template`, initialize it with `authority` and `ledger`, and
    /// return the new round's address.
    fn deploy_round(&mut self, template: &Address, authority: SharedAuthority, ledger: &Address) -> Result<Address>;
}

/// Registry entry for a created round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundMeta {
    /// 1-based registry position
    pub index: u64,
    /// Opaque title bytes
    pub title: Vec<u8>,
    /// Caller-supplied date, stored as given
    pub date: u64,
    /// Address of the deployed round
    pub round_address: Address,
}

/// Which round gates delegation on the bound ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveRound {
    /// The most recently created round.
    #[default]
    Latest,
    /// A specific round, by registry index.
    Pinned(u64),
}

/// Creates rounds from a template and keeps their registry.
#[derive(Debug, Clone)]
pub struct RoundFactory {
    /// Contract address of this factory
    address: Address,
    /// Owner check for every mutating call
    authority: SharedAuthority,
    initialized: bool,
    /// Round cloned by `create_voting`
    template: Option<Address>,
    /// Ledger handed to every new round
    ledger: Option<Address>,
    /// Created rounds in creation order
    rounds: Vec<RoundMeta>,
    active: ActiveRound,
}

impl RoundFactory {
    /// Create an uninitialized factory at `address`.
    pub fn new(address: Address, authority: SharedAuthority) -> Self {
        Self {
            address,
            authority,
            initialized: false,
            template: None,
            ledger: None,
            rounds: Vec::new(),
            active: ActiveRound::Latest,
        }
    }

    /// Record the template and ledger. One-time.
    pub fn initialize(&mut self, template: Address, ledger: Address) -> Result<()> {
        if self.initialized {
            return Err(GovernanceError::AlreadyInitialized);
        }
        self.initialized = true;
        self.template = Some(template);
        self.ledger = Some(ledger);
        info!(factory = %self.address, template = %template, ledger = %ledger, "Factory initialized");
        Ok(())
    }

    /// Replace the template round. Authority-only.
    pub fn set_template(&mut self, caller: Address, template: Address) -> Result<()> {
        self.authority.ensure(&caller)?;
        self.template = Some(template);
        info!(factory = %self.address, template = %template, "Template replaced");
        Ok(())
    }

    /// Replace the ledger given to future rounds. Authority-only.
    pub fn set_ledger(&mut self, caller: Address, ledger: Address) -> Result<()> {
        self.authority.ensure(&caller)?;
        self.ledger = Some(ledger);
        info!(factory = %self.address, ledger = %ledger, "Ledger replaced");
        Ok(())
    }

    /// Deploy a new round from the template and register it.
    pub fn create_voting(
        &mut self,
        caller: Address,
        title: Vec<u8>,
        date: u64,
        deployer: &mut dyn RoundDeployer,
    ) -> Result<RoundCreated> {
        self.authority.ensure(&caller)?;
        let (template, ledger) = match (self.initialized, self.template, self.ledger) {
            (true, Some(template), Some(ledger)) => (template, ledger),
            _ => return Err(GovernanceError::NotInitialized),
        };

        let round_address = deployer.deploy_round(&template, self.authority.clone(), &ledger)?;
        let index = self.rounds.len() as u64 + 1;
        self.rounds.push(RoundMeta {
            index,
            title,
            date,
            round_address,
        });

        info!(factory = %self.address, index, round = %round_address, "Voting round created");
        Ok(RoundCreated { index, round_address })
    }

    /// Pin the active round to `index`, or follow the latest with `None`.
    pub fn set_active_round(&mut self, caller: Address, index: Option<u64>) -> Result<()> {
        self.authority.ensure(&caller)?;
        self.active = match index {
            Some(index) => {
                self.round_at(index)?;
                ActiveRound::Pinned(index)
            }
            None => ActiveRound::Latest,
        };
        info!(factory = %self.address, active = ?self.active, "Active round binding changed");
        Ok(())
    }

    pub fn active_binding(&self) -> ActiveRound {
        self.active
    }

    /// The round currently consulted for delegation checks, if any exist.
    pub fn active_round(&self) -> Option<&RoundMeta> {
        match self.active {
            ActiveRound::Latest => self.rounds.last(),
            ActiveRound::Pinned(index) => self.round_at(index).ok(),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn template(&self) -> Option<Address> {
        self.template
    }

    pub fn ledger(&self) -> Option<Address> {
        self.ledger
    }

    pub fn all_rounds(&self) -> &[RoundMeta] {
        &self.rounds
    }

    /// Registry entry at 1-based `index`.
    pub fn round_at(&self, index: u64) -> Result<&RoundMeta> {
        index
            .checked_sub(1)
            .and_then(|slot| self.rounds.get(slot as usize))
            .ok_or(GovernanceError::InvalidIndex(index))
    }

    pub fn total_rounds(&self) -> u64 {
        self.rounds.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::owner;

    fn test_address(n: u8) -> Address {
        let mut addr = [0u8; 20];
        addr[19] = n;
        Address::from_bytes(addr)
    }

    const OWNER: u8 = 100;

    /// Hands out sequential addresses starting at 50.
    #[derive(Default)]
    struct CountingDeployer {
        deployed: Vec<(Address, Address)>,
        fail: bool,
    }

    impl RoundDeployer for CountingDeployer {
        fn deploy_round(&mut self, template: &Address, _authority: SharedAuthority, ledger: &Address) -> Result<Address> {
            if self.fail {
                return Err(GovernanceError::UnknownContract(*template));
            }
            let address = test_address(50 + self.deployed.len() as u8);
            self.deployed.push((address, *ledger));
            Ok(address)
        }
    }

    fn factory() -> RoundFactory {
        let mut factory = RoundFactory::new(test_address(1), owner(test_address(OWNER)));
        factory.initialize(test_address(2), test_address(3)).unwrap();
        factory
    }

    #[test]
    fn test_initialize_once() {
        let mut f = factory();
        assert!(f.is_initialized());
        assert_eq!(f.initialize(test_address(4), test_address(5)), Err(GovernanceError::AlreadyInitialized));
        assert_eq!(f.template(), Some(test_address(2)));
    }

    #[test]
    fn test_create_voting_before_initialize() {
        let mut f = RoundFactory::new(test_address(1), owner(test_address(OWNER)));
        let mut deployer = CountingDeployer::default();
        assert_eq!(
            f.create_voting(test_address(OWNER), b"t".to_vec(), 0, &mut deployer),
            Err(GovernanceError::NotInitialized)
        );
    }

    #[test]
    fn test_create_voting_sequential() {
        let mut f = factory();
        let mut deployer = CountingDeployer::default();
        let o = test_address(OWNER);

        let first = f.create_voting(o, b"first".to_vec(), 1_700_000_000, &mut deployer).unwrap();
        let second = f.create_voting(o, b"second".to_vec(), 1_700_000_100, &mut deployer).unwrap();

        assert_eq!((first.index, second.index), (1, 2));
        assert_ne!(first.round_address, second.round_address);
        assert_eq!(f.round_at(2).unwrap().title, b"second".to_vec());
        assert_eq!(f.total_rounds(), 2);
        assert_eq!(deployer.deployed[0].1, test_address(3));
        assert_eq!(f.round_at(3), Err(GovernanceError::InvalidIndex(3)));
        assert_eq!(f.round_at(0), Err(GovernanceError::InvalidIndex(0)));
    }

    #[test]
    fn test_create_voting_owner_only() {
        let mut f = factory();
        let mut deployer = CountingDeployer::default();
        assert!(matches!(
            f.create_voting(test_address(7), b"t".to_vec(), 0, &mut deployer),
            Err(GovernanceError::NotOwner { .. })
        ));
        assert!(f.set_template(test_address(7), test_address(9)).is_err());
        assert!(f.set_ledger(test_address(7), test_address(9)).is_err());
        assert!(deployer.deployed.is_empty());
    }

    #[test]
    fn test_failed_deploy_registers_nothing() {
        let mut f = factory();
        let mut deployer = CountingDeployer {
            fail: true,
            ..Default::default()
        };
        assert!(f.create_voting(test_address(OWNER), b"t".to_vec(), 0, &mut deployer).is_err());
        assert_eq!(f.total_rounds(), 0);
    }

    #[test]
    fn test_active_round_binding() {
        let mut f = factory();
        let mut deployer = CountingDeployer::default();
        let o = test_address(OWNER);
        assert!(f.active_round().is_none());

        f.create_voting(o, b"a".to_vec(), 0, &mut deployer).unwrap();
        f.create_voting(o, b"b".to_vec(), 0, &mut deployer).unwrap();
        assert_eq!(f.active_round().map(|r| r.index), Some(2));

        f.set_active_round(o, Some(1)).unwrap();
        f.create_voting(o, b"c".to_vec(), 0, &mut deployer).unwrap();
        assert_eq!(f.active_round().map(|r| r.index), Some(1));

        assert_eq!(f.set_active_round(o, Some(9)), Err(GovernanceError::InvalidIndex(9)));
        assert_eq!(f.active_binding(), ActiveRound::Pinned(1));

        f.set_active_round(o, None).unwrap();
        assert_eq!(f.active_round().map(|r| r.index), Some(3));
    }
}
