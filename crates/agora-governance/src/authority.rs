//! Pluggable authority for owner-only operations.
//!
//! Contracts never compare the caller against a stored owner directly; they
//! hold an `Arc<dyn Authority>` injected at construction and ask it.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use agora_types::Address;

use crate::error::{GovernanceError, Result};

/// Decides whether a caller may perform owner-only operations.
pub trait Authority: fmt::Debug + Send + Sync {
    fn is_authorized(&self, caller: &Address) -> bool;

    /// Fail with [`GovernanceError::NotOwner`] unless `caller` is authorized.
    fn ensure(&self, caller: &Address) -> Result<()> {
        if self.is_authorized(caller) {
            Ok(())
        } else {
            Err(GovernanceError::NotOwner { caller: *caller })
        }
    }
}

/// Shared handle to an authority.
pub type SharedAuthority = Arc<dyn Authority>;

/// A single owner address, the deployer in the default setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SingleOwner(pub Address);

impl Authority for SingleOwner {
    fn is_authorized(&self, caller: &Address) -> bool {
        *caller == self.0
    }
}

/// Any member of a fixed set, e.g. a council.
#[derive(Debug, Clone, Default)]
pub struct RoleList {
    members: BTreeSet<Address>,
}

impl RoleList {
    pub fn new(members: impl IntoIterator<Item = Address>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn members(&self) -> impl Iterator<Item = &Address> {
        self.members.iter()
    }
}

impl Authority for RoleList {
    fn is_authorized(&self, caller: &Address) -> bool {
        self.members.contains(caller)
    }
}

/// Convenience constructor for the common single-owner case.
pub fn owner(address: Address) -> SharedAuthority {
    Arc::new(SingleOwner(address))
}
