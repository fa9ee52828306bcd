//! Scenario files for `agora simulate`.
//!
//! A scenario names its participants; each name maps to a deterministic
//! ed25519 key (seed = blake3 of the name) so runs are reproducible.

use agora_crypto::Keypair;
use agora_governance::{
    Attestation, GovernanceHost, ProposalVote, RoundResults, RoundStatus, Weight,
};
use agora_types::{Address, Hash};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    /// Overrides the configured domain separator
    pub domain_separator: Option<String>,
    /// Deployer and owner of every contract
    #[serde(default = "default_owner")]
    pub owner: String,
    /// Admin that signs attestations
    #[serde(default = "default_admin")]
    pub admin: String,
    #[serde(default)]
    pub participants: Vec<Participant>,
    #[serde(default)]
    pub delegations: Vec<Delegation>,
    #[serde(default)]
    pub rounds: Vec<RoundPlan>,
}

fn default_owner() -> String {
    "owner".to_string()
}

fn default_admin() -> String {
    "admin".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub name: String,
    pub balance: u64,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delegation {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoundPlan {
    pub title: String,
    #[serde(default)]
    pub date: u64,
    pub nomination_select_limit: u64,
    #[serde(default)]
    pub proposals: Vec<ProposalPlan>,
    #[serde(default)]
    pub nominations: Vec<String>,
    #[serde(default)]
    pub ballots: Vec<Ballot>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProposalPlan {
    pub content: String,
    #[serde(default)]
    pub flag: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ballot {
    pub voter: String,
    /// `[index, option code]` pairs
    #[serde(default)]
    pub proposals: Vec<(u64, u8)>,
    #[serde(default)]
    pub nominations: Vec<u64>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario '{}'", path.display()))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse scenario '{}'", path.display()))
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}

/// Deterministic key for a participant name.
pub fn keypair_for(name: &str) -> Keypair {
    Keypair::from_seed(Hash::compute(name.as_bytes()).as_bytes())
}

/// A call the governance contracts refused.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub step: String,
    pub actor: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParticipantReport {
    pub name: String,
    pub address: Address,
    pub attested_balance: Weight,
    pub current_weight: Weight,
    pub delegate: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoundReport {
    pub index: u64,
    pub title: String,
    pub address: Address,
    pub voters: usize,
    pub proposals: Vec<String>,
    pub nominations: Vec<String>,
    pub results: RoundResults,
}

#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    pub domain_separator: String,
    pub ledger: Address,
    pub factory: Address,
    pub participants: Vec<ParticipantReport>,
    pub rounds: Vec<RoundReport>,
    pub rejections: Vec<Rejection>,
    pub events: usize,
}

/// Replay `scenario` against a fresh host.
///
/// Deployment and catalog setup errors abort the run. Attestations,
/// delegations and ballots that the contracts refuse are collected as
/// rejections and the run continues.
pub fn run(scenario: &Scenario, default_domain: &str) -> anyhow::Result<SimulationReport> {
    let domain = scenario.domain_separator.as_deref().unwrap_or(default_domain);
    let owner = keypair_for(&scenario.owner).address();
    let admin = keypair_for(&scenario.admin);

    let names: BTreeMap<&str, Address> = scenario
        .participants
        .iter()
        .map(|p| (p.name.as_str(), keypair_for(&p.name).address()))
        .collect();
    let lookup = |name: &str| -> anyhow::Result<Address> {
        names
            .get(name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Unknown participant '{}'", name))
    };

    let mut host = GovernanceHost::new();
    let ledger = host.deploy_ledger(owner, domain);
    let template = host.deploy_round_template(owner, ledger)?;
    let factory = host.deploy_factory(owner);
    host.factory_mut(&factory)?.initialize(template, ledger)?;
    {
        let l = host.ledger_mut(&ledger)?;
        l.set_admin(owner, admin.address(), true)?;
        l.set_round_factory(owner, factory)?;
    }
    info!(ledger = %ledger, factory = %factory, domain, "Scenario contracts deployed");

    let mut rejections = Vec::new();
    let mut reject = |step: &str, actor: &str, reason: String| {
        warn!(step, actor, %reason, "Call rejected");
        rejections.push(Rejection {
            step: step.to_string(),
            actor: actor.to_string(),
            reason,
        });
    };

    for participant in &scenario.participants {
        let who = lookup(&participant.name)?;
        let balance = Weight::from(participant.balance);
        let email_hash = crate::commands::email_hash(&participant.email);
        let digest = host.ledger(&ledger)?.attestation_digest(&who, balance, &email_hash);
        let attestation = Attestation::sign(&admin, &digest);
        if let Err(e) = host.attest(ledger, who, balance, &attestation, email_hash) {
            reject("attest", &participant.name, e.to_string());
        }
    }

    for delegation in &scenario.delegations {
        let (from, to) = (lookup(&delegation.from)?, lookup(&delegation.to)?);
        if let Err(e) = host.delegate(ledger, from, to) {
            reject("delegate", &delegation.from, e.to_string());
        }
    }

    let mut rounds = Vec::with_capacity(scenario.rounds.len());
    for plan in &scenario.rounds {
        let created = host.create_voting(factory, owner, plan.title.clone().into_bytes(), plan.date)?;
        let address = created.round_address;
        {
            let round = host.round_mut(&address)?;
            if !plan.proposals.is_empty() {
                let (contents, flags): (Vec<Vec<u8>>, Vec<bool>) = plan
                    .proposals
                    .iter()
                    .map(|p| (p.content.clone().into_bytes(), p.flag))
                    .unzip();
                round.add_proposals(owner, contents, flags)?;
            }
            if !plan.nominations.is_empty() {
                let contents = plan.nominations.iter().map(|n| n.clone().into_bytes()).collect();
                round.add_nominations(owner, contents)?;
            }
            round.set_nomination_select_limit(owner, plan.nomination_select_limit)?;
        }
        host.set_round_status(address, owner, RoundStatus::Open)?;

        for ballot in &plan.ballots {
            let voter = lookup(&ballot.voter)?;
            let votes: Result<Vec<ProposalVote>, _> = ballot
                .proposals
                .iter()
                .map(|&(index, option)| ProposalVote::from_raw(index, option))
                .collect();
            let outcome = votes.and_then(|votes| host.vote(address, voter, &votes, &ballot.nominations));
            if let Err(e) = outcome {
                reject(&format!("vote #{}", created.index), &ballot.voter, e.to_string());
            }
        }
        host.set_round_status(address, owner, RoundStatus::Closed)?;

        let round = host.round(&address)?;
        rounds.push(RoundReport {
            index: created.index,
            title: plan.title.clone(),
            address,
            voters: round.voter_count(),
            proposals: plan.proposals.iter().map(|p| p.content.clone()).collect(),
            nominations: plan.nominations.clone(),
            results: round.all_results(),
        });
    }

    let by_address: BTreeMap<Address, &str> = names.iter().map(|(name, addr)| (*addr, *name)).collect();
    let l = host.ledger(&ledger)?;
    let mut participants = Vec::with_capacity(names.len());
    for participant in &scenario.participants {
        let address = lookup(&participant.name)?;
        participants.push(ParticipantReport {
            name: participant.name.clone(),
            address,
            attested_balance: l.account(&address).map(|a| a.attested_balance).unwrap_or(0),
            current_weight: l.current_weight(&address)?,
            delegate: l
                .delegate_of(&address)
                .and_then(|d| by_address.get(&d))
                .map(|name| name.to_string()),
        });
    }

    Ok(SimulationReport {
        domain_separator: domain.to_string(),
        ledger,
        factory,
        participants,
        rounds,
        rejections,
        events: host.events().len(),
    })
}
