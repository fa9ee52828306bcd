//! Voting round state machine.
//!
//! A round owns two catalogs: proposals, each voted agree/disagree/abstain,
//! and nominations, of which every ballot picks exactly
//! `nomination_select_limit` distinct entries. Both are 1-indexed and can
//! only be edited while the round has not started.

use std::collections::HashSet;

use agora_types::Address;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::authority::SharedAuthority;
use crate::error::{GovernanceError, Result};
use crate::events::GovernanceEvent;
use crate::Weight;

/// Resolves a voter's weight and delegation state.
pub trait WeightProvider {
    fn current_weight(&self, voter: &Address) -> Result<Weight>;
    fn has_delegated(&self, voter: &Address) -> bool;
}

/// Round lifecycle. The owner may move between any two states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    #[default]
    NotYet,
    Paused,
    Open,
    Closed,
}

impl RoundStatus {
    pub fn code(self) -> u8 {
        match self {
            RoundStatus::NotYet => 0,
            RoundStatus::Paused => 1,
            RoundStatus::Open => 2,
            RoundStatus::Closed => 3,
        }
    }
}

impl TryFrom<u8> for RoundStatus {
    type Error = GovernanceError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(RoundStatus::NotYet),
            1 => Ok(RoundStatus::Paused),
            2 => Ok(RoundStatus::Open),
            3 => Ok(RoundStatus::Closed),
            other => Err(GovernanceError::InvalidStatus(other)),
        }
    }
}

impl std::fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RoundStatus::NotYet => "not_yet",
            RoundStatus::Paused => "paused",
            RoundStatus::Open => "open",
            RoundStatus::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Choice on a single proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteOption {
    Agree,
    Disagree,
    Abstain,
}

impl VoteOption {
    /// Wire code of this option.
    pub fn code(self) -> u8 {
        match self {
            VoteOption::Agree => 0,
            VoteOption::Disagree => 1,
            VoteOption::Abstain => 2,
        }
    }

    /// Whether the weight is added to the proposal's `total_vote`.
    /// Abstentions only fill their own bucket.
    pub fn counts_toward_total(self) -> bool {
        !matches!(self, VoteOption::Abstain)
    }
}

impl TryFrom<u8> for VoteOption {
    type Error = GovernanceError;

    fn try_from(code: u8) -> Result<Self> {
        match code {
            0 => Ok(VoteOption::Agree),
            1 => Ok(VoteOption::Disagree),
            2 => Ok(VoteOption::Abstain),
            other => Err(GovernanceError::InvalidVoteOption(other)),
        }
    }
}

/// One entry of a ballot's proposal section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalVote {
    pub index: u64,
    pub option: VoteOption,
}

impl ProposalVote {
    /// Vote `option` on the proposal at `index`.
    pub fn new(index: u64, option: VoteOption) -> Self {
        Self { index, option }
    }

    /// Build from a raw option code as it arrives off the wire.
    pub fn from_raw(index: u64, option: u8) -> Result<Self> {
        Ok(Self {
            index,
            option: VoteOption::try_from(option)?,
        })
    }
}

/// A proposal and its running tallies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Proposal {
    /// 1-based position in the catalog
    pub index: u64,
    /// Opaque content bytes
    pub content: Vec<u8>,
    /// Opaque per-proposal configuration bit, surfaced unchanged.
    pub flag: bool,
    /// Weight of agree and disagree votes
    pub total_vote: Weight,
    /// Weight voted agree
    pub agree: Weight,
    /// Weight voted disagree
    pub disagree: Weight,
    /// Weight that abstained
    pub abstain: Weight,
}

/// A nominee and the weight that selected it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Nomination {
    /// 1-based position in the catalog
    pub index: u64,
    /// Opaque content bytes
    pub content: Vec<u8>,
    /// Weight of every ballot that selected this nominee
    pub total_vote: Weight,
}

/// Tallies of one proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProposalResult {
    pub index: u64,
    pub total_vote: Weight,
    pub agree: Weight,
    pub disagree: Weight,
    pub abstain: Weight,
}

impl From<&Proposal> for ProposalResult {
    fn from(p: &Proposal) -> Self {
        Self {
            index: p.index,
            total_vote: p.total_vote,
            agree: p.agree,
            disagree: p.disagree,
            abstain: p.abstain,
        }
    }
}

/// Tally of one nomination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NominationResult {
    pub index: u64,
    pub total_vote: Weight,
}

impl From<&Nomination> for NominationResult {
    fn from(n: &Nomination) -> Self {
        Self {
            index: n.index,
            total_vote: n.total_vote,
        }
    }
}

/// Tallies of every proposal and nomination, in index order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoundResults {
    pub proposals: Vec<ProposalResult>,
    pub nominations: Vec<NominationResult>,
}

/// Staged proposal tally, committed only once the whole ballot checks out.
struct StagedProposal {
    slot: usize,
    option: VoteOption,
    total_vote: Weight,
    bucket: Weight,
}

/// One weighted ballot over a proposal and a nomination catalog.
#[derive(Debug, Clone)]
pub struct VotingRound {
    /// Contract address of this round
    address: Address,
    /// Owner check, bound by `initialize`
    authority: Option<SharedAuthority>,
    /// Identity ledger that supplies voting weight
    ledger: Option<Address>,
    /// Round this one was instantiated from
    template: Option<Address>,
    status: RoundStatus,
    proposals: Vec<Proposal>,
    nominations: Vec<Nomination>,
    /// Exact number of nominations every ballot selects
    nomination_select_limit: u64,
    /// Addresses that already voted
    voters: HashSet<Address>,
}

impl VotingRound {
    /// An uninitialized round at `address`.
    pub fn new(address: Address) -> Self {
        Self {
            address,
            authority: None,
            ledger: None,
            template: None,
            status: RoundStatus::NotYet,
            proposals: Vec::new(),
            nominations: Vec::new(),
            nomination_select_limit: 0,
            voters: HashSet::new(),
        }
    }

    /// Fresh uninitialized copy of this round, deployed at `address`.
    ///
    /// Catalogs, votes and status are not carried over; the nomination
    /// select limit is kept as the default for the new round.
    pub fn instantiate(&self, address: Address) -> Self {
        let mut round = VotingRound::new(address);
        round.nomination_select_limit = self.nomination_select_limit;
        round.template = Some(self.address);
        round
    }

    /// Bind the owner authority and the identity ledger. One-time.
    pub fn initialize(&mut self, authority: SharedAuthority, ledger: Address) -> Result<()> {
        if self.authority.is_some() {
            return Err(GovernanceError::AlreadyInitialized);
        }
        self.authority = Some(authority);
        self.ledger = Some(ledger);
        debug!(round = %self.address, ledger = %ledger, "Round initialized");
        Ok(())
    }

    fn ensure_owner(&self, caller: &Address) -> Result<()> {
        self.authority
            .as_ref()
            .ok_or(GovernanceError::NotInitialized)?
            .ensure(caller)
    }

    fn ensure_editable(&self, caller: &Address) -> Result<()> {
        self.ensure_owner(caller)?;
        if self.status != RoundStatus::NotYet {
            return Err(GovernanceError::RoundStarted);
        }
        Ok(())
    }

    /// Append proposals, one per `(content, flag)` pair.
    pub fn add_proposals(&mut self, caller: Address, contents: Vec<Vec<u8>>, flags: Vec<bool>) -> Result<()> {
        self.ensure_editable(&caller)?;
        check_contents(&contents, flags.len())?;

        let start = self.proposals.len() as u64;
        for (offset, (content, flag)) in contents.into_iter().zip(flags).enumerate() {
            self.proposals.push(Proposal {
                index: start + offset as u64 + 1,
                content,
                flag,
                total_vote: 0,
                agree: 0,
                disagree: 0,
                abstain: 0,
            });
        }
        info!(round = %self.address, total = self.proposals.len(), "Proposals added");
        Ok(())
    }

    /// Overwrite the content of the proposals at `indices`.
    pub fn update_proposals(&mut self, caller: Address, contents: Vec<Vec<u8>>, indices: Vec<u64>) -> Result<()> {
        self.ensure_editable(&caller)?;
        check_contents(&contents, indices.len())?;
        let slots = slots_for(&indices, self.proposals.len())?;

        for (slot, content) in slots.into_iter().zip(contents) {
            self.proposals[slot].content = content;
        }
        info!(round = %self.address, updated = indices.len(), "Proposals updated");
        Ok(())
    }

    /// Append nominations.
    pub fn add_nominations(&mut self, caller: Address, contents: Vec<Vec<u8>>) -> Result<()> {
        self.ensure_editable(&caller)?;
        check_contents(&contents, contents.len())?;

        let start = self.nominations.len() as u64;
        for (offset, content) in contents.into_iter().enumerate() {
            self.nominations.push(Nomination {
                index: start + offset as u64 + 1,
                content,
                total_vote: 0,
            });
        }
        info!(round = %self.address, total = self.nominations.len(), "Nominations added");
        Ok(())
    }

    /// Overwrite the content of the nominations at `indices`.
    pub fn update_nominations(&mut self, caller: Address, contents: Vec<Vec<u8>>, indices: Vec<u64>) -> Result<()> {
        self.ensure_editable(&caller)?;
        check_contents(&contents, indices.len())?;
        let slots = slots_for(&indices, self.nominations.len())?;

        for (slot, content) in slots.into_iter().zip(contents) {
            self.nominations[slot].content = content;
        }
        info!(round = %self.address, updated = indices.len(), "Nominations updated");
        Ok(())
    }

    /// Set how many distinct nominations every ballot must pick.
    pub fn set_nomination_select_limit(&mut self, caller: Address, limit: u64) -> Result<()> {
        self.ensure_owner(&caller)?;
        self.nomination_select_limit = limit;
        info!(round = %self.address, limit, "Nomination select limit set");
        Ok(())
    }

    /// Move the round to `status`. Any transition is allowed; only
    /// `NotYet` leaves the catalogs editable.
    pub fn set_status(&mut self, caller: Address, status: RoundStatus) -> Result<GovernanceEvent> {
        self.ensure_owner(&caller)?;
        let previous = self.status;
        self.status = status;
        info!(round = %self.address, from = %previous, to = %status, "Round status changed");
        Ok(GovernanceEvent::StatusChanged {
            round: self.address,
            status,
        })
    }

    /// Cast the caller's full current weight on every proposal and on the
    /// selected nominations.
    pub fn vote(
        &mut self,
        caller: Address,
        proposal_votes: &[ProposalVote],
        nomination_indices: &[u64],
        weights: &dyn WeightProvider,
    ) -> Result<GovernanceEvent> {
        if self.status != RoundStatus::Open {
            return Err(GovernanceError::RoundNotOpen);
        }
        if proposal_votes.len() != self.proposals.len() {
            return Err(GovernanceError::ProposalCountMismatch {
                expected: self.proposals.len(),
                actual: proposal_votes.len(),
            });
        }
        if nomination_indices.len() as u64 != self.nomination_select_limit {
            return Err(GovernanceError::NominationCountMismatch {
                expected: self.nomination_select_limit as usize,
                actual: nomination_indices.len(),
            });
        }

        let weight = weights.current_weight(&caller)?;
        if weight == 0 {
            return Err(GovernanceError::NoVotingWeight);
        }
        if weights.has_delegated(&caller) {
            return Err(GovernanceError::CallerHasDelegated);
        }
        if self.voters.contains(&caller) {
            return Err(GovernanceError::AlreadyVoted);
        }

        let staged_proposals = self.stage_proposals(proposal_votes, weight)?;
        let staged_nominations = self.stage_nominations(nomination_indices, weight)?;

        for staged in staged_proposals {
            let proposal = &mut self.proposals[staged.slot];
            proposal.total_vote = staged.total_vote;
            match staged.option {
                VoteOption::Agree => proposal.agree = staged.bucket,
                VoteOption::Disagree => proposal.disagree = staged.bucket,
                VoteOption::Abstain => proposal.abstain = staged.bucket,
            }
        }
        for (slot, total) in staged_nominations {
            self.nominations[slot].total_vote = total;
        }
        self.voters.insert(caller);

        debug!(round = %self.address, voter = %caller, weight, "Vote recorded");
        Ok(GovernanceEvent::VoteCast {
            round: self.address,
            voter: caller,
            weight,
        })
    }

    fn stage_proposals(&self, votes: &[ProposalVote], weight: Weight) -> Result<Vec<StagedProposal>> {
        let mut seen = HashSet::with_capacity(votes.len());
        let mut staged = Vec::with_capacity(votes.len());

        for vote in votes {
            let slot = slot_of(vote.index, self.proposals.len())
                .ok_or(GovernanceError::InvalidProposalIndex(vote.index))?;
            if !seen.insert(vote.index) {
                return Err(GovernanceError::DuplicateProposalIndex(vote.index));
            }

            let proposal = &self.proposals[slot];
            let bucket = match vote.option {
                VoteOption::Agree => proposal.agree,
                VoteOption::Disagree => proposal.disagree,
                VoteOption::Abstain => proposal.abstain,
            };
            staged.push(StagedProposal {
                slot,
                option: vote.option,
                total_vote: if vote.option.counts_toward_total() {
                    proposal
                        .total_vote
                        .checked_add(weight)
                        .ok_or(GovernanceError::WeightOverflow)?
                } else {
                    proposal.total_vote
                },
                bucket: bucket.checked_add(weight).ok_or(GovernanceError::WeightOverflow)?,
            });
        }
        Ok(staged)
    }

    fn stage_nominations(&self, indices: &[u64], weight: Weight) -> Result<Vec<(usize, Weight)>> {
        let mut seen = HashSet::with_capacity(indices.len());
        let mut staged = Vec::with_capacity(indices.len());

        for &index in indices {
            let slot = slot_of(index, self.nominations.len())
                .ok_or(GovernanceError::InvalidNominationIndex(index))?;
            if !seen.insert(index) {
                return Err(GovernanceError::DuplicateNominationIndex(index));
            }
            let total = self.nominations[slot]
                .total_vote
                .checked_add(weight)
                .ok_or(GovernanceError::WeightOverflow)?;
            staged.push((slot, total));
        }
        Ok(staged)
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn is_initialized(&self) -> bool {
        self.authority.is_some()
    }

    pub fn ledger(&self) -> Option<Address> {
        self.ledger
    }

    /// Template this round was instantiated from, if any.
    pub fn template(&self) -> Option<Address> {
        self.template
    }

    pub fn status(&self) -> RoundStatus {
        self.status
    }

    pub fn total_proposals(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn total_nominations(&self) -> u64 {
        self.nominations.len() as u64
    }

    pub fn nomination_select_limit(&self) -> u64 {
        self.nomination_select_limit
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.voters.contains(voter)
    }

    pub fn voter_count(&self) -> usize {
        self.voters.len()
    }

    pub fn all_proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    /// Select limit together with the nomination list.
    pub fn all_nominations(&self) -> (u64, &[Nomination]) {
        (self.nomination_select_limit, &self.nominations)
    }

    pub fn all_results(&self) -> RoundResults {
        RoundResults {
            proposals: self.proposals.iter().map(ProposalResult::from).collect(),
            nominations: self.nominations.iter().map(NominationResult::from).collect(),
        }
    }

    /// Tallies of the proposal at 1-based `index`.
    pub fn result_of_proposal(&self, index: u64) -> Result<ProposalResult> {
        slot_of(index, self.proposals.len())
            .map(|slot| ProposalResult::from(&self.proposals[slot]))
            .ok_or(GovernanceError::InvalidIndex(index))
    }

    /// Tally of the nomination at 1-based `index`.
    pub fn result_of_nomination(&self, index: u64) -> Result<NominationResult> {
        slot_of(index, self.nominations.len())
            .map(|slot| NominationResult::from(&self.nominations[slot]))
            .ok_or(GovernanceError::InvalidIndex(index))
    }
}

/// Vec slot of a 1-based index, if in range.
fn slot_of(index: u64, len: usize) -> Option<usize> {
    if index == 0 || index > len as u64 {
        None
    } else {
        Some(index as usize - 1)
    }
}

fn slots_for(indices: &[u64], len: usize) -> Result<Vec<usize>> {
    indices
        .iter()
        .map(|&i| slot_of(i, len).ok_or(GovernanceError::InvalidIndex(i)))
        .collect()
}

fn check_contents(contents: &[Vec<u8>], paired_len: usize) -> Result<()> {
    if contents.is_empty() {
        return Err(GovernanceError::EmptyInput);
    }
    if contents.len() != paired_len {
        return Err(GovernanceError::LengthMismatch {
            left: contents.len(),
            right: paired_len,
        });
    }
    if let Some(position) = contents.iter().position(|c| c.is_empty()) {
        return Err(GovernanceError::EmptyContent(position));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authority::owner;
    use std::collections::HashMap;

    fn test_address(n: u8) -> Address {
        let mut addr = [0u8; 20];
        addr[19] = n;
        Address::from_bytes(addr)
    }

    const OWNER: u8 = 100;

    #[derive(Default)]
    struct StaticWeights {
        weights: HashMap<Address, Weight>,
        delegated: HashSet<Address>,
    }

    impl StaticWeights {
        fn with(mut self, who: Address, weight: Weight) -> Self {
            self.weights.insert(who, weight);
            self
        }
    }

    impl WeightProvider for StaticWeights {
        fn current_weight(&self, voter: &Address) -> Result<Weight> {
            Ok(self.weights.get(voter).copied().unwrap_or(0))
        }

        fn has_delegated(&self, voter: &Address) -> bool {
            self.delegated.contains(voter)
        }
    }

    fn c(s: &str) -> Vec<u8> {
        s.as_bytes().to_vec()
    }

    fn new_round() -> VotingRound {
        let mut round = VotingRound::new(test_address(1));
        round.initialize(owner(test_address(OWNER)), test_address(2)).unwrap();
        round
    }

    /// Two proposals, three nominations, select limit 2, open.
    fn open_round() -> VotingRound {
        let o = test_address(OWNER);
        let mut round = new_round();
        round.add_proposals(o, vec![c("p1"), c("p2")], vec![true, false]).unwrap();
        round.add_nominations(o, vec![c("n1"), c("n2"), c("n3")]).unwrap();
        round.set_nomination_select_limit(o, 2).unwrap();
        round.set_status(o, RoundStatus::Open).unwrap();
        round
    }

    fn ballot(opts: &[(u64, u8)]) -> Vec<ProposalVote> {
        opts.iter().map(|&(i, o)| ProposalVote::from_raw(i, o).unwrap()).collect()
    }

    #[test]
    fn test_status_codes() {
        for code in 0..4u8 {
            assert_eq!(RoundStatus::try_from(code).unwrap().code(), code);
        }
        assert_eq!(RoundStatus::try_from(4), Err(GovernanceError::InvalidStatus(4)));
        assert_eq!(VoteOption::try_from(3), Err(GovernanceError::InvalidVoteOption(3)));
        assert_eq!(RoundStatus::default(), RoundStatus::NotYet);
    }

    #[test]
    fn test_initialize_once() {
        let mut round = new_round();
        assert!(round.is_initialized());
        assert_eq!(
            round.initialize(owner(test_address(9)), test_address(2)),
            Err(GovernanceError::AlreadyInitialized)
        );
    }

    #[test]
    fn test_uninitialized_round_rejects_owner_ops() {
        let mut round = VotingRound::new(test_address(1));
        assert_eq!(
            round.add_nominations(test_address(OWNER), vec![c("n")]),
            Err(GovernanceError::NotInitialized)
        );
        assert_eq!(
            round.set_status(test_address(OWNER), RoundStatus::Open),
            Err(GovernanceError::NotInitialized)
        );
    }

    #[test]
    fn test_add_proposals_validation() {
        let o = test_address(OWNER);
        let mut round = new_round();

        assert!(matches!(
            round.add_proposals(test_address(3), vec![], vec![]),
            Err(GovernanceError::NotOwner { .. })
        ));
        assert_eq!(round.add_proposals(o, vec![], vec![]), Err(GovernanceError::EmptyInput));
        assert_eq!(
            round.add_proposals(o, vec![c("a")], vec![true, false]),
            Err(GovernanceError::LengthMismatch { left: 1, right: 2 })
        );
        assert_eq!(
            round.add_proposals(o, vec![c("a"), vec![]], vec![true, false]),
            Err(GovernanceError::EmptyContent(1))
        );
        assert_eq!(round.total_proposals(), 0);

        round.add_proposals(o, vec![c("a"), c("b")], vec![true, false]).unwrap();
        round.add_proposals(o, vec![c("c")], vec![true]).unwrap();

        let proposals = round.all_proposals();
        assert_eq!(proposals.iter().map(|p| p.index).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(proposals[0].flag);
        assert!(!proposals[1].flag);
    }

    #[test]
    fn test_update_proposals() {
        let o = test_address(OWNER);
        let mut round = new_round();
        round.add_proposals(o, vec![c("a"), c("b")], vec![true, false]).unwrap();

        assert_eq!(
            round.update_proposals(o, vec![c("x")], vec![0]),
            Err(GovernanceError::InvalidIndex(0))
        );
        assert_eq!(
            round.update_proposals(o, vec![c("x"), c("y")], vec![2, 3]),
            Err(GovernanceError::InvalidIndex(3))
        );
        // Failed update left content untouched
        assert_eq!(round.all_proposals()[1].content, c("b"));

        round.update_proposals(o, vec![c("x")], vec![2]).unwrap();
        assert_eq!(round.all_proposals()[1].content, c("x"));
        assert!(!round.all_proposals()[1].flag);
    }

    #[test]
    fn test_update_proposals_shape_checks() {
        let o = test_address(OWNER);
        let mut round = new_round();
        round.add_proposals(o, vec![c("a"), c("b")], vec![true, false]).unwrap();

        assert_eq!(round.update_proposals(o, vec![], vec![]), Err(GovernanceError::EmptyInput));
        assert_eq!(
            round.update_proposals(o, vec![c("x"), c("y")], vec![1]),
            Err(GovernanceError::LengthMismatch { left: 2, right: 1 })
        );
        assert_eq!(
            round.update_proposals(o, vec![c("x"), vec![]], vec![1, 2]),
            Err(GovernanceError::EmptyContent(1))
        );
        assert_eq!(round.all_proposals()[0].content, c("a"));

        round.set_status(o, RoundStatus::Closed).unwrap();
        assert_eq!(
            round.update_proposals(o, vec![c("x")], vec![1]),
            Err(GovernanceError::RoundStarted)
        );
    }

    #[test]
    fn test_back_to_not_yet_reopens_catalog() {
        let o = test_address(OWNER);
        let mut round = open_round();
        round.set_status(o, RoundStatus::Closed).unwrap();
        assert_eq!(
            round.update_proposals(o, vec![c("x")], vec![1]),
            Err(GovernanceError::RoundStarted)
        );

        round.set_status(o, RoundStatus::NotYet).unwrap();
        round.update_proposals(o, vec![c("x")], vec![1]).unwrap();
        round.add_nominations(o, vec![c("n4")]).unwrap();
        assert_eq!(round.all_proposals()[0].content, c("x"));
        assert_eq!(round.total_nominations(), 4);
    }

    #[test]
    fn test_update_nominations_rejects_empty_content() {
        let o = test_address(OWNER);
        let mut round = new_round();
        round.add_nominations(o, vec![c("n1")]).unwrap();
        assert_eq!(
            round.update_nominations(o, vec![vec![]], vec![1]),
            Err(GovernanceError::EmptyContent(0))
        );
    }

    #[test]
    fn test_catalog_frozen_after_start() {
        let o = test_address(OWNER);
        for status in [RoundStatus::Paused, RoundStatus::Open, RoundStatus::Closed] {
            let mut round = new_round();
            round.add_nominations(o, vec![c("n1")]).unwrap();
            round.set_status(o, status).unwrap();

            assert_eq!(round.add_proposals(o, vec![c("a")], vec![true]), Err(GovernanceError::RoundStarted));
            assert_eq!(round.add_nominations(o, vec![c("a")]), Err(GovernanceError::RoundStarted));
            assert_eq!(round.update_nominations(o, vec![c("a")], vec![1]), Err(GovernanceError::RoundStarted));
        }
    }

    #[test]
    fn test_vote_tallies() {
        let voter = test_address(10);
        let weights = StaticWeights::default().with(voter, 100_000);
        let mut round = open_round();

        let event = round.vote(voter, &ballot(&[(1, 1), (2, 0)]), &[1, 2], &weights).unwrap();
        assert_eq!(
            event,
            GovernanceEvent::VoteCast {
                round: test_address(1),
                voter,
                weight: 100_000
            }
        );

        let p1 = round.result_of_proposal(1).unwrap();
        assert_eq!((p1.agree, p1.disagree, p1.total_vote), (0, 100_000, 100_000));
        let p2 = round.result_of_proposal(2).unwrap();
        assert_eq!((p2.agree, p2.total_vote), (100_000, 100_000));

        let results = round.all_results();
        let noms: Vec<_> = results.nominations.iter().map(|n| n.total_vote).collect();
        assert_eq!(noms, vec![100_000, 100_000, 0]);
        assert!(round.has_voted(&voter));
        assert_eq!(round.voter_count(), 1);
    }

    #[test]
    fn test_abstain_stays_out_of_total() {
        let (a, b) = (test_address(10), test_address(11));
        let weights = StaticWeights::default().with(a, 100_000).with(b, 2_000);
        let mut round = open_round();

        round.vote(a, &ballot(&[(1, 1), (2, 0)]), &[1, 2], &weights).unwrap();
        round.vote(b, &ballot(&[(1, 2), (2, 0)]), &[1, 3], &weights).unwrap();

        let p1 = round.result_of_proposal(1).unwrap();
        assert_eq!((p1.total_vote, p1.disagree, p1.abstain), (100_000, 100_000, 2_000));
        let p2 = round.result_of_proposal(2).unwrap();
        assert_eq!((p2.total_vote, p2.agree), (102_000, 102_000));
        assert!(!VoteOption::Abstain.counts_toward_total());
    }

    #[test]
    fn test_vote_rejections() {
        let voter = test_address(10);
        let mut weights = StaticWeights::default().with(voter, 5).with(test_address(11), 7);
        weights.delegated.insert(test_address(11));
        let mut round = open_round();
        let good = ballot(&[(1, 0), (2, 2)]);

        assert_eq!(
            round.vote(voter, &good[..1], &[1, 2], &weights),
            Err(GovernanceError::ProposalCountMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(
            round.vote(voter, &good, &[1], &weights),
            Err(GovernanceError::NominationCountMismatch { expected: 2, actual: 1 })
        );
        assert_eq!(
            round.vote(test_address(12), &good, &[1, 2], &weights),
            Err(GovernanceError::NoVotingWeight)
        );
        assert_eq!(
            round.vote(test_address(11), &good, &[1, 2], &weights),
            Err(GovernanceError::CallerHasDelegated)
        );
        assert_eq!(
            round.vote(voter, &ballot(&[(1, 0), (3, 0)]), &[1, 2], &weights),
            Err(GovernanceError::InvalidProposalIndex(3))
        );
        assert_eq!(
            round.vote(voter, &ballot(&[(1, 0), (1, 1)]), &[1, 2], &weights),
            Err(GovernanceError::DuplicateProposalIndex(1))
        );
        assert_eq!(
            round.vote(voter, &good, &[1, 4], &weights),
            Err(GovernanceError::InvalidNominationIndex(4))
        );
        assert_eq!(
            round.vote(voter, &good, &[1, 1], &weights),
            Err(GovernanceError::DuplicateNominationIndex(1))
        );

        // Nothing was committed by the rejected ballots
        assert_eq!(round.voter_count(), 0);
        assert!(round.all_results().proposals.iter().all(|p| p.total_vote == 0));

        round.vote(voter, &good, &[1, 2], &weights).unwrap();
        assert_eq!(round.vote(voter, &good, &[1, 2], &weights), Err(GovernanceError::AlreadyVoted));
    }

    #[test]
    fn test_vote_requires_open() {
        let voter = test_address(10);
        let weights = StaticWeights::default().with(voter, 5);
        let mut round = open_round();
        let o = test_address(OWNER);

        round.set_status(o, RoundStatus::Paused).unwrap();
        assert_eq!(
            round.vote(voter, &ballot(&[(1, 0), (2, 0)]), &[1, 2], &weights),
            Err(GovernanceError::RoundNotOpen)
        );
        round.set_status(o, RoundStatus::Open).unwrap();
        assert!(round.vote(voter, &ballot(&[(1, 0), (2, 0)]), &[1, 2], &weights).is_ok());
    }

    #[test]
    fn test_overflow_leaves_state_unchanged() {
        let (a, b) = (test_address(10), test_address(11));
        let weights = StaticWeights::default().with(a, Weight::MAX).with(b, 1);
        let mut round = open_round();

        round.vote(a, &ballot(&[(1, 0), (2, 0)]), &[1, 2], &weights).unwrap();
        assert_eq!(
            round.vote(b, &ballot(&[(1, 1), (2, 0)]), &[1, 2], &weights),
            Err(GovernanceError::WeightOverflow)
        );
        assert!(!round.has_voted(&b));
        assert_eq!(round.result_of_proposal(1).unwrap().disagree, 0);
    }

    #[test]
    fn test_result_index_out_of_range() {
        let round = open_round();
        assert_eq!(round.result_of_proposal(10), Err(GovernanceError::InvalidIndex(10)));
        assert_eq!(round.result_of_nomination(0), Err(GovernanceError::InvalidIndex(0)));
        let (limit, noms) = round.all_nominations();
        assert_eq!((limit, noms.len()), (2, 3));
    }

    #[test]
    fn test_instantiate_copies_limit_only() {
        let template = open_round();
        let clone = template.instantiate(test_address(50));

        assert!(!clone.is_initialized());
        assert_eq!(clone.status(), RoundStatus::NotYet);
        assert_eq!(clone.total_proposals(), 0);
        assert_eq!(clone.nomination_select_limit(), 2);
        assert_eq!(clone.template(), Some(test_address(1)));
        assert_eq!(clone.address(), test_address(50));
    }
}
