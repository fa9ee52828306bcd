use agora_types::{Address, Hash};
use thiserror::Error;

/// Coarse classification of a [`GovernanceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong caller role (not owner / not admin).
    Authorization,
    /// Operation invalid in the current lifecycle state.
    State,
    /// Shape or range violation in the arguments.
    Validation,
    /// The call collides with something already recorded.
    Conflict,
    /// Identity, weight or signature problem.
    Identity,
    /// Address does not resolve to a deployed contract.
    Host,
}

/// Errors that can occur in governance operations.
///
/// Every error aborts the whole call; no partial state is ever committed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GovernanceError {
    #[error("Caller is not the owner: {caller:?}")]
    NotOwner { caller: Address },

    #[error("Round started")]
    RoundStarted,

    #[error("Round not open")]
    RoundNotOpen,

    #[error("Not initialized")]
    NotInitialized,

    #[error("Already initialized")]
    AlreadyInitialized,

    #[error("Empty input")]
    EmptyInput,

    #[error("Invalid array length: {left} != {right}")]
    LengthMismatch { left: usize, right: usize },

    #[error("Empty content at position {0}")]
    EmptyContent(usize),

    #[error("Invalid index: {0}")]
    InvalidIndex(u64),

    #[error("Invalid proposal: {0}")]
    InvalidProposalIndex(u64),

    #[error("Invalid nomination: {0}")]
    InvalidNominationIndex(u64),

    #[error("Invalid proposal length: expected {expected}, got {actual}")]
    ProposalCountMismatch { expected: usize, actual: usize },

    #[error("Invalid nomination length: expected {expected}, got {actual}")]
    NominationCountMismatch { expected: usize, actual: usize },

    #[error("Cannot delegate yourself")]
    SelfDelegation,

    #[error("Invalid vote option: {0}")]
    InvalidVoteOption(u8),

    #[error("Invalid round status: {0}")]
    InvalidStatus(u8),

    #[error("Weight overflow")]
    WeightOverflow,

    #[error("Already voted")]
    AlreadyVoted,

    #[error("Cannot vote twice for proposal {0}")]
    DuplicateProposalIndex(u64),

    #[error("Cannot vote twice for nomination {0}")]
    DuplicateNominationIndex(u64),

    #[error("You had delegated")]
    CallerAlreadyDelegated,

    #[error("User had delegated")]
    TargetAlreadyDelegated,

    #[error("You had voted")]
    CallerAlreadyVoted,

    #[error("User had voted")]
    TargetAlreadyVoted,

    #[error("Address verified")]
    AddressAlreadyAttested,

    #[error("Email verified: {0}")]
    EmailAlreadyAttested(Hash),

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("You can't vote")]
    NoVotingWeight,

    #[error("You have delegated")]
    CallerHasDelegated,

    #[error("You must verify balance first")]
    CallerNotVerified,

    #[error("User haven't verified balance yet")]
    TargetNotVerified,

    #[error("Unknown contract: {0:?}")]
    UnknownContract(Address),
}

impl GovernanceError {
    /// Taxonomy bucket of this error.
    pub fn kind(&self) -> ErrorKind {
        use GovernanceError::*;
        match self {
            NotOwner { .. } => ErrorKind::Authorization,
            RoundStarted | RoundNotOpen | NotInitialized | AlreadyInitialized => ErrorKind::State,
            EmptyInput
            | LengthMismatch { .. }
            | EmptyContent(_)
            | InvalidIndex(_)
            | InvalidProposalIndex(_)
            | InvalidNominationIndex(_)
            | ProposalCountMismatch { .. }
            | NominationCountMismatch { .. }
            | SelfDelegation
            | InvalidVoteOption(_)
            | InvalidStatus(_)
            | WeightOverflow => ErrorKind::Validation,
            AlreadyVoted
            | DuplicateProposalIndex(_)
            | DuplicateNominationIndex(_)
            | CallerAlreadyDelegated
            | TargetAlreadyDelegated
            | CallerAlreadyVoted
            | TargetAlreadyVoted
            | AddressAlreadyAttested
            | EmailAlreadyAttested(_) => ErrorKind::Conflict,
            InvalidSignature
            | NoVotingWeight
            | CallerHasDelegated
            | CallerNotVerified
            | TargetNotVerified => ErrorKind::Identity,
            UnknownContract(_) => ErrorKind::Host,
        }
    }
}

impl From<agora_crypto::CryptoError> for GovernanceError {
    fn from(_: agora_crypto::CryptoError) -> Self {
        GovernanceError::InvalidSignature
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
