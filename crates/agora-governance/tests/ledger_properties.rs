//! Property tests for the identity ledger.

use agora_crypto::Keypair;
use agora_governance::{owner, Attestation, GovernanceError, IdentityLedger, NoRounds, Weight};
use agora_types::{Address, Hash};
use proptest::prelude::*;

const OWNER: Address = Address::from_bytes([0xAA; 20]);

fn participant(n: u8) -> Address {
    Address::from_bytes([n; 20])
}

fn ledger_with_admin() -> (IdentityLedger, Keypair) {
    let admin = Keypair::from_seed(&[9u8; 32]);
    let mut ledger = IdentityLedger::new(Address::from_bytes([0xBB; 20]), owner(OWNER), "verify");
    ledger.set_admin(OWNER, admin.address(), true).unwrap();
    (ledger, admin)
}

fn attest(ledger: &mut IdentityLedger, admin: &Keypair, who: Address, balance: Weight, email: u8) -> Result<(), GovernanceError> {
    let email_hash = Hash::compute(&[email]);
    let digest = ledger.attestation_digest(&who, balance, &email_hash);
    ledger
        .attest(who, balance, &Attestation::sign(admin, &digest), email_hash)
        .map(|_| ())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Whatever sequence of attestations is attempted, each address and each
    /// email hash succeeds at most once, and the first success sticks.
    #[test]
    fn attest_succeeds_at_most_once(calls in proptest::collection::vec((0u8..6, 0u8..6, 1u64..1_000), 1..24)) {
        let (mut ledger, admin) = ledger_with_admin();
        let mut used_addresses = std::collections::HashMap::new();
        let mut used_emails = std::collections::HashSet::new();

        for (who, email, balance) in calls {
            let address = participant(who);
            let result = attest(&mut ledger, &admin, address, balance as Weight, email);

            if used_emails.contains(&email) {
                prop_assert!(matches!(result, Err(GovernanceError::EmailAlreadyAttested(_))));
            } else if used_addresses.contains_key(&who) {
                prop_assert_eq!(result, Err(GovernanceError::AddressAlreadyAttested));
            } else {
                prop_assert!(result.is_ok());
                used_addresses.insert(who, balance as Weight);
                used_emails.insert(email);
            }
        }

        for (who, balance) in used_addresses {
            prop_assert_eq!(ledger.current_weight(&participant(who)).unwrap(), balance);
        }
    }

    /// Random delegation attempts never produce a chain: any delegate has
    /// not delegated itself, and weight is own balance plus direct delegators.
    #[test]
    fn delegation_is_never_transitive(edges in proptest::collection::vec((0u8..8, 0u8..8), 0..32)) {
        let (mut ledger, admin) = ledger_with_admin();
        for n in 0..8u8 {
            attest(&mut ledger, &admin, participant(n), 100 + n as Weight, n).unwrap();
        }

        for (from, to) in edges {
            let _ = ledger.delegate(participant(from), participant(to), &NoRounds);
        }

        for n in 0..8u8 {
            let address = participant(n);
            if let Some(target) = ledger.delegate_of(&address) {
                prop_assert!(!ledger.has_delegated(&target));
                prop_assert!(ledger.delegators_of(&address).is_empty());
            }

            let expected: Weight = 100 + n as Weight
                + ledger
                    .delegators_of(&address)
                    .iter()
                    .map(|d| ledger.account(d).map(|a| a.attested_balance).unwrap_or(0))
                    .sum::<Weight>();
            prop_assert_eq!(ledger.current_weight(&address).unwrap(), expected);
        }
    }
}
