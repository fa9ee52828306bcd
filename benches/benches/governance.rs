use agora_crypto::Keypair;
use agora_governance::{
    attestation_digest, Attestation, GovernanceHost, ProposalVote, RoundStatus, VoteOption,
};
use agora_types::{Address, Hash};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

const DOMAIN: &str = "verify";

fn voter(n: u32) -> Address {
    let mut bytes = [0u8; 20];
    bytes[16..].copy_from_slice(&n.to_be_bytes());
    Address::from_bytes(bytes)
}

/// Host with one open round of `size` proposals and `size` nominations and
/// one attested voter.
fn setup(size: u64) -> (GovernanceHost, Address) {
    let owner = Address::from_bytes([0xAA; 20]);
    let admin = Keypair::from_seed(&[3u8; 32]);
    let mut host = GovernanceHost::new();

    let ledger = host.deploy_ledger(owner, DOMAIN);
    let template = host.deploy_round_template(owner, ledger).unwrap();
    let factory = host.deploy_factory(owner);
    host.factory_mut(&factory).unwrap().initialize(template, ledger).unwrap();
    host.ledger_mut(&ledger).unwrap().set_admin(owner, admin.address(), true).unwrap();

    let email_hash = Hash::compute(b"bench@agora");
    let digest = attestation_digest(DOMAIN, &voter(1), 1_000, &email_hash);
    host.attest(ledger, voter(1), 1_000, &Attestation::sign(&admin, &digest), email_hash)
        .unwrap();

    let round = host.create_voting(factory, owner, b"bench".to_vec(), 0).unwrap().round_address;
    let r = host.round_mut(&round).unwrap();
    let contents: Vec<Vec<u8>> = (0..size).map(|i| format!("item {i}").into_bytes()).collect();
    r.add_proposals(owner, contents.clone(), vec![false; size as usize]).unwrap();
    r.add_nominations(owner, contents).unwrap();
    r.set_nomination_select_limit(owner, size).unwrap();
    host.set_round_status(round, owner, RoundStatus::Open).unwrap();

    (host, round)
}

fn bench_vote(c: &mut Criterion) {
    let mut group = c.benchmark_group("vote");
    for size in [4u64, 32, 256] {
        let ballot: Vec<ProposalVote> = (1..=size).map(|i| ProposalVote::new(i, VoteOption::Agree)).collect();
        let nominations: Vec<u64> = (1..=size).collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter_batched(
                || setup(size),
                |(mut host, round)| black_box(host.vote(round, voter(1), &ballot, &nominations)),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_attestation(c: &mut Criterion) {
    let mut group = c.benchmark_group("attestation");
    let admin = Keypair::from_seed(&[3u8; 32]);
    let email_hash = Hash::compute(b"bench@agora");
    let digest = attestation_digest(DOMAIN, &voter(1), 1_000, &email_hash);
    let attestation = Attestation::sign(&admin, &digest);

    group.bench_function("digest", |b| {
        b.iter(|| black_box(attestation_digest(DOMAIN, &voter(1), 1_000, &email_hash)))
    });
    group.bench_function("recover", |b| b.iter(|| black_box(attestation.recover(&digest))));
    group.finish();
}

criterion_group!(benches, bench_vote, bench_attestation);
criterion_main!(benches);
