//! # Account Restriction Benchmarks
//!
//! | Operation | Path | Target |
//! |-----------|------|--------|
//! | validate | full rule chain against live view | < 10µs |
//! | execute_block | validate + apply + commit | < 1ms per 100 txs |
//! | policy check | allow/block lookup | < 1µs |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_18_account_restrictions::{
    AccountRestrictionApi, AccountRestrictionService, Direction, Polarity, RestrictionConfig,
    RestrictionFlags, RestrictionModification, RestrictionValue,
};
use rand::Rng;
use shared_types::{networks, Address};

fn account(seed: u32) -> Address {
    let mut address = [0u8; 24];
    address[0] = networks::TESTNET;
    address[1..5].copy_from_slice(&seed.to_be_bytes());
    address[23] = 1;
    address
}

fn block_tx(owner: u32, adds: impl Iterator<Item = u32>) -> RestrictionModification {
    RestrictionModification {
        account: account(owner),
        flags: RestrictionFlags::address(Polarity::Block, Direction::Outgoing),
        additions: adds.map(|seed| RestrictionValue::Address(account(seed))).collect(),
        deletions: vec![],
    }
}

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-validate");
    let service = AccountRestrictionService::new(RestrictionConfig::default());
    service
        .execute_block(1, &[block_tx(0, 1..=256)])
        .expect("seed block");

    for size in [1u32, 16, 128] {
        let tx = block_tx(0, 1_000..1_000 + size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("additions", size), &tx, |b, tx| {
            b.iter(|| black_box(service.validate(tx).is_ok()))
        });
    }
    group.finish();
}

fn bench_execute_block(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-execute-block");
    for txs in [10u32, 100] {
        group.throughput(Throughput::Elements(txs as u64));
        group.bench_with_input(BenchmarkId::new("transactions", txs), &txs, |b, &txs| {
            let mut rng = rand::thread_rng();
            b.iter_batched(
                || {
                    let block: Vec<_> = (0..txs)
                        .map(|owner| block_tx(owner, (0..4).map(|_| rng.gen_range(10_000..20_000))))
                        .collect();
                    (AccountRestrictionService::new(RestrictionConfig::default()), block)
                },
                |(service, block)| black_box(service.execute_block(1, &block).is_ok()),
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_policy(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-policy");
    let service = AccountRestrictionService::new(RestrictionConfig::default());
    service
        .execute_block(1, &[block_tx(0, 1..=512)])
        .expect("seed block");

    group.bench_function("address_interaction_blocked", |b| {
        b.iter(|| black_box(service.check_address_interaction(&account(0), &account(300)).is_err()))
    });
    group.bench_function("address_interaction_allowed", |b| {
        b.iter(|| black_box(service.check_address_interaction(&account(0), &account(9_999)).is_ok()))
    });
    group.finish();
}

criterion_group!(benches, bench_validate, bench_execute_block, bench_policy);
criterion_main!(benches);
