// Chain validation benchmarks.
//
// Covers canonical encoding of block contents, single-block hash checks,
// and full re-validation from genesis at a few chain lengths.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use tally_ledger::codec::encode;
use tally_ledger::prelude::*;

/// Builds a chain of `blocks` blocks after genesis, each moving 1 unit from
/// the treasury to one of 16 accounts.
fn build_chain(blocks: usize) -> Chain {
    let genesis = Block::genesis(vec![Transaction::from([("treasury", 1_000_000)])]).unwrap();
    let mut chain = Chain::new(genesis);
    let mut state = check_chain(&chain).unwrap();

    for i in 0..blocks {
        let tx = Transaction::transfer("treasury", format!("acct-{}", i % 16), 1).unwrap();
        let (s, c) = add_transaction(&tx, &state, &chain).unwrap();
        state = s;
        chain = c;
    }
    chain
}

fn bench_encode_contents(c: &mut Criterion) {
    let chain = build_chain(1);
    let contents = chain.tip().contents.clone();

    c.bench_function("codec/encode_block_contents", |b| {
        b.iter(|| encode(&contents).unwrap());
    });
}

fn bench_block_hash(c: &mut Criterion) {
    let chain = build_chain(1);
    let block = chain.tip().clone();

    c.bench_function("chain/check_block_hash", |b| {
        b.iter(|| check_block_hash(&block).unwrap());
    });
}

fn bench_check_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("chain/check_chain");

    for length in [10usize, 100, 500] {
        let chain = build_chain(length);
        group.throughput(Throughput::Elements(chain.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(length), &chain, |b, chain| {
            b.iter(|| check_chain(chain).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_encode_contents, bench_block_hash, bench_check_chain);
criterion_main!(benches);
