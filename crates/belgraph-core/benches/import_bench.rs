//! # Import Benchmarks
//!
//! Performance benchmarks for term materialization, statement reduction
//! and canonicalization.
//!
//! Run with: `cargo bench -p belgraph-core`

use belgraph_core::{
    Arg, Canonicalizer, Citation, FunctionClass, Graph, IdentityCaches, Materializer, NodeCache,
    Record, RelationType, SetRecord, Statement, StatementReducer, Term,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn protein(index: usize, pmod: bool) -> Term {
    let mut args = vec![Arg::literal("HGNC", format!("GENE{index}"))];
    if pmod {
        args.push(Arg::Term(Term::new(
            FunctionClass::Pmod,
            vec![Arg::Fields(vec![
                ("type".to_string(), Some("Ph".to_string())),
                ("amino_acid".to_string(), Some("Ser".to_string())),
                ("position".to_string(), Some((index % 500).to_string())),
            ])],
        )));
    }
    Term::new(FunctionClass::Protein, args)
}

/// A citation every ten statements, chained `p(i) -> p(i+1)` statements.
fn statement_stream(size: usize) -> Vec<Record> {
    let mut records = Vec::with_capacity(size + size / 10 + 1);
    for i in 0..size {
        if i % 10 == 0 {
            records.push(Record::Sets(vec![
                SetRecord::Citation(Citation {
                    kind: "PubMed".to_string(),
                    reference: (i / 10).to_string(),
                    ..Citation::default()
                }),
                SetRecord::Evidence(format!("evidence {i}")),
            ]));
        }
        records.push(Record::Statement(Statement {
            subject: protein(i, i % 3 == 0),
            relation: RelationType::Increases,
            object: protein(i + 1, false),
        }));
    }
    records
}

fn reduce(graph: &mut Graph, records: &[Record]) {
    let mut caches = IdentityCaches::cold();
    black_box(StatementReducer::new(graph, &mut caches).reduce(records));
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_materialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("materialize");

    for size in [100, 1000, 10000].iter() {
        let terms: Vec<Term> = (0..*size).map(|i| protein(i, i % 2 == 0)).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &terms, |b, terms| {
            b.iter(|| {
                let mut graph = Graph::new();
                let mut cache = NodeCache::default();
                let mut materializer = Materializer::new(&mut cache);
                for term in terms {
                    let _ = materializer.materialize(&mut graph, term);
                }
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_reduce(c: &mut Criterion) {
    let mut group = c.benchmark_group("reduce");

    for size in [100, 1000, 5000].iter() {
        let records = statement_stream(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let mut graph = Graph::new();
                reduce(&mut graph, records);
                black_box(graph)
            });
        });
    }

    group.finish();
}

fn bench_reimport_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("reimport_warm");

    for size in [100, 1000, 5000].iter() {
        let records = statement_stream(*size);
        let mut graph = Graph::new();
        reduce(&mut graph, &records);

        group.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, records| {
            b.iter(|| {
                let mut caches = IdentityCaches::warm(&graph).expect("warm");
                let mut copy = graph.clone();
                black_box(StatementReducer::new(&mut copy, &mut caches).reduce(records))
            });
        });
    }

    group.finish();
}

fn bench_canonicalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonicalize");

    for size in [100, 1000].iter() {
        let mut graph = Graph::new();
        reduce(&mut graph, &statement_stream(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| {
                let mut copy = graph.clone();
                black_box(Canonicalizer::new(&mut copy).run())
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_materialize,
    bench_reduce,
    bench_reimport_warm,
    bench_canonicalize
);
criterion_main!(benches);
