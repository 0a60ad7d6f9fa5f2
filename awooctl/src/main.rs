mod fmt;

use anyhow::{bail, Context, Result};
use awoo::{file, Index, Searcher, TagId};
use clap::Parser;
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "awooctl")]
#[command(about = "Benchmark conjunctive tag searches against an Awoo index file", long_about = None)]
struct Args {
    /// Path to the index file
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Number of repetitions per benchmark query
    #[arg(long, default_value = "1000")]
    repeat: u32,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,
}

// 1girl solo long_hair touhou fate/grand_order
const REFERENCE_QUERY: [TagId; 5] = [470_575, 212_816, 13_197, 29, 1_283_444];

const REFERENCE_EXPECTED: [u32; 17] = [
    2_380_549, 2_420_287, 2_423_105, 2_523_394, 2_646_037, 2_683_860, 2_705_783, 2_745_868,
    2_746_265, 2_752_461, 2_905_088, 2_917_346, 3_114_201, 4_081_318, 4_718_669, 5_639_802,
    6_055_186,
];

// t-doll_contract girls'_frontline
const SPARSE_QUERY: [TagId; 2] = [1_574_450, 1_665_885];

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    let start = Instant::now();
    let index = file::load(&args.file)
        .with_context(|| format!("failed to load index {}", args.file.display()))?;
    info!(
        "loaded {} tags, items up to id {}, {} resident, in {}",
        index.tag_count(),
        index.max_id(),
        fmt::bytes(index.heap_bytes() as u64),
        fmt::duration(start.elapsed()),
    );

    let mut searcher = Searcher::new();
    let mut ok = true;
    ok &= run_query(
        &mut searcher,
        &index,
        &REFERENCE_QUERY,
        Some(&REFERENCE_EXPECTED),
        args.repeat,
    )?;
    ok &= run_query(&mut searcher, &index, &SPARSE_QUERY, None, args.repeat)?;

    if !ok {
        bail!("benchmark results did not match the expected set");
    }
    Ok(())
}

/// Run one benchmark query `repeat` times and report timing; returns whether
/// the results matched the expected set (trivially true without one).
fn run_query(
    searcher: &mut Searcher,
    index: &Index,
    query: &[TagId],
    expected: Option<&[u32]>,
    repeat: u32,
) -> Result<bool> {
    let repeat = repeat.max(1);
    let mut results = Vec::new();

    let start = Instant::now();
    for _ in 0..repeat {
        searcher
            .search_into(index, query, &mut results)
            .with_context(|| format!("query {query:?} failed"))?;
    }
    let elapsed = start.elapsed();

    println!(
        "query {:?}: {} results in {} average ({} total for {} iterations)",
        query,
        results.len(),
        fmt::duration(elapsed / repeat),
        fmt::duration(elapsed),
        repeat,
    );

    let Some(expected) = expected else {
        return Ok(true);
    };

    if results == expected {
        println!("  results match the expected set");
        return Ok(true);
    }

    let missing: Vec<u32> = expected
        .iter()
        .copied()
        .filter(|id| results.binary_search(id).is_err())
        .collect();
    let extra: Vec<u32> = results
        .iter()
        .copied()
        .filter(|id| expected.binary_search(id).is_err())
        .collect();

    if !missing.is_empty() {
        println!("  missing items: {missing:?}");
    }
    if !extra.is_empty() {
        println!("  unexpected items: {extra:?}");
    }
    Ok(false)
}
