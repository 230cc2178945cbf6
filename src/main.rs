//! vmsim - segment/page translation trace replayer
//!
//! Preloads the segment and page tables from a layout file, then replays an
//! action file twice against a fresh system: once translating directly
//! through the tables, once with the TLB in front of them. Each run's token
//! stream is written to its own output file.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use log::info;

use vmsim::constants::DEFAULT_TLB_CAPACITY;
use vmsim::io::{Layout, read_actions, write_output};
use vmsim::logger;
use vmsim::{Action, VirtualMemorySystem};

#[derive(Parser)]
#[command(name = "vmsim")]
#[command(about = "Replay a read/write trace through a segment/page MMU with and without a TLB")]
struct Cli {
    /// Two lines: `(segment, address)` pairs, then `(page, segment, address)` triples
    layout_file: PathBuf,

    /// `(op, address)` pairs; op 0 reads, op 1 writes
    action_file: PathBuf,

    /// Output of the run without the TLB
    no_tlb_output: PathBuf,

    /// Output of the run with the TLB
    tlb_output: PathBuf,

    /// Number of TLB entries
    #[arg(long, default_value_t = DEFAULT_TLB_CAPACITY, value_parser = parse_capacity)]
    tlb_capacity: usize,

    /// Increase log detail (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(logger::level_from_verbosity(cli.verbose))
        .context("Failed to install logger")?;

    let layout = Layout::from_file(&cli.layout_file).map_err(|e| anyhow!(e))?;
    let actions = read_actions(&cli.action_file).map_err(|e| anyhow!(e))?;
    info!(
        "{} page tables, {} pages, {} actions",
        layout.page_tables.len(),
        layout.pages.len(),
        actions.len()
    );

    for (use_tlb, path) in [(false, &cli.no_tlb_output), (true, &cli.tlb_output)] {
        let output = run(&layout, &actions, use_tlb, cli.tlb_capacity)
            .with_context(|| format!("Replay failed (tlb: {})", use_tlb))?;
        write_output(path, &output).map_err(|e| anyhow!(e))?;
        info!("Results written to: {}", path.display());
    }

    Ok(())
}

fn parse_capacity(value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(0) => Err("TLB capacity must be at least 1".to_string()),
        Ok(capacity) => Ok(capacity),
        Err(e) => Err(format!("Invalid TLB capacity: {}", e)),
    }
}

/// One replay on a freshly preloaded system
fn run(layout: &Layout, actions: &[Action], use_tlb: bool, tlb_capacity: usize) -> Result<String> {
    let mut vm = VirtualMemorySystem::with_tlb_capacity(tlb_capacity);
    layout.apply(&mut vm).context("Failed to preload layout")?;

    let output = vm.replay(actions, use_tlb)?;
    info!(
        "Run (tlb: {}) finished, {} frames in use",
        use_tlb,
        vm.bitmap().count_occupied()
    );
    Ok(output)
}
