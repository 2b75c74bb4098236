//! # arc-cli
//!
//! Operator CLI for Arc: inspect a compiled module, validate an IR file on
//! its own, or run a module against newline-delimited JSON frames on
//! stdin/stdout.

use arc_cli::manifest;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "arc")]
#[command(about = "Arc runtime CLI - load, inspect, and run dataflow modules", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug-level logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a summary of a module's nodes, edges, stages, and wasm size
    Inspect {
        /// Path to the module manifest (TOML)
        manifest: PathBuf,
    },

    /// Check an IR file's structural invariants without compiling its wasm
    Validate {
        /// Path to the IR file (JSON)
        ir: PathBuf,
    },

    /// Load a module and run it, reading input frames as JSON lines from
    /// stdin and writing output frames as JSON lines to stdout until stdin
    /// closes
    Run {
        /// Path to the module manifest (TOML)
        manifest: PathBuf,

        /// Override the input queue capacity
        #[arg(long)]
        input_capacity: Option<usize>,

        /// Override the output queue capacity
        #[arg(long)]
        output_capacity: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Inspect { manifest } => inspect(&manifest),
        Commands::Validate { ir } => validate(&ir),
        Commands::Run { manifest, input_capacity, output_capacity } => {
            run(&manifest, input_capacity, output_capacity)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn inspect(manifest_path: &PathBuf) -> Result<()> {
    let module = manifest::load(manifest_path)?;
    println!("{module}");
    Ok(())
}

fn validate(ir_path: &PathBuf) -> Result<()> {
    let ir_json = std::fs::read_to_string(ir_path)
        .with_context(|| format!("reading IR file {}", ir_path.display()))?;
    let ir: arc_ir::IR = serde_json::from_str(&ir_json)
        .with_context(|| format!("parsing IR file {}", ir_path.display()))?;
    ir.validate()?;

    let (reads, writes) = arc_runtime::extract_channel_keys(&ir);
    println!("IR is valid");
    println!("  nodes: {}", ir.nodes.len());
    println!("  edges: {}", ir.edges.len());
    println!("  sequences: {}", ir.sequences.len());
    println!("  channels read: {}", reads.len());
    println!("  channels written: {}", writes.len());
    Ok(())
}

fn run(manifest_path: &PathBuf, input_capacity: Option<usize>, output_capacity: Option<usize>) -> Result<()> {
    let module = manifest::load(manifest_path)?;
    let mut cfg = arc_runtime::Config::new(module);
    if let Some(c) = input_capacity {
        cfg.input_queue_capacity = c;
    }
    if let Some(c) = output_capacity {
        cfg.output_queue_capacity = c;
    }

    let mut runtime = arc_runtime::load(cfg)?;

    let write_handle = runtime.handle();
    let reader = thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<arc_telem::Frame>(&line) {
                Ok(frame) => {
                    if !write_handle.write(frame) {
                        tracing::warn!("input queue closed or full, dropping a frame");
                    }
                }
                Err(err) => tracing::warn!(error = %err, "skipping malformed input frame"),
            }
        }
        write_handle.stop();
    });

    let read_handle = runtime.handle();
    let writer = thread::spawn(move || -> io::Result<()> {
        let stdout = io::stdout();
        loop {
            match read_handle.read() {
                Some(frame) => {
                    let mut out = stdout.lock();
                    serde_json::to_writer(&mut out, &frame)
                        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
                    writeln!(out)?;
                }
                None => {
                    if !read_handle.is_running() {
                        return Ok(());
                    }
                    thread::sleep(Duration::from_millis(5));
                }
            }
        }
    });

    runtime.run()?;
    let _ = reader.join();
    let _ = writer.join();
    Ok(())
}
