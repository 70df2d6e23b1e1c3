//! Instruction throughput of both state realizations.
//!
//! ```sh
//! cargo run -p dcpu-core --release --example throughput
//! ```
//!
//! Runs a memory-heavy loop synchronously through [`step`] and then on the
//! engine thread, printing instructions per second for each realization.

#![allow(clippy::pedantic)]

use std::thread;
use std::time::{Duration, Instant};

use dcpu_core::{
    boot, encode_basic, step, BasicOpcode, CoreConfig, ExecutionEngine, MutableState,
    PersistentState, State,
};

use crossbeam_channel as _;
use parking_lot as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const SYNC_STEPS: u64 = 2_000_000;
const ENGINE_RUN: Duration = Duration::from_secs(1);

/// `ADD [I], 1 ; ADD I, 1 ; SET PC, 0`: touches a fresh word each pass.
fn workload() -> Vec<u16> {
    vec![
        encode_basic(BasicOpcode::Add, 0x0E, 0x21),
        encode_basic(BasicOpcode::Add, 0x06, 0x21),
        encode_basic(BasicOpcode::Set, 0x1C, 0x20),
    ]
}

fn measure_sync<S: State + Default>(label: &str) {
    let mut state: S = boot(&CoreConfig::bare(), &workload()).expect("workload boots");
    let start = Instant::now();
    for _ in 0..SYNC_STEPS {
        step(&mut state);
    }
    let elapsed = start.elapsed();
    println!(
        "{label:<12} step():   {:>12.0} instr/s",
        SYNC_STEPS as f64 / elapsed.as_secs_f64()
    );
}

fn measure_engine<S: State + Default + 'static>(label: &str) {
    let state: S = boot(&CoreConfig::bare(), &workload()).expect("workload boots");
    let mut engine = ExecutionEngine::new(state, &CoreConfig::bare());
    engine.start().expect("execution thread spawns");
    thread::sleep(ENGINE_RUN);
    engine.stop();
    println!(
        "{label:<12} engine:   {:>12.0} instr/s",
        engine.steps() as f64 / ENGINE_RUN.as_secs_f64()
    );
}

fn main() {
    measure_sync::<MutableState>("mutable");
    measure_sync::<PersistentState>("persistent");
    measure_engine::<MutableState>("mutable");
    measure_engine::<PersistentState>("persistent");
}
