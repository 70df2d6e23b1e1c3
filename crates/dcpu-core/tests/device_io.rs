//! Memory-mapped keyboard and display driven by running programs.

#![allow(clippy::pedantic, clippy::nursery)]

use std::time::Duration;

use dcpu_core::{
    boot, encode_basic, BasicOpcode, CoreConfig, Device, DeviceWrite, ExecutionEngine, InputEvent,
    MutableState, PersistentState, State, DISPLAY_ID,
};

use crossbeam_channel as _;
use parking_lot as _;
use proptest as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use thiserror as _;
use tracing as _;

const DEADLINE: Duration = Duration::from_secs(10);

/// Waits for a key, then echoes the first buffered key to the top-left cell.
fn echo_image() -> Vec<u16> {
    vec![
        // 0: IFE [0x9010], 0
        encode_basic(BasicOpcode::Ife, 0x1E, 0x20),
        0x9010,
        // 2: SET PC, 0
        encode_basic(BasicOpcode::Set, 0x1C, 0x20),
        // 3: SET [0x8000], [0x9000]
        encode_basic(BasicOpcode::Set, 0x1E, 0x1E),
        0x8000,
        0x9000,
        // 6: SUB PC, 1
        encode_basic(BasicOpcode::Sub, 0x1C, 0x21),
    ]
}

/// `ADD [0x8000], 1 ; SET PC, 0`
fn ticker_image() -> Vec<u16> {
    vec![
        encode_basic(BasicOpcode::Add, 0x1E, 0x21),
        0x8000,
        encode_basic(BasicOpcode::Set, 0x1C, 0x20),
    ]
}

#[test]
fn display_writes_are_pushed_to_observers() {
    let image = [
        encode_basic(BasicOpcode::Set, 0x1E, 0x1F),
        0x8000,
        0x0F48,
        encode_basic(BasicOpcode::Set, 0x1E, 0x1F),
        0x8001,
        0x0F69,
        encode_basic(BasicOpcode::Sub, 0x1C, 0x21),
    ];
    let state: MutableState = boot(&CoreConfig::default(), &image).expect("boots");
    let updates = state
        .device(DISPLAY_ID)
        .and_then(|display| display.observers().map(|observers| observers.subscribe()))
        .expect("display exposes observers");
    let mut engine = ExecutionEngine::new(state, &CoreConfig::default());

    engine.start().expect("thread spawns");
    let first = updates.recv_timeout(DEADLINE).expect("first cell written");
    let second = updates.recv_timeout(DEADLINE).expect("second cell written");
    engine.stop();

    assert_eq!(
        first,
        DeviceWrite {
            device: DISPLAY_ID,
            addr: 0x8000,
            old: 0,
            new: 0x0F48
        }
    );
    assert_eq!((second.addr, second.new), (0x8001, 0x0F69));
    assert!(updates.try_recv().is_err(), "halt loop writes nothing");
}

#[test]
fn key_events_reach_a_polling_program() {
    let state: PersistentState = boot(&CoreConfig::default(), &echo_image()).expect("boots");
    let updates = state
        .device(DISPLAY_ID)
        .and_then(|display| display.observers().map(|observers| observers.subscribe()))
        .expect("display exposes observers");
    let mut engine = ExecutionEngine::new(state, &CoreConfig::default());

    engine.start().expect("thread spawns");
    engine
        .post_event(InputEvent::Key(u16::from(b'Z')))
        .expect("engine alive");
    let echoed = updates.recv_timeout(DEADLINE).expect("program echoed the key");
    engine.stop();

    assert_eq!(echoed.new, u16::from(b'Z'));
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.read(0x8000), u16::from(b'Z'));
    assert_eq!(snapshot.read(0x9010), 1);
    assert_eq!(snapshot.pc(), 6);
}

#[test]
fn rewind_restores_device_contents() {
    let config = CoreConfig {
        history_capacity: 4,
        history_interval: 10,
        ..CoreConfig::default()
    };
    let state: PersistentState = boot(&config, &ticker_image()).expect("boots");
    let engine = ExecutionEngine::new(state, &config);

    for _ in 0..40 {
        engine.step_once().expect("stopped");
    }
    assert_eq!(engine.snapshot().read(0x8000), 20);

    assert_eq!(engine.rewind_to(25).expect("snapshot at 20"), 20);

    let display = engine
        .snapshot()
        .device(DISPLAY_ID)
        .expect("display mapped");
    assert_eq!(display.read(0x8000), 10);
    assert_eq!(display.contents()[0], 10);
}

#[test]
fn plain_memory_next_to_devices_is_unaffected() {
    let state: MutableState = boot(&CoreConfig::default(), &ticker_image()).expect("boots");
    let engine = ExecutionEngine::new(state, &CoreConfig::default());
    for _ in 0..6 {
        engine.step_once().expect("stopped");
    }
    let snapshot = engine.snapshot();
    assert_eq!(snapshot.read(0x8000), 3);
    assert_eq!(snapshot.read(0x7FFF), 0);
    assert_eq!(snapshot.read(0x8180), 0);
}
