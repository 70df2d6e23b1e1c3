#![no_main]

use dcpu_core::{
    boot_from_bytes, disassemble, fetch_decode, step, CoreConfig, MutableState, PersistentState,
    Register, State, StepOutcome,
};
use libfuzzer_sys::fuzz_target;

const MAX_STEPS: usize = 256;

fuzz_target!(|data: &[u8]| {
    let config = CoreConfig::default();
    let Ok(mut mutable) = boot_from_bytes::<MutableState>(&config, data) else {
        return;
    };
    let Ok(mut persistent) = boot_from_bytes::<PersistentState>(&config, data) else {
        return;
    };

    let _ = disassemble(&mutable, 0, 16);

    for _ in 0..MAX_STEPS {
        let decoded = fetch_decode(&mutable);
        let before = persistent.clone();

        let left = step(&mut mutable);
        let right = step(&mut persistent);
        assert_eq!(left, right);
        assert_eq!(decoded.is_err(), matches!(left, StepOutcome::Fault { .. }));

        for reg in Register::ALL {
            assert_eq!(mutable.register(reg), persistent.register(reg));
        }
        if left.fault().is_some() {
            assert_eq!(persistent.pc(), before.pc());
            break;
        }
    }
});
