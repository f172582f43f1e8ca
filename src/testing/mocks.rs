// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Test doubles for the collaborator traits

use core::cell::Cell;

use mockall::mock;

use crate::fpu::state::{SaveFormat, SavedFpuContext};
use crate::sched::ThreadId;
use crate::traits::{CriticalSection, FpuHardware, SignalDelivery};

mock! {
    pub Fpu {}
    impl FpuHardware for Fpu {
        fn configure(&mut self, format: SaveFormat);
        fn save_full_state(&mut self, dest: &mut SavedFpuContext);
        fn restore_full_state(&mut self, src: &SavedFpuContext);
        fn load_control_word(&mut self, cw: u16);
        fn read_control_word(&mut self) -> u16;
        fn read_status_word(&mut self) -> u16;
        fn clear_pending_exceptions(&mut self);
        fn initialize(&mut self);
        fn arm_trap_on_next_use(&mut self);
        fn disarm_trap(&mut self);
    }
}

/// Critical section that records nesting instead of masking interrupts
#[derive(Debug, Default)]
pub struct CountingCritical {
    depth: Cell<usize>,
    entries: Cell<usize>,
}

impl CountingCritical {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    pub fn entries(&self) -> usize {
        self.entries.get()
    }

    pub fn is_inside(&self) -> bool {
        self.depth.get() > 0
    }
}

impl CriticalSection for CountingCritical {
    fn enter(&self) -> bool {
        let previous = self.depth.get() > 0;
        self.depth.set(self.depth.get() + 1);
        self.entries.set(self.entries.get() + 1);
        previous
    }

    fn exit(&self, _previous: bool) {
        assert!(self.depth.get() > 0, "critical section exit without enter");
        self.depth.set(self.depth.get() - 1);
    }
}

/// Signal delivery that records what was posted
#[derive(Debug, Default)]
pub struct RecordingSignals {
    pub delivered: Vec<(ThreadId, i32)>,
}

impl SignalDelivery for RecordingSignals {
    fn deliver_sigfpe(&mut self, thread: ThreadId, code: i32) {
        self.delivered.push((thread, code));
    }
}
