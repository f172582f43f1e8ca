// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Software model of one CPU's FPU
//!
//! Keeps the architectural state the driver moves around (control, status
//! and tag words, the eight stack registers, MXCSR) and the trap bit. Any
//! FPU instruction issued while the trap is armed fails the test, the same
//! way real hardware would raise `#NM` inside the kernel.

use crate::fpu::state::{SaveFormat, SavedFpuContext, StatusWord, INITIAL_MXCSR};
use crate::traits::FpuHardware;

/// Power-on control word (`fninit`)
pub const FNINIT_CW: u16 = 0x037F;

/// Architectural register state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftFpuRegs {
    pub cw: u16,
    pub sw: u16,
    /// Full tag word, two bits per register, `0b11` = empty
    pub tw: u16,
    pub st: [[u8; 10]; 8],
    pub mxcsr: u32,
}

impl SoftFpuRegs {
    /// State after `fninit`
    pub const fn initialized() -> Self {
        Self {
            cw: FNINIT_CW,
            sw: 0,
            tw: 0xFFFF,
            st: [[0; 10]; 8],
            mxcsr: INITIAL_MXCSR,
        }
    }

    fn abridged_tags(&self) -> u8 {
        (0..8).fold(0u8, |acc, i| {
            let empty = (self.tw >> (i * 2)) & 0b11 == 0b11;
            if empty { acc } else { acc | (1 << i) }
        })
    }

    fn full_tags(abridged: u8) -> u16 {
        (0..8).fold(0u16, |acc, i| {
            if abridged & (1 << i) != 0 { acc } else { acc | (0b11 << (i * 2)) }
        })
    }
}

/// Simulated FPU implementing [`FpuHardware`]
#[derive(Debug, Clone)]
pub struct SoftFpu {
    pub regs: SoftFpuRegs,
    trap_armed: bool,
    configured: Option<SaveFormat>,
    saves: usize,
    restores: usize,
}

impl SoftFpu {
    /// A powered-on FPU with the trap disarmed
    pub fn new() -> Self {
        Self {
            regs: SoftFpuRegs::initialized(),
            trap_armed: false,
            configured: None,
            saves: 0,
            restores: 0,
        }
    }

    pub fn trap_armed(&self) -> bool {
        self.trap_armed
    }

    pub fn configured(&self) -> Option<SaveFormat> {
        self.configured
    }

    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn restores(&self) -> usize {
        self.restores
    }

    /// Load a value into stack register `i` and tag it valid
    pub fn load_value(&mut self, i: usize, bytes: [u8; 10]) {
        self.regs.st[i] = bytes;
        self.regs.tw &= !(0b11 << (i * 2));
    }

    /// Latch exception flags as a faulting instruction would
    ///
    /// The error summary is set only for exceptions the control word
    /// leaves unmasked.
    pub fn raise(&mut self, flags: StatusWord) {
        self.regs.sw |= flags.bits();
        if flags.bits() & !self.regs.cw & 0x3F != 0 {
            self.regs.sw |= StatusWord::ES.bits();
        }
    }

    /// An unmasked exception is waiting for the next waiting instruction
    pub fn error_pending(&self) -> bool {
        self.regs.sw & StatusWord::ES.bits() != 0
    }

    fn check_usable(&self, what: &str) {
        assert!(!self.trap_armed, "{} executed with the fpu trap armed", what);
    }
}

impl Default for SoftFpu {
    fn default() -> Self {
        Self::new()
    }
}

impl FpuHardware for SoftFpu {
    fn configure(&mut self, format: SaveFormat) {
        self.configured = Some(format);
    }

    fn save_full_state(&mut self, dest: &mut SavedFpuContext) {
        self.check_usable("save");
        let regs = &self.regs;
        match dest {
            SavedFpuContext::Legacy(area) => {
                area.env.cw = (area.env.cw & !0xFFFF) | regs.cw as u32;
                area.env.sw = (area.env.sw & !0xFFFF) | regs.sw as u32;
                area.env.tw = (area.env.tw & !0xFFFF) | regs.tw as u32;
                for (slot, value) in area.acc.iter_mut().zip(regs.st.iter()) {
                    slot.bytes = *value;
                }
            }
            SavedFpuContext::Extended(area) => {
                area.env.cw = regs.cw;
                area.env.sw = regs.sw;
                area.env.tw = regs.abridged_tags();
                area.env.mxcsr = regs.mxcsr;
                for (slot, value) in area.fp.iter_mut().zip(regs.st.iter()) {
                    slot.acc.bytes = *value;
                }
            }
        }
        self.regs = SoftFpuRegs::initialized();
        self.saves += 1;
    }

    fn restore_full_state(&mut self, src: &SavedFpuContext) {
        self.check_usable("restore");
        match src {
            SavedFpuContext::Legacy(area) => {
                assert!(!self.error_pending(), "frstor with an unmasked exception pending");
                self.regs.cw = area.env.cw as u16;
                self.regs.sw = area.env.sw as u16;
                self.regs.tw = area.env.tw as u16;
                for (value, slot) in self.regs.st.iter_mut().zip(area.acc.iter()) {
                    *value = slot.bytes;
                }
            }
            SavedFpuContext::Extended(area) => {
                self.regs.cw = area.env.cw;
                self.regs.sw = area.env.sw;
                self.regs.tw = SoftFpuRegs::full_tags(area.env.tw);
                self.regs.mxcsr = area.env.mxcsr;
                for (value, slot) in self.regs.st.iter_mut().zip(area.fp.iter()) {
                    *value = slot.acc.bytes;
                }
            }
        }
        self.restores += 1;
    }

    fn load_control_word(&mut self, cw: u16) {
        self.check_usable("fldcw");
        self.regs.cw = cw;
    }

    fn read_control_word(&mut self) -> u16 {
        self.check_usable("fnstcw");
        self.regs.cw
    }

    fn read_status_word(&mut self) -> u16 {
        self.check_usable("fnstsw");
        self.regs.sw
    }

    fn clear_pending_exceptions(&mut self) {
        self.check_usable("fnclex");
        self.regs.sw &= !0x80FF;
    }

    fn initialize(&mut self) {
        self.check_usable("fninit");
        let mxcsr = self.regs.mxcsr;
        self.regs = SoftFpuRegs::initialized();
        self.regs.mxcsr = mxcsr;
    }

    fn arm_trap_on_next_use(&mut self) {
        self.trap_armed = true;
    }

    fn disarm_trap(&mut self) {
        self.trap_armed = false;
    }
}
