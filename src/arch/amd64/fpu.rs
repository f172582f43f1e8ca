// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86-64 FPU hardware access
//!
//! CR0.TS is the trap bit: while set, the first x87/SSE instruction raises
//! `#NM`. CR0.MP makes `wait`/`fwait` honour TS as well and CR0.NE selects
//! native `#MF` error reporting instead of the legacy IRQ13 path.

use x86_64::registers::control::{Cr0, Cr0Flags, Cr4, Cr4Flags};

use super::registers::{self, cpuid_edx};
use crate::fpu::device::CpuFeatures;
use crate::fpu::state::{SaveFormat, SavedFpuContext};
use crate::traits::FpuHardware;

/// Read the FPU-related CPUID bits
pub fn cpu_features() -> CpuFeatures {
    #[allow(unused_unsafe)]
    let leaf = unsafe { core::arch::x86_64::__cpuid(1) };

    CpuFeatures {
        fpu: leaf.edx & cpuid_edx::FPU != 0,
        fxsr: leaf.edx & cpuid_edx::FXSR != 0,
    }
}

/// The FPU of the executing CPU
///
/// Zero-sized: every method acts on whichever CPU runs it, so a value must
/// only be used from the CPU whose `NpxCpu` holds it.
#[derive(Debug, Default)]
pub struct X86Fpu;

impl X86Fpu {
    pub const fn new() -> Self {
        Self
    }

    /// Whether CR0.TS is currently set
    pub fn trap_armed(&self) -> bool {
        Cr0::read().contains(Cr0Flags::TASK_SWITCHED)
    }
}

impl FpuHardware for X86Fpu {
    fn configure(&mut self, format: SaveFormat) {
        unsafe {
            Cr0::update(|flags| {
                flags.remove(Cr0Flags::EMULATE_COPROCESSOR);
                flags.insert(Cr0Flags::MONITOR_COPROCESSOR | Cr0Flags::NUMERIC_ERROR);
            });
            if format == SaveFormat::Extended {
                Cr4::update(|flags| {
                    flags.insert(Cr4Flags::OSFXSR | Cr4Flags::OSXMMEXCPT_ENABLE);
                });
            }
        }
    }

    fn save_full_state(&mut self, dest: &mut SavedFpuContext) {
        unsafe {
            match dest {
                SavedFpuContext::Legacy(area) => registers::fnsave(area),
                SavedFpuContext::Extended(area) => {
                    // fxsave leaves the registers intact
                    registers::fxsave(area);
                    registers::fninit();
                }
            }
        }
    }

    fn restore_full_state(&mut self, src: &SavedFpuContext) {
        unsafe {
            match src {
                SavedFpuContext::Legacy(area) => registers::frstor(area),
                SavedFpuContext::Extended(area) => registers::fxrstor(area),
            }
        }
    }

    fn load_control_word(&mut self, cw: u16) {
        unsafe { registers::fldcw(cw) }
    }

    fn read_control_word(&mut self) -> u16 {
        unsafe { registers::fnstcw() }
    }

    fn read_status_word(&mut self) -> u16 {
        unsafe { registers::fnstsw() }
    }

    fn clear_pending_exceptions(&mut self) {
        unsafe { registers::fnclex() }
    }

    fn initialize(&mut self) {
        unsafe { registers::fninit() }
    }

    fn arm_trap_on_next_use(&mut self) {
        unsafe { Cr0::update(|flags| flags.insert(Cr0Flags::TASK_SWITCHED)) }
    }

    fn disarm_trap(&mut self) {
        unsafe { registers::clts() }
    }
}
