// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! FPU save areas
//!
//! The hardware dumps its register file in one of two layouts: the legacy
//! `fnsave` image (27 dwords of environment and stack registers) or the
//! 512-byte `fxsave` image. Which one is used is decided once at boot, so
//! every thread's context is created with the boot format and the save and
//! restore paths dispatch on the enum tag instead of reinterpreting bytes.

use bitflags::bitflags;

/// Initial control word for a 64-bit kernel (all exceptions masked,
/// 64-bit precision, round to nearest)
pub const INITIAL_NPXCW: u16 = 0x037F;

/// Initial control word used by 32-bit kernels (53-bit precision)
pub const INITIAL_NPXCW_I386: u16 = 0x127F;

/// MXCSR after reset (all SSE exceptions masked)
pub const INITIAL_MXCSR: u32 = 0x1F80;

/// Status word bits cleared once a trap has been taken:
/// the six exception flags, the error summary and busy. Stack fault is left set.
pub const SW_TRAP_CLEAR_MASK: u16 = 0x80BF;

bitflags! {
    /// x87 control word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlWord: u16 {
        /// Invalid operation masked
        const IM = 1 << 0;
        /// Denormal operand masked
        const DM = 1 << 1;
        /// Divide-by-zero masked
        const ZM = 1 << 2;
        /// Overflow masked
        const OM = 1 << 3;
        /// Underflow masked
        const UM = 1 << 4;
        /// Precision (inexact) masked
        const PM = 1 << 5;
        /// Precision control (2 bits)
        const PC = 3 << 8;
        /// Rounding control (2 bits)
        const RC = 3 << 10;
        /// Infinity control (287 compatibility)
        const IC = 1 << 12;

        /// All six exception mask bits
        const ALL_MASKS = 0x3F;
    }
}

bitflags! {
    /// x87 status word
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct StatusWord: u16 {
        /// Invalid operation
        const IE = 1 << 0;
        /// Denormal operand
        const DE = 1 << 1;
        /// Divide by zero
        const ZE = 1 << 2;
        /// Overflow
        const OE = 1 << 3;
        /// Underflow
        const UE = 1 << 4;
        /// Precision (inexact result)
        const PE = 1 << 5;
        /// Stack fault
        const SF = 1 << 6;
        /// Error summary
        const ES = 1 << 7;
        const C0 = 1 << 8;
        const C1 = 1 << 9;
        const C2 = 1 << 10;
        /// Top of stack pointer (3 bits)
        const TOP = 7 << 11;
        const C3 = 1 << 14;
        /// FPU busy
        const B = 1 << 15;
    }
}

/// One 80-bit stack register
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpAcc87 {
    pub bytes: [u8; 10],
}

/// Environment block written by `fnsave`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Env87 {
    /// Control word (low 16 bits)
    pub cw: u32,
    /// Status word (low 16 bits)
    pub sw: u32,
    /// Full tag word (low 16 bits)
    pub tw: u32,
    pub fip: u32,
    pub fcs: u16,
    pub opcode: u16,
    pub foo: u32,
    pub fos: u32,
}

/// Legacy save area
///
/// The first 108 bytes are exactly what `fnsave`/`frstor` touch.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Save87 {
    pub env: Env87,
    pub acc: [FpAcc87; 8],
    /// Status word latched at the last arithmetic trap
    pub ex_sw: u32,
    pub pad: [u8; 64],
}

impl Save87 {
    /// Image of a freshly initialized FPU (`fninit` state)
    pub const fn new() -> Self {
        Self {
            env: Env87 {
                cw: INITIAL_NPXCW as u32,
                sw: 0,
                tw: 0xFFFF,
                fip: 0,
                fcs: 0,
                opcode: 0,
                foo: 0,
                fos: 0,
            },
            acc: [FpAcc87 { bytes: [0; 10] }; 8],
            ex_sw: 0,
            pad: [0; 64],
        }
    }
}

impl Default for Save87 {
    fn default() -> Self {
        Self::new()
    }
}

/// Environment block written by `fxsave`
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvXmm {
    pub cw: u16,
    pub sw: u16,
    /// Abridged tag word (one bit per register)
    pub tw: u8,
    pub reserved: u8,
    pub opcode: u16,
    pub fip: u32,
    pub fcs: u16,
    pub pad0: u16,
    pub foo: u32,
    pub fos: u16,
    pub pad1: u16,
    pub mxcsr: u32,
    pub mxcsr_mask: u32,
}

/// Stack register slot in the extended image (padded to 16 bytes)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FpAccXmm {
    pub acc: FpAcc87,
    pub pad: [u8; 6],
}

/// Extended (`fxsave`) save area
#[repr(C, align(16))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveXmm {
    pub env: EnvXmm,
    pub fp: [FpAccXmm; 8],
    pub xmm: [[u8; 16]; 16],
    pub reserved: [u8; 48],
    /// Status word latched at the last arithmetic trap.
    /// Lives in the software-available tail that `fxsave` never writes.
    pub ex_sw: u32,
    pub pad: [u8; 44],
}

impl SaveXmm {
    /// Image of a freshly initialized FPU
    pub const fn new() -> Self {
        Self {
            env: EnvXmm {
                cw: INITIAL_NPXCW,
                sw: 0,
                tw: 0,
                reserved: 0,
                opcode: 0,
                fip: 0,
                fcs: 0,
                pad0: 0,
                foo: 0,
                fos: 0,
                pad1: 0,
                mxcsr: INITIAL_MXCSR,
                mxcsr_mask: 0,
            },
            fp: [FpAccXmm { acc: FpAcc87 { bytes: [0; 10] }, pad: [0; 6] }; 8],
            xmm: [[0; 16]; 16],
            reserved: [0; 48],
            ex_sw: 0,
            pad: [0; 44],
        }
    }
}

impl Default for SaveXmm {
    fn default() -> Self {
        Self::new()
    }
}

const _: () = assert!(core::mem::size_of::<Env87>() == 28);
const _: () = assert!(core::mem::size_of::<Save87>() == 176);
const _: () = assert!(core::mem::size_of::<EnvXmm>() == 32);
const _: () = assert!(core::mem::size_of::<SaveXmm>() == 512);
const _: () = assert!(core::mem::align_of::<SaveXmm>() == 16);

/// Save area layout, fixed at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveFormat {
    /// `fnsave`/`frstor`
    Legacy,
    /// `fxsave`/`fxrstor`
    Extended,
}

impl SaveFormat {
    /// A context in this format holding the `fninit` state
    pub const fn new_context(self) -> SavedFpuContext {
        match self {
            SaveFormat::Legacy => SavedFpuContext::Legacy(Save87::new()),
            SaveFormat::Extended => SavedFpuContext::Extended(SaveXmm::new()),
        }
    }
}

/// A thread's saved FPU state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavedFpuContext {
    Legacy(Save87),
    Extended(SaveXmm),
}

impl SavedFpuContext {
    /// Layout of this context
    pub fn format(&self) -> SaveFormat {
        match self {
            SavedFpuContext::Legacy(_) => SaveFormat::Legacy,
            SavedFpuContext::Extended(_) => SaveFormat::Extended,
        }
    }

    /// Saved control word
    pub fn control_word(&self) -> u16 {
        match self {
            SavedFpuContext::Legacy(s) => s.env.cw as u16,
            SavedFpuContext::Extended(s) => s.env.cw,
        }
    }

    pub fn set_control_word(&mut self, cw: u16) {
        match self {
            SavedFpuContext::Legacy(s) => s.env.cw = (s.env.cw & !0xFFFF) | cw as u32,
            SavedFpuContext::Extended(s) => s.env.cw = cw,
        }
    }

    /// Saved status word
    pub fn status_word(&self) -> u16 {
        match self {
            SavedFpuContext::Legacy(s) => s.env.sw as u16,
            SavedFpuContext::Extended(s) => s.env.sw,
        }
    }

    pub fn set_status_word(&mut self, sw: u16) {
        match self {
            SavedFpuContext::Legacy(s) => s.env.sw = (s.env.sw & !0xFFFF) | sw as u32,
            SavedFpuContext::Extended(s) => s.env.sw = sw,
        }
    }

    /// Status word latched by the last arithmetic trap
    pub fn exception_status(&self) -> u16 {
        match self {
            SavedFpuContext::Legacy(s) => s.ex_sw as u16,
            SavedFpuContext::Extended(s) => s.ex_sw as u16,
        }
    }

    pub fn set_exception_status(&mut self, sw: u16) {
        match self {
            SavedFpuContext::Legacy(s) => s.ex_sw = sw as u32,
            SavedFpuContext::Extended(s) => s.ex_sw = sw as u32,
        }
    }

    /// Stack register `i` (physical order)
    ///
    /// # Panics
    ///
    /// If `i` is not in `0..8`.
    pub fn register(&self, i: usize) -> [u8; 10] {
        match self {
            SavedFpuContext::Legacy(s) => s.acc[i].bytes,
            SavedFpuContext::Extended(s) => s.fp[i].acc.bytes,
        }
    }

    /// Overwrite stack register `i`
    ///
    /// # Panics
    ///
    /// If `i` is not in `0..8`.
    pub fn set_register(&mut self, i: usize, bytes: [u8; 10]) {
        match self {
            SavedFpuContext::Legacy(s) => s.acc[i].bytes = bytes,
            SavedFpuContext::Extended(s) => s.fp[i].acc.bytes = bytes,
        }
    }
}
