// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Lazy FPU ownership
//!
//! Each CPU has one register file and an owner record saying whose state
//! it currently holds. A thread that is not the owner has its state in its
//! control block; the owner's saved copy is stale until it is flushed.
//!
//! The trap bit (CR0.TS on x86) is armed whenever there is no owner, so the
//! first FPU instruction of the next thread lands in [`NpxCpu::on_first_use`]
//! and installs that thread's state. Every transition runs inside a
//! [`CriticalGuard`] so an interrupt cannot observe an owner record that
//! disagrees with the registers.

use tracing::{debug, error, warn};

use crate::config::NpxConfig;
use crate::error::NpxError;
use crate::fpu::device::NpxInfo;
use crate::fpu::state::{SaveFormat, SavedFpuContext};
use crate::sched::{ThreadFpu, ThreadId};
use crate::sync::CriticalGuard;
use crate::traits::{CriticalSection, FpuHardware};

/// Owner record of one CPU's register file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerState {
    /// Registers belong to nobody; the trap is armed
    Idle,
    /// Registers hold this thread's live state
    Owned(ThreadId),
}

/// Where [`NpxCpu::get_regs`] found the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpOwned {
    /// Thread never used the FPU; the clean state was returned
    None,
    /// Copied from the live registers
    Fpu,
    /// Copied from the thread's control block
    Pcb,
}

/// Per-CPU FPU driver state
///
/// Kernels keep one of these in their per-CPU block and pass it by
/// reference to the trap and scheduler hooks.
pub struct NpxCpu<H: FpuHardware, C: CriticalSection> {
    pub(crate) hw: H,
    pub(crate) critical: C,
    pub(crate) info: NpxInfo,
    pub(crate) owner: OwnerState,
    pub(crate) clean_state: SavedFpuContext,
    pub(crate) warn_masked_on_exit: bool,
}

impl<H: FpuHardware, C: CriticalSection> NpxCpu<H, C> {
    /// Build the per-CPU state without touching the hardware
    ///
    /// Use [`NpxCpu::attach`] to also program the FPU.
    pub fn new(hw: H, critical: C, info: NpxInfo, config: &NpxConfig) -> Self {
        let mut clean_state = info.format.new_context();
        clean_state.set_control_word(config.initial_control_word);
        Self {
            hw,
            critical,
            info,
            owner: OwnerState::Idle,
            clean_state,
            warn_masked_on_exit: config.warn_masked_on_exit,
        }
    }

    /// Boot-time facts this CPU runs with
    pub fn info(&self) -> NpxInfo {
        self.info
    }

    /// Current owner record
    pub fn state(&self) -> OwnerState {
        self.owner
    }

    /// Thread whose state is live in the registers, if any
    pub fn owner(&self) -> Option<ThreadId> {
        match self.owner {
            OwnerState::Idle => None,
            OwnerState::Owned(id) => Some(id),
        }
    }

    pub fn is_owner(&self, id: ThreadId) -> bool {
        self.owner == OwnerState::Owned(id)
    }

    /// State installed for threads that never used the FPU
    pub fn clean_state(&self) -> &SavedFpuContext {
        &self.clean_state
    }

    pub fn hardware(&self) -> &H {
        &self.hw
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hw
    }

    /// Device-not-available handler: make `td` the owner
    ///
    /// # Panics
    ///
    /// If no FPU exists, or if the registers already have an owner. Either
    /// means the trap fired when it could not have been armed.
    pub fn on_first_use(&mut self, td: &mut ThreadFpu) {
        if !self.info.exists {
            error!(thread = td.id(), "device-not-available trap without an fpu");
            panic!("npxdna: no fpu");
        }

        let _guard = CriticalGuard::enter(&self.critical);

        if let OwnerState::Owned(owner) = self.owner {
            error!(owner, thread = td.id(), "device-not-available trap with a live owner");
            panic!("npxdna: fpu owned by {}, trap from {}", owner, td.id());
        }

        debug_assert_eq!(td.save_area().format(), self.info.format);

        self.hw.disarm_trap();

        // Record the owner before loading: a pending error in the image
        // can be reported as soon as the registers are restored.
        self.owner = OwnerState::Owned(td.id());

        if td.init_done() {
            self.hw.restore_full_state(td.save_area());
        } else {
            self.hw.restore_full_state(&self.clean_state);
            if td.initial_control_word() != self.clean_state.control_word() {
                self.hw.load_control_word(td.initial_control_word());
            }
            td.set_init_done(true);
        }

        debug!(thread = td.id(), "fpu state installed");
    }

    /// Save `td`'s live state into its control block and release the FPU
    ///
    /// Does nothing when `td` is not the owner: its control block is
    /// already authoritative.
    pub fn flush(&mut self, td: &mut ThreadFpu) {
        let _guard = CriticalGuard::enter(&self.critical);

        if self.owner != OwnerState::Owned(td.id()) {
            return;
        }

        self.hw.disarm_trap();
        self.hw.save_full_state(td.save_area_mut());
        self.hw.arm_trap_on_next_use();
        self.owner = OwnerState::Idle;

        debug!(thread = td.id(), "fpu state flushed");
    }

    /// Reset `td`'s FPU state to a clean FPU with `control_word`
    ///
    /// Whatever is live in the registers is thrown away. The clean image is
    /// written to `td`'s control block and the trap is left armed, so `td`
    /// picks it up on its next FPU instruction.
    pub fn reinit(&mut self, control_word: u16, td: &mut ThreadFpu) {
        if !self.info.exists {
            return;
        }

        let _guard = CriticalGuard::enter(&self.critical);

        if let OwnerState::Owned(owner) = self.owner {
            if owner != td.id() {
                warn!(owner, thread = td.id(), "reinit discards another thread's fpu state");
            }
        }

        let mut scratch = self.info.format.new_context();
        self.hw.disarm_trap();
        self.hw.save_full_state(&mut scratch);
        self.owner = OwnerState::Idle;

        self.hw.initialize();
        self.hw.load_control_word(control_word);
        self.hw.save_full_state(td.save_area_mut());
        self.hw.arm_trap_on_next_use();

        td.save_area_mut().set_exception_status(0);
        td.set_initial_control_word(control_word);
        td.set_init_done(true);

        debug!(thread = td.id(), control_word, "fpu state reinitialized");
    }

    /// Discard `td`'s FPU state without saving it
    ///
    /// The next FPU instruction of `td` starts from the clean state.
    pub fn drop_state(&mut self, td: &mut ThreadFpu) {
        let _guard = CriticalGuard::enter(&self.critical);

        if self.owner == OwnerState::Owned(td.id()) {
            if self.info.format == SaveFormat::Legacy {
                // frstor waits: pending unmasked exceptions would fault it
                self.hw.disarm_trap();
                self.hw.clear_pending_exceptions();
            }
            self.owner = OwnerState::Idle;
            self.hw.arm_trap_on_next_use();
        }
        td.set_init_done(false);
    }

    /// Copy `td`'s current FPU state into `out`
    ///
    /// Ownership is left unchanged: when the state is live it is saved and
    /// immediately restored.
    pub fn get_regs(&mut self, td: &ThreadFpu, out: &mut SavedFpuContext) -> FpOwned {
        if !self.info.exists {
            return FpOwned::None;
        }

        if !td.init_done() {
            *out = self.clean_state;
            out.set_control_word(td.initial_control_word());
            return FpOwned::None;
        }

        let _guard = CriticalGuard::enter(&self.critical);

        if self.owner == OwnerState::Owned(td.id()) {
            *out = self.info.format.new_context();
            self.hw.save_full_state(out);
            self.hw.restore_full_state(out);
            out.set_exception_status(td.pending_exception_status());
            FpOwned::Fpu
        } else {
            *out = *td.save_area();
            FpOwned::Pcb
        }
    }

    /// Replace `td`'s FPU state with `src`
    pub fn set_regs(&mut self, td: &mut ThreadFpu, src: &SavedFpuContext) -> Result<(), NpxError> {
        if !self.info.exists {
            return Ok(());
        }
        if src.format() != self.info.format {
            return Err(NpxError::FormatMismatch);
        }

        let _guard = CriticalGuard::enter(&self.critical);

        if self.owner == OwnerState::Owned(td.id()) {
            if self.info.format == SaveFormat::Legacy {
                self.hw.clear_pending_exceptions();
            }
            self.hw.restore_full_state(src);
        } else {
            *td.save_area_mut() = *src;
        }
        td.set_init_done(true);
        Ok(())
    }
}
