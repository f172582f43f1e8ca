// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Collaborator traits
//!
//! The NPX core talks to three things it does not own: the FPU of the
//! current CPU, the kernel's interrupt/preemption control, and the signal
//! delivery path. Each is a trait so the core can be driven by the real
//! amd64 implementations or by test doubles.

use crate::fpu::state::{SaveFormat, SavedFpuContext};
use crate::sched::ThreadId;

/// Access to the FPU of the calling CPU
///
/// Implementations do not check that an FPU exists; callers only reach
/// these methods after the boot probe found one.
pub trait FpuHardware {
    /// Configure the CPU mode bits for the boot-time save format
    fn configure(&mut self, format: SaveFormat);

    /// Write the register file into `dest` and leave the FPU in its
    /// initialized state. The instruction follows the variant of `dest`.
    fn save_full_state(&mut self, dest: &mut SavedFpuContext);

    /// Load the register file from `src`
    fn restore_full_state(&mut self, src: &SavedFpuContext);

    /// Set the control word only
    fn load_control_word(&mut self, cw: u16);

    /// Read the live control word
    fn read_control_word(&mut self) -> u16;

    /// Read the live status word
    fn read_status_word(&mut self) -> u16;

    /// Clear latched exception flags without touching the registers
    fn clear_pending_exceptions(&mut self);

    /// Reset the FPU to its power-on state
    fn initialize(&mut self);

    /// Make the next FPU instruction raise device-not-available
    fn arm_trap_on_next_use(&mut self);

    /// Let FPU instructions execute
    fn disarm_trap(&mut self);
}

/// Interrupt/preemption control for the current CPU
pub trait CriticalSection {
    /// Suppress interrupts and preemption, returning the previous state
    fn enter(&self) -> bool;

    /// Restore the state returned by the matching [`CriticalSection::enter`]
    fn exit(&self, previous: bool);
}

/// Signal delivery to a thread
pub trait SignalDelivery {
    /// Post `SIGFPE` with the given `si_code` to `thread`
    fn deliver_sigfpe(&mut self, thread: ThreadId, code: i32);
}
