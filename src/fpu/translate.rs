// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Arithmetic trap translation
//!
//! Turns the pending exception flags of the faulting thread into the one
//! exception kind reported with `SIGFPE`.

use tracing::{debug, error};

use crate::fpu::owner::{NpxCpu, OwnerState};
use crate::fpu::state::SW_TRAP_CLEAR_MASK;
use crate::fpu::table::{adjusted_status, classify, ExceptionKind};
use crate::sched::ThreadFpu;
use crate::sync::CriticalGuard;
use crate::traits::{CriticalSection, FpuHardware};

impl<H: FpuHardware, C: CriticalSection> NpxCpu<H, C> {
    /// Classify the arithmetic trap taken by `td`
    ///
    /// The status is read from the registers when `td` owns them and from
    /// its control block otherwise (something flushed it between the fault
    /// and this handler). The raw status word is latched in the control
    /// block and the pending flags are cleared so the trap is not raised
    /// again on return.
    ///
    /// # Panics
    ///
    /// If no FPU exists.
    pub fn translate_trap(&mut self, td: &mut ThreadFpu) -> ExceptionKind {
        if !self.info.exists {
            error!(thread = td.id(), "arithmetic fpu trap without an fpu");
            panic!("npxtrap from nowhere");
        }

        let (control, status) = {
            let _guard = CriticalGuard::enter(&self.critical);
            let live = self.owner == OwnerState::Owned(td.id());

            let (control, status) = if live {
                (self.hw.read_control_word(), self.hw.read_status_word())
            } else {
                let save = td.save_area();
                (save.control_word(), save.status_word())
            };

            let save = td.save_area_mut();
            save.set_exception_status(status);
            if live {
                self.hw.clear_pending_exceptions();
            } else {
                save.set_status_word(status & !SW_TRAP_CLEAR_MASK);
            }

            (control, status)
        };

        let kind = classify(adjusted_status(status, control));
        debug!(thread = td.id(), control, status, ?kind, "fpu trap translated");
        kind
    }
}
