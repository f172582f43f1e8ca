// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Interrupt masking for FPU ownership changes

use x86_64::instructions::interrupts;

use crate::traits::CriticalSection;

/// Critical section implemented with `cli`/`sti` on the current CPU
///
/// Nested sections restore whatever state the outer one saw, so only the
/// outermost exit re-enables interrupts.
#[derive(Debug, Default, Clone, Copy)]
pub struct InterruptMask;

impl CriticalSection for InterruptMask {
    fn enter(&self) -> bool {
        let enabled = interrupts::are_enabled();
        interrupts::disable();
        enabled
    }

    fn exit(&self, previous: bool) {
        if previous {
            interrupts::enable();
        }
    }
}
