// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Critical section guard
//!
//! Every change to FPU ownership runs with interrupts suppressed on the
//! current CPU. The guard restores the previous state when dropped, on
//! every exit path including unwinding out of a panic.

use crate::traits::CriticalSection;

/// RAII guard for a [`CriticalSection`]
pub struct CriticalGuard<'a, C: CriticalSection + ?Sized> {
    section: &'a C,
    previous: bool,
}

impl<'a, C: CriticalSection + ?Sized> CriticalGuard<'a, C> {
    /// Enter the critical section
    pub fn enter(section: &'a C) -> Self {
        let previous = section.enter();
        Self { section, previous }
    }

    /// State that will be restored on drop
    pub fn previous(&self) -> bool {
        self.previous
    }
}

impl<'a, C: CriticalSection + ?Sized> Drop for CriticalGuard<'a, C> {
    fn drop(&mut self) {
        self.section.exit(self.previous);
    }
}

/// Critical section that does nothing
///
/// For contexts that already run with interrupts off, such as early boot.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPreempt;

impl CriticalSection for NoPreempt {
    fn enter(&self) -> bool {
        false
    }

    fn exit(&self, _previous: bool) {}
}

// ============================================================================
// Tests
// ============================================================================
