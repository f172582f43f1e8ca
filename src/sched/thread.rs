// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Per-thread FPU control block
//!
//! Embedded in every thread's control block for the thread's lifetime.

use bitflags::bitflags;

use crate::fpu::state::{SaveFormat, SavedFpuContext, INITIAL_NPXCW};

/// Thread ID type
pub type ThreadId = u64;

bitflags! {
    /// FPU flags kept in the thread control block
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PcbFpuFlags: u32 {
        /// The saved context holds real state (not just the boot default)
        const INIT_DONE = 1 << 0;
    }
}

/// FPU part of a thread control block
#[derive(Debug, Clone)]
pub struct ThreadFpu {
    id: ThreadId,
    save: SavedFpuContext,
    flags: PcbFpuFlags,
    initial_cw: u16,
}

impl ThreadFpu {
    /// Create the FPU block for a new thread
    ///
    /// `format` must be the save format chosen at boot.
    pub fn new(id: ThreadId, format: SaveFormat) -> Self {
        Self {
            id,
            save: format.new_context(),
            flags: PcbFpuFlags::empty(),
            initial_cw: INITIAL_NPXCW,
        }
    }

    /// Owning thread
    pub fn id(&self) -> ThreadId {
        self.id
    }

    /// Saved context
    ///
    /// Stale while this thread owns the FPU.
    pub fn save_area(&self) -> &SavedFpuContext {
        &self.save
    }

    pub(crate) fn save_area_mut(&mut self) -> &mut SavedFpuContext {
        &mut self.save
    }

    pub fn flags(&self) -> PcbFpuFlags {
        self.flags
    }

    /// Whether the saved context has ever been initialized
    pub fn init_done(&self) -> bool {
        self.flags.contains(PcbFpuFlags::INIT_DONE)
    }

    pub(crate) fn set_init_done(&mut self, done: bool) {
        self.flags.set(PcbFpuFlags::INIT_DONE, done);
    }

    /// Control word installed on first FPU use
    pub fn initial_control_word(&self) -> u16 {
        self.initial_cw
    }

    pub fn set_initial_control_word(&mut self, cw: u16) {
        self.initial_cw = cw;
    }

    /// Status word latched by the most recent arithmetic trap
    pub fn pending_exception_status(&self) -> u16 {
        self.save.exception_status()
    }
}

/// Create a new thread ID
pub fn new_thread_id() -> ThreadId {
    use core::sync::atomic::{AtomicU64, Ordering};

    static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

    NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed)
}
