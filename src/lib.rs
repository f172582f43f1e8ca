// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! # Rustux NPX - lazy x87 FPU context switching
//!
//! Each CPU has a single FPU register file shared by every thread scheduled
//! on it. Saving and restoring it on every context switch is expensive, so
//! the driver defers the work:
//!
//! - When a thread is switched out, its live FPU state (if any) is flushed
//!   into its control block and the device-not-available trap is armed.
//! - The first FPU instruction of the next thread traps; the handler loads
//!   that thread's state and disarms the trap.
//! - An unmasked arithmetic exception traps separately; the pending flags
//!   are reduced to one `SIGFPE` sub-code through a fixed priority table.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── arch/amd64/     # x87/FXSR instructions, CR0/CR4 bits, cli/sti
//! ├── fpu/            # save areas, priority table, ownership, traps, lifecycle
//! ├── interrupt/      # #NM / #MF dispatch and signal hand-off
//! ├── sched/          # FPU part of the thread control block
//! ├── sync/           # interrupt-off critical section guard
//! ├── config.rs       # boot-time configuration
//! ├── error.rs        # probe errors
//! └── traits.rs       # hardware, critical section, signal delivery
//! ```
//!
//! ## Using the driver
//!
//! ```ignore
//! use npx::arch::amd64::{cpu_features, InterruptMask, X86Fpu};
//! use npx::{boot_probe, NpxConfig, NpxCpu, NpxInfo};
//!
//! let config = NpxConfig::default();
//! let info = boot_probe(cpu_features(), &config).unwrap_or(NpxInfo::absent());
//! let mut cpu = NpxCpu::attach(X86Fpu::new(), InterruptMask, info, &config);
//!
//! // scheduler: thread switched out
//! cpu.flush(&mut old_thread.fpu);
//! // #NM
//! cpu.on_device_not_available_trap(&mut current.fpu);
//! ```

#![cfg_attr(not(test), no_std)]

// Core traits and types
pub mod traits;

// Architecture-specific modules
pub mod arch;

// FPU driver core
pub mod fpu;

// Trap dispatch
pub mod interrupt;

// Thread control block FPU state
pub mod sched;

// Synchronization primitives
pub mod sync;

// Configuration and errors
pub mod config;
pub mod error;

// Testing infrastructure
#[cfg(test)]
pub mod testing;

// Re-export commonly used types
pub use traits::{CriticalSection, FpuHardware, SignalDelivery};

pub use config::{FormatPreference, NpxConfig};
pub use error::NpxError;

pub use fpu::{
    adjusted_status, boot_probe, classify, npx_info, probe, CpuFeatures, ExceptionKind, FpOwned,
    NpxCpu, NpxInfo, OwnerState, SaveFormat, SavedFpuContext,
};

pub use interrupt::{FpuTrap, FpuTrapHandler, TrapOutcome};

pub use sched::{ThreadFpu, ThreadId};

pub use sync::{CriticalGuard, NoPreempt};

// Integration tests (only compiled in test mode)
#[cfg(test)]
mod tests;
