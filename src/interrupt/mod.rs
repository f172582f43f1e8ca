// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! FPU trap dispatch
//!
//! Routes the two FPU exception vectors to the per-CPU driver state and
//! forwards arithmetic faults to signal delivery.

use tracing::debug;

use crate::fpu::{ExceptionKind, NpxCpu};
use crate::sched::ThreadFpu;
use crate::traits::{CriticalSection, FpuHardware, SignalDelivery};

/// x86 exception vectors owned by the FPU driver
pub mod exception_vector {
    /// `#NM` device not available
    pub const DEVICE_NA: u64 = 7;
    /// `#MF` x87 floating point error
    pub const X87_FP_ERROR: u64 = 16;
}

/// FPU trap kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FpuTrap {
    /// FPU instruction with the trap armed
    DeviceNotAvailable,
    /// Unmasked arithmetic exception
    MathFault,
}

impl FpuTrap {
    /// Map an exception vector, or `None` if the FPU driver does not own it
    pub fn from_vector(vector: u64) -> Option<Self> {
        match vector {
            exception_vector::DEVICE_NA => Some(FpuTrap::DeviceNotAvailable),
            exception_vector::X87_FP_ERROR => Some(FpuTrap::MathFault),
            _ => None,
        }
    }
}

/// What the trap did to the interrupted thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapOutcome {
    /// State installed; the faulting instruction is retried
    Resume,
    /// `SIGFPE` posted with this exception
    Signalled(ExceptionKind),
    /// Nothing unmasked was pending; no signal
    Spurious,
}

/// FPU trap handler bound to a signal delivery path
pub struct FpuTrapHandler<S: SignalDelivery> {
    signals: S,
}

impl<S: SignalDelivery> FpuTrapHandler<S> {
    /// Create a new trap handler with the given signal delivery
    pub fn new(signals: S) -> Self {
        Self { signals }
    }

    pub fn signals(&self) -> &S {
        &self.signals
    }

    pub fn signals_mut(&mut self) -> &mut S {
        &mut self.signals
    }

    /// Handle an FPU trap taken by `td` on `cpu`
    pub fn handle<H: FpuHardware, C: CriticalSection>(
        &mut self,
        cpu: &mut NpxCpu<H, C>,
        trap: FpuTrap,
        td: &mut ThreadFpu,
    ) -> TrapOutcome {
        match trap {
            FpuTrap::DeviceNotAvailable => {
                cpu.on_device_not_available_trap(td);
                TrapOutcome::Resume
            }
            FpuTrap::MathFault => {
                let kind = cpu.on_arithmetic_exception_trap(td);
                if kind.is_none() {
                    debug!(thread = td.id(), "spurious fpu trap");
                    return TrapOutcome::Spurious;
                }
                self.signals.deliver_sigfpe(td.id(), kind.signal_code());
                TrapOutcome::Signalled(kind)
            }
        }
    }

    /// Handle an exception by vector number
    ///
    /// Returns `None` for vectors that are not FPU traps.
    pub fn handle_vector<H: FpuHardware, C: CriticalSection>(
        &mut self,
        cpu: &mut NpxCpu<H, C>,
        vector: u64,
        td: &mut ThreadFpu,
    ) -> Option<TrapOutcome> {
        FpuTrap::from_vector(vector).map(|trap| self.handle(cpu, trap, td))
    }
}
