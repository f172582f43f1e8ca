// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! NPX device lifecycle
//!
//! Probing decides once per boot whether there is an FPU and which save
//! format the whole machine uses. Attaching programs each CPU's mode bits
//! and captures the clean state new threads start from. The remaining entry
//! points are the hooks the scheduler and trap dispatch call into.

use spin::Once;
use tracing::{info, warn};

use crate::config::{FormatPreference, NpxConfig};
use crate::error::NpxError;
use crate::fpu::owner::NpxCpu;
use crate::fpu::state::SaveFormat;
use crate::fpu::table::ExceptionKind;
use crate::sched::ThreadFpu;
use crate::traits::{CriticalSection, FpuHardware};

/// Exceptions worth reporting when raised under a mask at thread exit:
/// invalid operation, divide-by-zero and overflow
const EXIT_ADVISORY_MASK: u16 = 0x0D;

/// CPU capabilities relevant to the FPU driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuFeatures {
    /// x87 unit present
    pub fpu: bool,
    /// FXSAVE/FXRSTOR supported
    pub fxsr: bool,
}

/// Facts fixed by the boot probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpxInfo {
    /// An FPU exists and the driver is active
    pub exists: bool,
    /// Save area layout for every thread
    pub format: SaveFormat,
}

impl NpxInfo {
    /// No FPU: every hook is inert
    pub const fn absent() -> Self {
        Self {
            exists: false,
            format: SaveFormat::Legacy,
        }
    }

    pub const fn present(format: SaveFormat) -> Self {
        Self {
            exists: true,
            format,
        }
    }
}

/// Decide whether the driver attaches and with which save format
pub fn probe(features: CpuFeatures, config: &NpxConfig) -> Result<NpxInfo, NpxError> {
    if config.disabled {
        return Err(NpxError::Disabled);
    }
    if !features.fpu {
        return Err(NpxError::NotPresent);
    }

    let format = match config.save_format {
        FormatPreference::Auto if features.fxsr => SaveFormat::Extended,
        FormatPreference::Auto | FormatPreference::Legacy => SaveFormat::Legacy,
        FormatPreference::Extended if features.fxsr => SaveFormat::Extended,
        FormatPreference::Extended => return Err(NpxError::NoExtendedFormat),
    };

    Ok(NpxInfo::present(format))
}

/// Machine-wide probe outcome
static NPX_PROBE: Once<Result<NpxInfo, NpxError>> = Once::new();

/// Run the probe once for the whole machine
///
/// Later calls return the first outcome whatever their arguments, so every
/// CPU attaches with the same save format.
pub fn boot_probe(features: CpuFeatures, config: &NpxConfig) -> Result<NpxInfo, NpxError> {
    *NPX_PROBE.call_once(|| {
        let outcome = probe(features, config);
        match &outcome {
            Ok(found) => info!(format = ?found.format, "npx probed"),
            Err(err) => warn!(%err, "npx not attached"),
        }
        outcome
    })
}

/// Probe outcome for code that only needs to know whether the FPU exists
pub fn npx_info() -> NpxInfo {
    match NPX_PROBE.get() {
        Some(Ok(info)) => *info,
        _ => NpxInfo::absent(),
    }
}

impl<H: FpuHardware, C: CriticalSection> NpxCpu<H, C> {
    /// Program this CPU's FPU and return its driver state
    ///
    /// Sets the mode bits for the save format, captures the clean state
    /// (initialized FPU with the configured control word) and arms the
    /// trap so the first thread to use the FPU gets its own state.
    pub fn attach(hw: H, critical: C, info: NpxInfo, config: &NpxConfig) -> Self {
        let mut cpu = Self::new(hw, critical, info, config);
        if !info.exists {
            return cpu;
        }

        let mut clean = info.format.new_context();
        cpu.hw.configure(info.format);
        cpu.hw.disarm_trap();
        cpu.hw.initialize();
        cpu.hw.load_control_word(config.initial_control_word);
        cpu.hw.save_full_state(&mut clean);
        cpu.hw.arm_trap_on_next_use();
        cpu.clean_state = clean;

        info!(
            format = ?info.format,
            control_word = config.initial_control_word,
            "npx attached"
        );
        cpu
    }

    /// Thread creation or explicit FPU reset
    pub fn init_thread_fpu_state(&mut self, td: &mut ThreadFpu, control_word: u16) {
        self.reinit(control_word, td);
    }

    /// Thread teardown: make sure `td`'s final state is in its control block
    pub fn release_thread_fpu_state(&mut self, td: &mut ThreadFpu) {
        self.flush(td);

        if self.warn_masked_on_exit && self.info.exists {
            let masked = masked_exceptions(td);
            if masked & EXIT_ADVISORY_MASK != 0 {
                warn!(
                    thread = td.id(),
                    exceptions = masked,
                    "thread exited with masked floating point exceptions"
                );
            }
        }
    }

    /// `#NM` entry point
    pub fn on_device_not_available_trap(&mut self, td: &mut ThreadFpu) {
        self.on_first_use(td);
    }

    /// `#MF` entry point; the result is the `SIGFPE` sub-code to deliver
    pub fn on_arithmetic_exception_trap(&mut self, td: &mut ThreadFpu) -> ExceptionKind {
        self.translate_trap(td)
    }
}

/// Exceptions raised in `td`'s saved state while masked by its control word
pub fn masked_exceptions(td: &ThreadFpu) -> u16 {
    let save = td.save_area();
    save.control_word() & save.status_word() & 0x7F
}
