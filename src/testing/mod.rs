// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Testing infrastructure for the NPX core
//!
//! # Usage
//! ```ignore
//! use npx::testing::{SoftFpu, CountingCritical};
//!
//! let mut cpu = NpxCpu::attach(SoftFpu::new(), CountingCritical::new(), info, &config);
//! cpu.on_first_use(&mut td);
//! ```

pub mod mocks;
pub mod soft_fpu;

pub use mocks::{CountingCritical, MockFpu, RecordingSignals};
pub use soft_fpu::{SoftFpu, SoftFpuRegs, FNINIT_CW};

use crate::config::NpxConfig;
use crate::fpu::{NpxCpu, NpxInfo, SaveFormat};

/// Attached CPU on simulated hardware
pub fn soft_cpu(format: SaveFormat) -> NpxCpu<SoftFpu, CountingCritical> {
    NpxCpu::attach(
        SoftFpu::new(),
        CountingCritical::new(),
        NpxInfo::present(format),
        &NpxConfig::default(),
    )
}
