// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! NPX (x87 FPU) driver core
//!
//! - [`state`]: save area layouts and control/status word bits
//! - [`table`]: exception priority table
//! - [`owner`]: lazy ownership of the register file
//! - [`translate`]: arithmetic trap to `SIGFPE` code
//! - [`device`]: probe, attach and the scheduler/trap hooks

pub mod device;
pub mod owner;
pub mod state;
pub mod table;
pub mod translate;

pub use device::{boot_probe, masked_exceptions, npx_info, probe, CpuFeatures, NpxInfo};
pub use owner::{FpOwned, NpxCpu, OwnerState};
pub use state::{
    ControlWord, SaveFormat, Save87, SaveXmm, SavedFpuContext, StatusWord, INITIAL_NPXCW,
    INITIAL_NPXCW_I386,
};
pub use table::{adjusted_status, classify, fpe_code, ExceptionKind, FPE_TABLE};
