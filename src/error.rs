// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Boot-time NPX errors
//!
//! Probing can fail, and so can installing a caller-supplied save area.
//! Everything else in the core either runs or panics on a broken invariant.

use thiserror::Error;

/// Reasons the FPU driver does not attach
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NpxError {
    /// CPUID reports no x87 unit
    #[error("no floating point unit present")]
    NotPresent,
    /// Disabled by configuration
    #[error("npx disabled by configuration")]
    Disabled,
    /// Extended save format requested but FXSAVE is not supported
    #[error("extended save format requested without fxsave support")]
    NoExtendedFormat,
    /// A save area in the wrong layout for this machine
    #[error("fpu save area format does not match the boot format")]
    FormatMismatch,
}
