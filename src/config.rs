// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! NPX driver configuration

use crate::fpu::state::INITIAL_NPXCW;

/// Save format selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatPreference {
    /// Extended when the CPU supports FXSAVE, legacy otherwise
    #[default]
    Auto,
    /// Always `fnsave`/`frstor`
    Legacy,
    /// Require `fxsave`/`fxrstor`
    Extended,
}

/// Boot-time configuration for the FPU driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpxConfig {
    /// Do not attach even if an FPU is present
    pub disabled: bool,
    /// Control word for the clean state and new threads
    pub initial_control_word: u16,
    /// Save area layout selection
    pub save_format: FormatPreference,
    /// Log when a thread exits with raised exceptions that were masked
    pub warn_masked_on_exit: bool,
}

impl NpxConfig {
    pub const fn new() -> Self {
        Self {
            disabled: false,
            initial_control_word: INITIAL_NPXCW,
            save_format: FormatPreference::Auto,
            warn_masked_on_exit: cfg!(feature = "npx_debug"),
        }
    }
}

impl Default for NpxConfig {
    fn default() -> Self {
        Self::new()
    }
}
