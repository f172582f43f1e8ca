// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Architecture-specific modules
//!
//! Only x86-64 has an NPX; the module is compiled for that target alone.

#[cfg(target_arch = "x86_64")]
pub mod amd64;

#[cfg(target_arch = "x86_64")]
pub use amd64::{X86Fpu, X86NpxCpu, InterruptMask};
