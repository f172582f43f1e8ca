// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86_64 (amd64) architecture-specific code
//!
//! Real FPU instructions, CR0/CR4 mode bits and the interrupt-off critical
//! section backing the NPX core on x86-64.

pub mod fpu;
pub mod intr;
pub mod registers;

pub use fpu::{cpu_features, X86Fpu};
pub use intr::InterruptMask;

/// Per-CPU NPX state wired to the real hardware
pub type X86NpxCpu = crate::fpu::NpxCpu<X86Fpu, InterruptMask>;
