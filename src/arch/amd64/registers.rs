// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! x86-64 FPU instruction wrappers
//!
//! Thin inline assembly wrappers for the x87/FXSR instructions the NPX
//! driver issues. None of them check for an FPU; callers run after the
//! boot probe.

use crate::fpu::state::{Save87, SaveXmm};

/// CPUID.1:EDX feature bits
pub mod cpuid_edx {
    /// On-chip x87 FPU
    pub const FPU: u32 = 1 << 0;
    /// FXSAVE/FXRSTOR
    pub const FXSR: u32 = 1 << 24;
}

/// ============================================================================
/// Save / Restore
/// ============================================================================

/// Save the x87 state in the legacy format and reinitialize the FPU
///
/// # Safety
///
/// CR0.TS must be clear and an FPU must exist.
#[inline]
pub unsafe fn fnsave(area: *mut Save87) {
    core::arch::asm!("fnsave [{}]", in(reg) area, options(nostack, preserves_flags));
}

/// Load the x87 state from a legacy save area
///
/// # Safety
///
/// CR0.TS must be clear and `area` must hold a valid image.
#[inline]
pub unsafe fn frstor(area: *const Save87) {
    core::arch::asm!("frstor [{}]", in(reg) area, options(nostack, preserves_flags));
}

/// Save the x87/SSE state in the extended format
///
/// # Safety
///
/// CR0.TS must be clear, CR4.OSFXSR set, and `area` 16-byte aligned.
#[inline]
pub unsafe fn fxsave(area: *mut SaveXmm) {
    core::arch::asm!("fxsave [{}]", in(reg) area, options(nostack, preserves_flags));
}

/// Load the x87/SSE state from an extended save area
///
/// # Safety
///
/// Same as [`fxsave`]; reserved MXCSR bits in `area` must be clear.
#[inline]
pub unsafe fn fxrstor(area: *const SaveXmm) {
    core::arch::asm!("fxrstor [{}]", in(reg) area, options(nostack, preserves_flags));
}

/// ============================================================================
/// Control / Status
/// ============================================================================

/// Load the control word
///
/// # Safety
///
/// CR0.TS must be clear.
#[inline]
pub unsafe fn fldcw(cw: u16) {
    core::arch::asm!(
        "fldcw word ptr [{}]",
        in(reg) &cw as *const u16,
        options(nostack, preserves_flags, readonly)
    );
}

/// Store the control word
///
/// # Safety
///
/// CR0.TS must be clear.
#[inline]
pub unsafe fn fnstcw() -> u16 {
    let mut cw: u16 = 0;
    core::arch::asm!(
        "fnstcw word ptr [{}]",
        in(reg) &mut cw as *mut u16,
        options(nostack, preserves_flags)
    );
    cw
}

/// Store the status word
///
/// # Safety
///
/// CR0.TS must be clear.
#[inline]
pub unsafe fn fnstsw() -> u16 {
    let sw: u16;
    core::arch::asm!("fnstsw ax", out("ax") sw, options(nomem, nostack, preserves_flags));
    sw
}

/// Clear pending exception flags
///
/// # Safety
///
/// CR0.TS must be clear.
#[inline]
pub unsafe fn fnclex() {
    core::arch::asm!("fnclex", options(nomem, nostack, preserves_flags));
}

/// Reset the FPU
///
/// # Safety
///
/// CR0.TS must be clear.
#[inline]
pub unsafe fn fninit() {
    core::arch::asm!("fninit", options(nomem, nostack, preserves_flags));
}

/// Clear CR0.TS
///
/// # Safety
///
/// Ring 0 only.
#[inline]
pub unsafe fn clts() {
    core::arch::asm!("clts", options(nomem, nostack, preserves_flags));
}
