// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Exception priority table
//!
//! When an arithmetic trap is taken several exception flags may be raised
//! at once. Userland gets exactly one `FPE_*` code, picked with this order:
//!
//! - invalid operation wins over everything, and is reported as a stack
//!   fault when the stack fault bit is also set
//! - divide-by-zero
//! - denormal operand
//! - overflow
//! - underflow
//! - a stack fault, alone or with only an inexact result
//! - inexact result
//!
//! The table is indexed by the adjusted status (see [`adjusted_status`]).

use crate::fpu::state::ControlWord;

/// Signal sub-codes delivered with `SIGFPE`
pub mod fpe_code {
    pub const FPE_INTOVF: i32 = 1;
    pub const FPE_INTDIV: i32 = 2;
    pub const FPE_FLTDIV: i32 = 3;
    pub const FPE_FLTOVF: i32 = 4;
    pub const FPE_FLTUND: i32 = 5;
    pub const FPE_FLTRES: i32 = 6;
    pub const FPE_FLTINV: i32 = 7;
    pub const FPE_FLTSUB: i32 = 8;
}

/// Status bits that survive masking regardless of the control word
pub const SW_STACK_FAULT: u16 = 0x40;

/// Maskable exception bits, shared by the status flags and control masks
pub const SW_EXCEPTION_MASK: u16 = ControlWord::ALL_MASKS.bits();

/// Exception reported for one arithmetic trap
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExceptionKind {
    /// No unmasked exception pending
    None = 0,
    InvalidOperand = 1,
    Denormal = 2,
    DivideByZero = 3,
    Overflow = 4,
    Underflow = 5,
    Inexact = 6,
    /// Stack overflow/underflow (invalid-operand variant)
    StackFault = 7,
}

impl ExceptionKind {
    /// The `si_code` to deliver with `SIGFPE`, or 0 for [`ExceptionKind::None`]
    ///
    /// There is no dedicated code for denormal operands; they are reported
    /// as underflow.
    pub const fn signal_code(self) -> i32 {
        match self {
            ExceptionKind::None => 0,
            ExceptionKind::InvalidOperand => fpe_code::FPE_FLTINV,
            ExceptionKind::Denormal => fpe_code::FPE_FLTUND,
            ExceptionKind::DivideByZero => fpe_code::FPE_FLTDIV,
            ExceptionKind::Overflow => fpe_code::FPE_FLTOVF,
            ExceptionKind::Underflow => fpe_code::FPE_FLTUND,
            ExceptionKind::Inexact => fpe_code::FPE_FLTRES,
            ExceptionKind::StackFault => fpe_code::FPE_FLTSUB,
        }
    }

    pub const fn is_none(self) -> bool {
        matches!(self, ExceptionKind::None)
    }
}

const NONE: ExceptionKind = ExceptionKind::None;
const INV: ExceptionKind = ExceptionKind::InvalidOperand;
const DNR: ExceptionKind = ExceptionKind::Denormal;
const DIV: ExceptionKind = ExceptionKind::DivideByZero;
const OVF: ExceptionKind = ExceptionKind::Overflow;
const UND: ExceptionKind = ExceptionKind::Underflow;
const RES: ExceptionKind = ExceptionKind::Inexact;
const STK: ExceptionKind = ExceptionKind::StackFault;

/// Priority table, indexed by adjusted status
pub static FPE_TABLE: [ExceptionKind; 128] = [
    NONE, // 00
    INV,  // 01 - INV
    DNR,  // 02 - DNML
    INV,  // 03 - INV | DNML
    DIV,  // 04 - DZ
    INV,  // 05 - INV | DZ
    DIV,  // 06 - DNML | DZ
    INV,  // 07 - INV | DNML | DZ
    OVF,  // 08 - OFL
    INV,  // 09 - INV | OFL
    DNR,  // 0A - DNML | OFL
    INV,  // 0B - INV | DNML | OFL
    DIV,  // 0C - DZ | OFL
    INV,  // 0D - INV | DZ | OFL
    DIV,  // 0E - DNML | DZ | OFL
    INV,  // 0F - INV | DNML | DZ | OFL
    UND,  // 10 - UFL
    INV,  // 11 - INV | UFL
    DNR,  // 12 - DNML | UFL
    INV,  // 13 - INV | DNML | UFL
    DIV,  // 14 - DZ | UFL
    INV,  // 15 - INV | DZ | UFL
    DIV,  // 16 - DNML | DZ | UFL
    INV,  // 17 - INV | DNML | DZ | UFL
    OVF,  // 18 - OFL | UFL
    INV,  // 19 - INV | OFL | UFL
    DNR,  // 1A - DNML | OFL | UFL
    INV,  // 1B - INV | DNML | OFL | UFL
    DIV,  // 1C - DZ | OFL | UFL
    INV,  // 1D - INV | DZ | OFL | UFL
    DIV,  // 1E - DNML | DZ | OFL | UFL
    INV,  // 1F - INV | DNML | DZ | OFL | UFL
    RES,  // 20 - IMP
    INV,  // 21 - INV | IMP
    DNR,  // 22 - DNML | IMP
    INV,  // 23 - INV | DNML | IMP
    DIV,  // 24 - DZ | IMP
    INV,  // 25 - INV | DZ | IMP
    DIV,  // 26 - DNML | DZ | IMP
    INV,  // 27 - INV | DNML | DZ | IMP
    OVF,  // 28 - OFL | IMP
    INV,  // 29 - INV | OFL | IMP
    DNR,  // 2A - DNML | OFL | IMP
    INV,  // 2B - INV | DNML | OFL | IMP
    DIV,  // 2C - DZ | OFL | IMP
    INV,  // 2D - INV | DZ | OFL | IMP
    DIV,  // 2E - DNML | DZ | OFL | IMP
    INV,  // 2F - INV | DNML | DZ | OFL | IMP
    UND,  // 30 - UFL | IMP
    INV,  // 31 - INV | UFL | IMP
    DNR,  // 32 - DNML | UFL | IMP
    INV,  // 33 - INV | DNML | UFL | IMP
    DIV,  // 34 - DZ | UFL | IMP
    INV,  // 35 - INV | DZ | UFL | IMP
    DIV,  // 36 - DNML | DZ | UFL | IMP
    INV,  // 37 - INV | DNML | DZ | UFL | IMP
    OVF,  // 38 - OFL | UFL | IMP
    INV,  // 39 - INV | OFL | UFL | IMP
    DNR,  // 3A - DNML | OFL | UFL | IMP
    INV,  // 3B - INV | DNML | OFL | UFL | IMP
    DIV,  // 3C - DZ | OFL | UFL | IMP
    INV,  // 3D - INV | DZ | OFL | UFL | IMP
    DIV,  // 3E - DNML | DZ | OFL | UFL | IMP
    INV,  // 3F - INV | DNML | DZ | OFL | UFL | IMP
    STK,  // 40 - STK
    STK,  // 41 - INV | STK
    DNR,  // 42 - DNML | STK
    STK,  // 43 - INV | DNML | STK
    DIV,  // 44 - DZ | STK
    STK,  // 45 - INV | DZ | STK
    DIV,  // 46 - DNML | DZ | STK
    STK,  // 47 - INV | DNML | DZ | STK
    OVF,  // 48 - OFL | STK
    STK,  // 49 - INV | OFL | STK
    DNR,  // 4A - DNML | OFL | STK
    STK,  // 4B - INV | DNML | OFL | STK
    DIV,  // 4C - DZ | OFL | STK
    STK,  // 4D - INV | DZ | OFL | STK
    DIV,  // 4E - DNML | DZ | OFL | STK
    STK,  // 4F - INV | DNML | DZ | OFL | STK
    UND,  // 50 - UFL | STK
    STK,  // 51 - INV | UFL | STK
    DNR,  // 52 - DNML | UFL | STK
    STK,  // 53 - INV | DNML | UFL | STK
    DIV,  // 54 - DZ | UFL | STK
    STK,  // 55 - INV | DZ | UFL | STK
    DIV,  // 56 - DNML | DZ | UFL | STK
    STK,  // 57 - INV | DNML | DZ | UFL | STK
    OVF,  // 58 - OFL | UFL | STK
    STK,  // 59 - INV | OFL | UFL | STK
    DNR,  // 5A - DNML | OFL | UFL | STK
    STK,  // 5B - INV | DNML | OFL | UFL | STK
    DIV,  // 5C - DZ | OFL | UFL | STK
    STK,  // 5D - INV | DZ | OFL | UFL | STK
    DIV,  // 5E - DNML | DZ | OFL | UFL | STK
    STK,  // 5F - INV | DNML | DZ | OFL | UFL | STK
    STK,  // 60 - IMP | STK
    STK,  // 61 - INV | IMP | STK
    DNR,  // 62 - DNML | IMP | STK
    STK,  // 63 - INV | DNML | IMP | STK
    DIV,  // 64 - DZ | IMP | STK
    STK,  // 65 - INV | DZ | IMP | STK
    DIV,  // 66 - DNML | DZ | IMP | STK
    STK,  // 67 - INV | DNML | DZ | IMP | STK
    OVF,  // 68 - OFL | IMP | STK
    STK,  // 69 - INV | OFL | IMP | STK
    DNR,  // 6A - DNML | OFL | IMP | STK
    STK,  // 6B - INV | DNML | OFL | IMP | STK
    DIV,  // 6C - DZ | OFL | IMP | STK
    STK,  // 6D - INV | DZ | OFL | IMP | STK
    DIV,  // 6E - DNML | DZ | OFL | IMP | STK
    STK,  // 6F - INV | DNML | DZ | OFL | IMP | STK
    UND,  // 70 - UFL | IMP | STK
    STK,  // 71 - INV | UFL | IMP | STK
    DNR,  // 72 - DNML | UFL | IMP | STK
    STK,  // 73 - INV | DNML | UFL | IMP | STK
    DIV,  // 74 - DZ | UFL | IMP | STK
    STK,  // 75 - INV | DZ | UFL | IMP | STK
    DIV,  // 76 - DNML | DZ | UFL | IMP | STK
    STK,  // 77 - INV | DNML | DZ | UFL | IMP | STK
    OVF,  // 78 - OFL | UFL | IMP | STK
    STK,  // 79 - INV | OFL | UFL | IMP | STK
    DNR,  // 7A - DNML | OFL | UFL | IMP | STK
    STK,  // 7B - INV | DNML | OFL | UFL | IMP | STK
    DIV,  // 7C - DZ | OFL | UFL | IMP | STK
    STK,  // 7D - INV | DZ | OFL | UFL | IMP | STK
    DIV,  // 7E - DNML | DZ | OFL | UFL | IMP | STK
    STK,  // 7F - INV | DNML | DZ | OFL | UFL | IMP | STK
];

/// Keep the unmasked exception bits of `status` plus the stack fault bit
///
/// A bit set in the control word masks the matching exception, so only
/// bits clear in `control` can have caused the trap.
#[inline]
pub const fn adjusted_status(status: u16, control: u16) -> u8 {
    (status & ((!control & SW_EXCEPTION_MASK) | SW_STACK_FAULT)) as u8
}

/// Look up the single exception to report for an adjusted status
///
/// Only the low seven bits are significant.
#[inline]
pub fn classify(adjusted_status: u8) -> ExceptionKind {
    FPE_TABLE[(adjusted_status & 0x7F) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    /// Recompute an entry from the precedence rules
    fn by_rules(index: u8) -> ExceptionKind {
        let stack_fault = index & 0x40 != 0;
        if index == 0 {
            ExceptionKind::None
        } else if index & 0x01 != 0 {
            if stack_fault { ExceptionKind::StackFault } else { ExceptionKind::InvalidOperand }
        } else if index & 0x04 != 0 {
            ExceptionKind::DivideByZero
        } else if index & 0x02 != 0 {
            ExceptionKind::Denormal
        } else if index & 0x08 != 0 {
            ExceptionKind::Overflow
        } else if index & 0x10 != 0 {
            ExceptionKind::Underflow
        } else if stack_fault {
            ExceptionKind::StackFault
        } else {
            ExceptionKind::Inexact
        }
    }

    #[rstest]
    #[case(0x00, ExceptionKind::None)]
    #[case(0x01, ExceptionKind::InvalidOperand)]
    #[case(0x02, ExceptionKind::Denormal)]
    #[case(0x04, ExceptionKind::DivideByZero)]
    #[case(0x05, ExceptionKind::InvalidOperand)]
    #[case(0x06, ExceptionKind::DivideByZero)]
    #[case(0x08, ExceptionKind::Overflow)]
    #[case(0x0A, ExceptionKind::Denormal)]
    #[case(0x10, ExceptionKind::Underflow)]
    #[case(0x18, ExceptionKind::Overflow)]
    #[case(0x20, ExceptionKind::Inexact)]
    #[case(0x30, ExceptionKind::Underflow)]
    #[case(0x40, ExceptionKind::StackFault)]
    #[case(0x41, ExceptionKind::StackFault)]
    #[case(0x42, ExceptionKind::Denormal)]
    #[case(0x44, ExceptionKind::DivideByZero)]
    #[case(0x48, ExceptionKind::Overflow)]
    #[case(0x60, ExceptionKind::StackFault)]
    #[case(0x7F, ExceptionKind::StackFault)]
    #[case(0x3F, ExceptionKind::InvalidOperand)]
    fn test_classify_cases(#[case] index: u8, #[case] expected: ExceptionKind) {
        assert_eq!(classify(index), expected);
    }

    #[test]
    fn test_table_matches_precedence_rules() {
        for index in 0..128u8 {
            assert_eq!(FPE_TABLE[index as usize], by_rules(index), "entry {:#04x}", index);
        }
    }

    #[test]
    fn test_only_zero_maps_to_none() {
        for index in 1..128u8 {
            assert!(!classify(index).is_none(), "entry {:#04x}", index);
        }
    }

    #[rstest]
    #[case(ExceptionKind::None, 0)]
    #[case(ExceptionKind::InvalidOperand, fpe_code::FPE_FLTINV)]
    #[case(ExceptionKind::Denormal, fpe_code::FPE_FLTUND)]
    #[case(ExceptionKind::DivideByZero, fpe_code::FPE_FLTDIV)]
    #[case(ExceptionKind::Overflow, fpe_code::FPE_FLTOVF)]
    #[case(ExceptionKind::Underflow, fpe_code::FPE_FLTUND)]
    #[case(ExceptionKind::Inexact, fpe_code::FPE_FLTRES)]
    #[case(ExceptionKind::StackFault, fpe_code::FPE_FLTSUB)]
    fn test_signal_codes(#[case] kind: ExceptionKind, #[case] code: i32) {
        assert_eq!(kind.signal_code(), code);
    }

    #[test]
    fn test_adjusted_status_unmasked_divide_by_zero() {
        // Everything masked except divide-by-zero
        assert_eq!(adjusted_status(0x0004, 0x037B), 0x04);
        assert_eq!(classify(adjusted_status(0x0004, 0x037B)), ExceptionKind::DivideByZero);
    }

    #[test]
    fn test_adjusted_status_invalid_and_divide() {
        assert_eq!(adjusted_status(0x0005, 0x037A), 0x05);
        assert_eq!(classify(0x05), ExceptionKind::InvalidOperand);
    }

    #[test]
    fn test_adjusted_status_keeps_stack_fault_when_masked() {
        // All masked: only the stack fault bit survives
        assert_eq!(adjusted_status(0x00C1, 0x037F), 0x40);
    }

    #[test]
    fn test_stack_fault_beats_inexact() {
        // Inexact unmasked, stack overflow on the same instruction
        assert_eq!(adjusted_status(0x0060, 0x035F), 0x60);
        assert_eq!(classify(adjusted_status(0x0060, 0x035F)), ExceptionKind::StackFault);
        assert_eq!(classify(0x70), ExceptionKind::Underflow);
    }

    #[test]
    fn test_adjusted_status_drops_high_bits() {
        assert_eq!(adjusted_status(0xFF80, 0x0000), 0x00);
    }

    proptest! {
        #[test]
        fn prop_classify_total(index in any::<u8>()) {
            // Never panics, including indices with bit 7 set
            let kind = classify(index);
            prop_assert_eq!(kind, FPE_TABLE[(index & 0x7F) as usize]);
        }

        #[test]
        fn prop_adjusted_fits_table(status in any::<u16>(), control in any::<u16>()) {
            let adjusted = adjusted_status(status, control);
            prop_assert!(adjusted < 0x80);
            prop_assert_eq!(adjusted as u16 & control & SW_EXCEPTION_MASK, 0);
        }
    }
}
