// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Synchronization primitives
//!
//! The NPX code never blocks; the only primitive it needs is a scoped
//! interrupt-off section around ownership changes.

pub mod critical;

// Re-exports
pub use critical::{CriticalGuard, NoPreempt};
