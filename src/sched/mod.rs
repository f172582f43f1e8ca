// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Thread-side FPU state
//!
//! The scheduler owns thread control blocks; this module defines the part
//! of a control block that belongs to the FPU driver.

pub mod thread;

pub use thread::{new_thread_id, PcbFpuFlags, ThreadFpu, ThreadId};
