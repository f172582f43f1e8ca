// Copyright 2025 The Rustux Authors
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Integration Tests
//!
//! Exercise the NPX driver end to end on the software FPU: ownership
//! transitions, trap translation and the lifecycle hooks together.
