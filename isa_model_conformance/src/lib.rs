// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Conformance tests for `isa_model`.
//!
//! The tests live in `tests/`; this crate has no library code.
