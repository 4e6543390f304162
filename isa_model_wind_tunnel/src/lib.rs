// Copyright 2026 the ISA Model Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `isa_model`.
//!
//! Run with `cargo bench -p isa_model_wind_tunnel`.
