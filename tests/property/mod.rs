// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! sid assignment, default deny fallback and idempotence of rule compilation.

mod sid_ordering;
