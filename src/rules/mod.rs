// Copyright (c) 2025 - Cowboy AI, Inc.
//! Rule resolution and compilation

pub mod compiler;
pub mod resolver;

pub use compiler::{
    compile_rule, default_deny_rule, CompiledRule, SidSequence, DEFAULT_DENY_RULE_ID,
};
pub use resolver::{RuleDefinitionResolver, RuleResolution, UNRESOLVED_REFERENCE_REASON};
