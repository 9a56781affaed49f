//! Arithmetic formula evaluation for calculation templates.
//!
//! Template formulas are **untrusted configuration data**, not code: they are
//! tokenized and parsed against a fixed operator set (`+ - * / ( )`) and a
//! variable map supplied by the caller. There is no general-purpose
//! evaluation, and variable references are matched as whole tokens, so one
//! variable name being a prefix of another cannot corrupt a formula.

pub mod eval;

pub use eval::{evaluate, FormulaError, VariableMap};
