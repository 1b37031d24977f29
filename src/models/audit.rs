//! Audit trail types.
//!
//! Every calculation that produces money or hours records the rules it
//! applied, so a payslip can be explained line by line.

use serde::{Deserialize, Serialize};

/// A single step in the audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for a rule application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The setting or policy key that drove this rule, if any.
    pub policy_ref: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}

/// A warning generated during calculation.
///
/// Warnings indicate potential issues that don't prevent calculation
/// but may require attention.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditWarning {
    /// A code identifying the type of warning.
    pub code: String,
    /// A human-readable description of the warning.
    pub message: String,
    /// The severity level ("low", "medium", "high").
    pub severity: String,
}

/// The complete audit trace for a calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuditTrace {
    /// All steps in order of application.
    pub steps: Vec<AuditStep>,
    /// Warnings raised along the way.
    pub warnings: Vec<AuditWarning>,
    /// Wall-clock time spent, in microseconds.
    pub duration_us: u64,
}

impl AuditTrace {
    /// The number the next pushed step should carry.
    pub fn next_step_number(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Appends a step.
    pub fn push(&mut self, step: AuditStep) {
        self.steps.push(step);
    }

    /// Appends a warning.
    pub fn warn(&mut self, code: &str, message: impl Into<String>, severity: &str) {
        self.warnings.push(AuditWarning {
            code: code.to_string(),
            message: message.into(),
            severity: severity.to_string(),
        });
    }
}
