//! Performance evaluations.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A scoring criterion such as "Punctuality".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationCriterion {
    /// Row id.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Highest score allowed.
    pub max_points: i64,
}

/// A score for one criterion within an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationDetail {
    /// Criterion id.
    pub criterion_id: i64,
    /// Criterion name, joined in for display.
    pub criterion_name: String,
    /// Criterion maximum.
    pub max_points: i64,
    /// Score given.
    pub score: Decimal,
    /// Evaluator comment.
    pub comment: Option<String>,
}

/// A stored evaluation with its scores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Row id.
    pub id: i64,
    /// Employee evaluated.
    pub employee_id: String,
    /// Period label, e.g. "2025-Q1".
    pub period: Option<String>,
    /// Date of the evaluation.
    pub evaluation_date: NaiveDate,
    /// Sum of detail scores.
    pub total_score: Decimal,
    /// Evaluating user.
    pub evaluator_user_id: Option<i64>,
    /// Overall comments.
    pub comments: Option<String>,
    /// Per-criterion scores.
    pub details: Vec<EvaluationDetail>,
}

/// A score submitted for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    /// Criterion id.
    pub criterion_id: i64,
    /// Score.
    pub score: Decimal,
    /// Comment.
    pub comment: Option<String>,
}

/// Fields supplied when recording an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvaluation {
    /// Employee evaluated.
    pub employee_id: String,
    /// Period label.
    pub period: Option<String>,
    /// Date of the evaluation.
    pub evaluation_date: NaiveDate,
    /// Evaluating user.
    pub evaluator_user_id: Option<i64>,
    /// Overall comments.
    pub comments: Option<String>,
    /// Scores, at most one per criterion.
    pub scores: Vec<ScoreInput>,
}
