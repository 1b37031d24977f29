//! Evaluation criteria and scored employee evaluations.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use rusqlite::{OptionalExtension, Row, params};
use tracing::info;

use crate::error::{HrError, HrResult, is_unique_violation};
use crate::models::{Evaluation, EvaluationCriterion, EvaluationDetail, NewEvaluation};

use super::{Database, get_decimal};

fn criterion_from_row(row: &Row<'_>) -> rusqlite::Result<EvaluationCriterion> {
    Ok(EvaluationCriterion {
        id: row.get("id")?,
        name: row.get("name")?,
        description: row.get("description")?,
        max_points: row.get("max_points")?,
    })
}

const EVALUATION_COLUMNS: &str =
    "id, employee_id, evaluation_period, evaluation_date, total_score, evaluator_user_id, comments";

fn evaluation_from_row(row: &Row<'_>) -> rusqlite::Result<Evaluation> {
    Ok(Evaluation {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        period: row.get("evaluation_period")?,
        evaluation_date: row.get("evaluation_date")?,
        total_score: get_decimal(row, "total_score")?,
        evaluator_user_id: row.get("evaluator_user_id")?,
        comments: row.get("comments")?,
        details: Vec::new(),
    })
}

impl Database {
    /// Adds a scoring criterion. Names are unique and `max_points` must be
    /// positive.
    pub fn add_criterion(&self, name: &str, description: Option<&str>, max_points: i64) -> HrResult<i64> {
        let name = name.trim();
        if name.is_empty() {
            return Err(HrError::invalid("name", "must not be empty"));
        }
        if max_points <= 0 {
            return Err(HrError::invalid("max_points", "must be positive"));
        }
        match self.conn().execute(
            "INSERT INTO evaluation_criteria (name, description, max_points) VALUES (?1, ?2, ?3)",
            params![name, description, max_points],
        ) {
            Ok(_) => Ok(self.conn().last_insert_rowid()),
            Err(e) if is_unique_violation(&e) => Err(HrError::invalid(
                "name",
                format!("criterion '{}' already exists", name),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// All criteria, by name.
    pub fn list_criteria(&self) -> HrResult<Vec<EvaluationCriterion>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id, name, description, max_points FROM evaluation_criteria ORDER BY name")?;
        let rows = stmt.query_map([], criterion_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Deletes a criterion that no evaluation has scored.
    pub fn delete_criterion(&self, criterion_id: i64) -> HrResult<()> {
        let used: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM evaluation_details WHERE criterion_id = ?1",
            params![criterion_id],
            |r| r.get(0),
        )?;
        if used > 0 {
            return Err(HrError::invalid(
                "criterion_id",
                format!("criterion {} is used by {} evaluation score(s)", criterion_id, used),
            ));
        }
        let deleted = self
            .conn()
            .execute("DELETE FROM evaluation_criteria WHERE id = ?1", params![criterion_id])?;
        if deleted == 0 {
            return Err(HrError::invalid("criterion_id", format!("no criterion {}", criterion_id)));
        }
        Ok(())
    }

    /// Stores an evaluation with its scores in one transaction.
    ///
    /// Every score must lie within `0..=max_points` of its criterion and
    /// each criterion may be scored once. The total is the sum of the scores.
    pub fn add_evaluation(&self, new: &NewEvaluation) -> HrResult<i64> {
        self.get_employee(&new.employee_id, true)?;
        if new.scores.is_empty() {
            return Err(HrError::invalid("scores", "at least one score is required"));
        }
        let criteria: HashMap<i64, EvaluationCriterion> = self
            .list_criteria()?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();
        let mut seen = HashSet::with_capacity(new.scores.len());
        for score in &new.scores {
            if !seen.insert(score.criterion_id) {
                return Err(HrError::invalid(
                    "criterion_id",
                    format!("criterion {} scored more than once", score.criterion_id),
                ));
            }
            let criterion = criteria.get(&score.criterion_id).ok_or_else(|| {
                HrError::invalid("criterion_id", format!("no criterion {}", score.criterion_id))
            })?;
            if score.score < Decimal::ZERO || score.score > Decimal::from(criterion.max_points) {
                return Err(HrError::invalid(
                    "score",
                    format!(
                        "{} for '{}' is outside 0..={}",
                        score.score, criterion.name, criterion.max_points
                    ),
                ));
            }
        }
        let total: Decimal = new.scores.iter().map(|s| s.score).sum();

        let tx = self.conn().unchecked_transaction()?;
        tx.execute(
            "INSERT INTO employee_evaluations (
                employee_id, evaluation_period, evaluation_date, total_score, evaluator_user_id, comments
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                new.employee_id,
                new.period,
                new.evaluation_date,
                total.to_string(),
                new.evaluator_user_id,
                new.comments,
            ],
        )?;
        let evaluation_id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "INSERT INTO evaluation_details (evaluation_id, criterion_id, score, comment)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for score in &new.scores {
                stmt.execute(params![
                    evaluation_id,
                    score.criterion_id,
                    score.score.to_string(),
                    score.comment
                ])?;
            }
        }
        tx.commit()?;
        info!(evaluation_id, employee_id = %new.employee_id, total = %total, "evaluation recorded");
        Ok(evaluation_id)
    }

    /// An evaluation with its per-criterion details.
    pub fn get_evaluation(&self, evaluation_id: i64) -> HrResult<Option<Evaluation>> {
        let Some(mut evaluation) = self
            .conn()
            .query_row(
                &format!("SELECT {EVALUATION_COLUMNS} FROM employee_evaluations WHERE id = ?1"),
                params![evaluation_id],
                evaluation_from_row,
            )
            .optional()?
        else {
            return Ok(None);
        };
        let mut stmt = self.conn().prepare(
            "SELECT d.criterion_id, c.name, c.max_points, d.score, d.comment
             FROM evaluation_details d JOIN evaluation_criteria c ON c.id = d.criterion_id
             WHERE d.evaluation_id = ?1 ORDER BY c.name",
        )?;
        let rows = stmt.query_map(params![evaluation_id], |r| {
            Ok(EvaluationDetail {
                criterion_id: r.get("criterion_id")?,
                criterion_name: r.get("name")?,
                max_points: r.get("max_points")?,
                score: get_decimal(r, "score")?,
                comment: r.get("comment")?,
            })
        })?;
        evaluation.details = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(Some(evaluation))
    }

    /// An employee's evaluations, newest first, without details.
    pub fn evaluations_for_employee(&self, employee_id: &str) -> HrResult<Vec<Evaluation>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {EVALUATION_COLUMNS} FROM employee_evaluations
             WHERE employee_id = ?1 ORDER BY evaluation_date DESC, id DESC"
        ))?;
        let rows = stmt.query_map(params![employee_id], evaluation_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Mean total score per evaluated employee, ordered by employee id.
    pub fn average_score_by_employee(&self) -> HrResult<Vec<(String, Decimal)>> {
        let mut stmt = self.conn().prepare(
            "SELECT employee_id, total_score FROM employee_evaluations ORDER BY employee_id",
        )?;
        let rows = stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, get_decimal(r, "total_score")?)))?;

        let mut averages: Vec<(String, Decimal, u32)> = Vec::new();
        for row in rows {
            let (employee_id, score) = row?;
            match averages.last_mut() {
                Some((id, sum, n)) if *id == employee_id => {
                    *sum += score;
                    *n += 1;
                }
                _ => averages.push((employee_id, score, 1)),
            }
        }
        Ok(averages
            .into_iter()
            .map(|(id, sum, n)| (id, (sum / Decimal::from(n)).round_dp(2)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ScoreInput;
    use crate::store::test_support;
    use chrono::NaiveDate;

    fn evaluation(employee_id: &str, scores: &[(i64, i64)]) -> NewEvaluation {
        NewEvaluation {
            employee_id: employee_id.to_string(),
            period: Some("2025-Q1".to_string()),
            evaluation_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            evaluator_user_id: Some(1),
            comments: None,
            scores: scores
                .iter()
                .map(|(id, s)| ScoreInput {
                    criterion_id: *id,
                    score: Decimal::from(*s),
                    comment: None,
                })
                .collect(),
        }
    }

    #[test]
    fn test_criterion_rules() {
        let db = test_support::db();
        db.add_criterion("Quality", None, 10).unwrap();
        assert!(db.add_criterion("Quality", None, 5).is_err());
        assert!(db.add_criterion("Speed", None, 0).is_err());
        assert_eq!(db.list_criteria().unwrap().len(), 1);
    }

    #[test]
    fn test_total_is_sum_and_details_returned() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let q = db.add_criterion("Quality", None, 10).unwrap();
        let t = db.add_criterion("Teamwork", None, 5).unwrap();

        let id = db.add_evaluation(&evaluation(&emp, &[(q, 8), (t, 4)])).unwrap();
        let stored = db.get_evaluation(id).unwrap().unwrap();
        assert_eq!(stored.total_score, Decimal::from(12));
        assert_eq!(stored.details.len(), 2);
        assert_eq!(stored.details[0].criterion_name, "Quality");
    }

    #[test]
    fn test_score_above_max_writes_nothing() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let q = db.add_criterion("Quality", None, 10).unwrap();
        assert!(matches!(
            db.add_evaluation(&evaluation(&emp, &[(q, 11)])),
            Err(HrError::InvalidInput { .. })
        ));
        assert!(db.evaluations_for_employee(&emp).unwrap().is_empty());
    }

    #[test]
    fn test_repeated_criterion_rejected() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let q = db.add_criterion("Quality", None, 10).unwrap();
        let t = db.add_criterion("Teamwork", None, 5).unwrap();
        assert!(matches!(
            db.add_evaluation(&evaluation(&emp, &[(q, 8), (t, 3), (q, 8)])),
            Err(HrError::InvalidInput { .. })
        ));
        assert!(db.evaluations_for_employee(&emp).unwrap().is_empty());
    }

    #[test]
    fn test_used_criterion_cannot_be_deleted() {
        let db = test_support::db();
        let emp = test_support::employee(&db, "Ana", 3000);
        let q = db.add_criterion("Quality", None, 10).unwrap();
        db.add_evaluation(&evaluation(&emp, &[(q, 5)])).unwrap();
        assert!(db.delete_criterion(q).is_err());
    }

    #[test]
    fn test_average_per_employee() {
        let db = test_support::db();
        let a = test_support::employee(&db, "Ana", 3000);
        let b = test_support::employee(&db, "Ben", 3000);
        let q = db.add_criterion("Quality", None, 10).unwrap();
        db.add_evaluation(&evaluation(&a, &[(q, 6)])).unwrap();
        db.add_evaluation(&evaluation(&a, &[(q, 9)])).unwrap();
        db.add_evaluation(&evaluation(&b, &[(q, 4)])).unwrap();

        let averages = db.average_score_by_employee().unwrap();
        assert_eq!(averages, vec![(a, Decimal::new(75, 1)), (b, Decimal::from(4))]);
    }
}
