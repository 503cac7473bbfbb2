//! Senior-citizen allocation programs: periodic, scoped entitlements that
//! BHWs hand out from stock.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::dispensing::{draw_stock, BatchDraw, DispenseError};
use crate::error::WorkflowError;
use crate::models::enums::{DistributionStatus, ProgramFrequency, ScopeType};
use crate::models::{AllocationDistribution, AllocationProgram, DistributionBatch, Scope};

#[derive(Error, Debug)]
pub enum ClaimError {
    #[error("{resident} has already claimed this program for {period}")]
    AlreadyClaimed { resident: String, period: String },

    #[error("{resident} is {age} and not eligible; programs are for residents 60 and older")]
    NotSenior { resident: String, age: u32 },

    #[error("Program is not running on {0}")]
    ProgramNotRunning(NaiveDate),

    #[error("Resident is not covered by this program")]
    NotCovered,

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Dispense(#[from] DispenseError),
}

impl From<DatabaseError> for ClaimError {
    fn from(err: DatabaseError) -> Self {
        ClaimError::Workflow(WorkflowError::Database(err))
    }
}

impl From<rusqlite::Error> for ClaimError {
    fn from(err: rusqlite::Error) -> Self {
        ClaimError::from(DatabaseError::Sqlite(err))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramSummary {
    #[serde(flatten)]
    pub program: AllocationProgram,
    pub medicine_name: String,
    pub period: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntry {
    pub resident_id: Uuid,
    pub full_name: String,
    pub age: u32,
    pub purok: Option<String>,
    pub claimed: bool,
    pub claimed_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramRoster {
    pub program: AllocationProgram,
    pub period: String,
    pub entries: Vec<RosterEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClaimOutcome {
    pub distribution_id: Uuid,
    pub program_id: Uuid,
    pub resident_id: Uuid,
    pub period: String,
    pub draws: Vec<BatchDraw>,
    pub message: String,
}

/// Claim period containing `date`: `once`, `YYYY-MM` or `YYYY-Qn`.
pub fn period_key(frequency: ProgramFrequency, date: NaiveDate) -> String {
    match frequency {
        ProgramFrequency::Once => "once".to_string(),
        ProgramFrequency::Monthly => format!("{:04}-{:02}", date.year(), date.month()),
        ProgramFrequency::Quarterly => {
            format!("{:04}-Q{}", date.year(), (date.month() - 1) / 3 + 1)
        }
    }
}

/// A purok-scoped program is only visible to BHWs of that purok (or of the
/// whole barangay); barangay-wide programs are visible to every BHW there.
fn program_visible(program: &AllocationProgram, scope: &Scope) -> bool {
    if !program.barangay.eq_ignore_ascii_case(&scope.barangay) {
        return false;
    }
    match (program.scope_type, &program.purok, &scope.purok) {
        (ScopeType::Barangay, _, _) => true,
        (ScopeType::Purok, _, None) => true,
        (ScopeType::Purok, Some(p), Some(mine)) => p.eq_ignore_ascii_case(mine),
        (ScopeType::Purok, None, Some(_)) => false,
    }
}

/// Programs running on `today`. `None` scope lists every barangay.
pub fn active_programs(
    conn: &Connection,
    scope: Option<&Scope>,
    today: NaiveDate,
) -> Result<Vec<ProgramSummary>, DatabaseError> {
    let programs = match scope {
        Some(scope) => db::get_programs_for_barangay(conn, &scope.barangay)?
            .into_iter()
            .filter(|p| program_visible(p, scope))
            .collect(),
        None => db::list_active_programs(conn)?,
    };

    let mut summaries = Vec::new();
    for program in programs.into_iter().filter(|p| p.runs_on(today)) {
        let medicine_name = db::get_medicine(conn, &program.medicine_id)?
            .map(|m| m.name)
            .unwrap_or_default();
        summaries.push(ProgramSummary {
            period: period_key(program.frequency, today),
            medicine_name,
            program,
        });
    }
    Ok(summaries)
}

/// Seniors covered by a program with their claim status for the period
/// containing `today`. A `Some` scope hides residents outside it.
pub fn program_roster(
    conn: &Connection,
    program_id: &Uuid,
    scope: Option<&Scope>,
    today: NaiveDate,
) -> Result<ProgramRoster, WorkflowError> {
    let program = db::get_program(conn, program_id)?
        .ok_or_else(|| WorkflowError::not_found("Program", program_id))?;
    if let Some(scope) = scope {
        if !program_visible(&program, scope) {
            return Err(WorkflowError::OutOfScope("Program"));
        }
    }

    let period = period_key(program.frequency, today);
    let claims: HashMap<Uuid, NaiveDateTime> =
        db::get_distributions_for_period(conn, &program.id, &period)?
            .into_iter()
            .map(|d| (d.resident_id, d.claimed_at))
            .collect();

    let area = Scope {
        barangay: program.barangay.clone(),
        purok: None,
    };
    let entries = db::list_residents_in_scope(conn, Some(&area))?
        .into_iter()
        .filter(|r| program.covers(&r.barangay, r.purok.as_deref()))
        .filter(|r| scope.map_or(true, |s| s.covers(&r.barangay, r.purok.as_deref())))
        .filter(|r| r.is_senior_on(today))
        .map(|r| {
            let claimed_at = claims.get(&r.id).copied();
            RosterEntry {
                resident_id: r.id,
                full_name: r.full_name(),
                age: r.age_on(today),
                purok: r.purok,
                claimed: claimed_at.is_some(),
                claimed_at,
            }
        })
        .collect();

    Ok(ProgramRoster { program, period, entries })
}

/// Hand out a resident's entitlement for the current period.
///
/// Duty-gated like dispensing, and run in one `BEGIN IMMEDIATE` transaction:
/// the duplicate check, the FEFO stock draw, and the distribution rows all
/// commit together or not at all.
pub fn record_claim(
    conn: &Connection,
    program_id: &Uuid,
    resident_id: &Uuid,
    bhw_id: &Uuid,
    now: NaiveDateTime,
) -> Result<ClaimOutcome, ClaimError> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;

    match claim_in_tx(&tx, program_id, resident_id, bhw_id, now) {
        Ok(outcome) => {
            tx.commit()?;
            tracing::info!(
                program_id = %program_id,
                resident_id = %resident_id,
                bhw_id = %bhw_id,
                period = %outcome.period,
                "Allocation claimed"
            );
            Ok(outcome)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback() {
                tracing::error!(error = %rollback_err, "Claim rollback failed");
            }
            tracing::warn!(
                program_id = %program_id,
                resident_id = %resident_id,
                bhw_id = %bhw_id,
                error = %err,
                "Claim rolled back"
            );
            Err(err)
        }
    }
}

fn claim_in_tx(
    conn: &Connection,
    program_id: &Uuid,
    resident_id: &Uuid,
    bhw_id: &Uuid,
    now: NaiveDateTime,
) -> Result<ClaimOutcome, ClaimError> {
    let today = now.date();

    if !db::has_active_duty(conn, bhw_id, today)? {
        return Err(DispenseError::NotOnDuty.into());
    }
    let bhw = db::get_user(conn, bhw_id)?
        .filter(|u| u.is_active)
        .ok_or_else(|| WorkflowError::not_found("User", bhw_id))?;

    let program = db::get_program(conn, program_id)?
        .ok_or_else(|| WorkflowError::not_found("Program", program_id))?;
    if !program.runs_on(today) {
        return Err(ClaimError::ProgramNotRunning(today));
    }

    let resident = db::get_resident(conn, resident_id)?
        .filter(|r| r.is_active)
        .ok_or_else(|| WorkflowError::not_found("Resident", resident_id))?;
    if !bhw.can_access(&resident.barangay, resident.purok.as_deref()) {
        return Err(WorkflowError::OutOfScope("Resident").into());
    }
    if !program.covers(&resident.barangay, resident.purok.as_deref()) {
        return Err(ClaimError::NotCovered);
    }
    if !resident.is_senior_on(today) {
        return Err(ClaimError::NotSenior {
            resident: resident.full_name(),
            age: resident.age_on(today),
        });
    }

    let period = period_key(program.frequency, today);
    if db::has_claimed(conn, &program.id, &resident.id, &period)? {
        return Err(ClaimError::AlreadyClaimed {
            resident: resident.full_name(),
            period,
        });
    }

    let distribution = AllocationDistribution {
        id: Uuid::new_v4(),
        program_id: program.id,
        resident_id: resident.id,
        period: period.clone(),
        quantity: program.quantity_per_resident,
        status: DistributionStatus::Claimed,
        distributed_by: bhw.id,
        claimed_at: now,
    };
    match db::insert_distribution(conn, &distribution) {
        Ok(()) => {}
        Err(err) if err.is_unique_violation() => {
            return Err(ClaimError::AlreadyClaimed {
                resident: resident.full_name(),
                period,
            })
        }
        Err(err) => return Err(err.into()),
    }

    let draws = draw_stock(conn, &program.medicine_id, None, program.quantity_per_resident, today)?;
    for draw in &draws {
        db::insert_distribution_batch(
            conn,
            &DistributionBatch {
                distribution_id: distribution.id,
                batch_id: draw.batch_id,
                quantity: draw.quantity,
            },
        )?;
    }

    Ok(ClaimOutcome {
        distribution_id: distribution.id,
        program_id: program.id,
        resident_id: resident.id,
        message: format!(
            "Released {} of {} to {} for {period}",
            program.quantity_per_resident,
            program.name,
            resident.full_name()
        ),
        period,
        draws,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::fixtures::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::UserRole;
    use crate::models::{MedicineBatch, User};

    struct Fixture {
        conn: Connection,
        bhw: User,
        program: AllocationProgram,
        batch: MedicineBatch,
    }

    fn now() -> NaiveDateTime {
        at(date(2026, 10, 19), 9)
    }

    fn fixture(frequency: ProgramFrequency, stock: i64) -> Fixture {
        let conn = open_memory_database().unwrap();
        let bhw = make_user(&conn, UserRole::Bhw, "San Isidro", None);
        make_duty(&conn, bhw.id, date(2026, 10, 19), true);
        let med = make_medicine(&conn, "Losartan", 10);
        let batch = make_batch(&conn, med.id, "L1", stock, date(2027, 6, 1));
        let program = AllocationProgram {
            id: Uuid::new_v4(),
            name: "Senior hypertension".into(),
            medicine_id: med.id,
            quantity_per_resident: 30,
            frequency,
            scope_type: ScopeType::Barangay,
            barangay: "San Isidro".into(),
            purok: None,
            start_date: date(2026, 1, 1),
            end_date: None,
            is_active: true,
        };
        db::insert_program(&conn, &program).unwrap();
        Fixture { conn, bhw, program, batch }
    }

    fn stock_left(f: &Fixture) -> i64 {
        db::get_batch(&f.conn, &f.batch.id).unwrap().unwrap().quantity_available
    }

    #[test]
    fn period_keys() {
        let d = date(2026, 10, 19);
        assert_eq!(period_key(ProgramFrequency::Once, d), "once");
        assert_eq!(period_key(ProgramFrequency::Monthly, d), "2026-10");
        assert_eq!(period_key(ProgramFrequency::Quarterly, d), "2026-Q4");
        assert_eq!(period_key(ProgramFrequency::Quarterly, date(2026, 3, 31)), "2026-Q1");
        assert_eq!(period_key(ProgramFrequency::Monthly, date(2027, 1, 2)), "2027-01");
    }

    #[test]
    fn claim_draws_stock_and_blocks_duplicates() {
        let f = fixture(ProgramFrequency::Monthly, 100);
        let senior = make_resident(&f.conn, date(1950, 5, 1), "San Isidro", Some("Purok 1"));

        let outcome = record_claim(&f.conn, &f.program.id, &senior.id, &f.bhw.id, now()).unwrap();
        assert_eq!(outcome.period, "2026-10");
        assert_eq!(outcome.draws.len(), 1);
        assert_eq!(stock_left(&f), 70);

        let err = record_claim(&f.conn, &f.program.id, &senior.id, &f.bhw.id, now()).unwrap_err();
        assert!(matches!(err, ClaimError::AlreadyClaimed { .. }));
        assert_eq!(stock_left(&f), 70);

        // Next month is a new period.
        make_duty(&f.conn, f.bhw.id, date(2026, 11, 2), true);
        let november = at(date(2026, 11, 2), 9);
        record_claim(&f.conn, &f.program.id, &senior.id, &f.bhw.id, november).unwrap();
        assert_eq!(stock_left(&f), 40);
    }

    #[test]
    fn claim_spanning_batches_writes_one_claim_and_a_line_per_batch() {
        let f = fixture(ProgramFrequency::Monthly, 20);
        let med_id = f.program.medicine_id;
        let later = make_batch(&f.conn, med_id, "L2", 50, date(2027, 9, 1));
        let senior = make_resident(&f.conn, date(1950, 5, 1), "San Isidro", None);

        let outcome = record_claim(&f.conn, &f.program.id, &senior.id, &f.bhw.id, now()).unwrap();
        assert_eq!(stock_left(&f), 0);
        assert_eq!(db::get_batch(&f.conn, &later.id).unwrap().unwrap().quantity_available, 40);

        let claims = db::get_distributions_for_period(&f.conn, &f.program.id, "2026-10").unwrap();
        assert_eq!(claims.len(), 1);
        assert_eq!(claims[0].id, outcome.distribution_id);
        assert_eq!(claims[0].quantity, 30);
        let lines = db::get_distribution_batches(&f.conn, &outcome.distribution_id).unwrap();
        let split: Vec<(Uuid, i64)> = lines.iter().map(|l| (l.batch_id, l.quantity)).collect();
        assert_eq!(split, vec![(f.batch.id, 20), (later.id, 10)]);
    }

    #[test]
    fn claim_requires_senior() {
        let f = fixture(ProgramFrequency::Once, 100);
        let young = make_resident(&f.conn, date(1970, 5, 1), "San Isidro", None);
        let err = record_claim(&f.conn, &f.program.id, &young.id, &f.bhw.id, now()).unwrap_err();
        assert!(matches!(err, ClaimError::NotSenior { age: 56, .. }));
        assert_eq!(stock_left(&f), 100);
    }

    #[test]
    fn claim_requires_duty_and_scope() {
        let f = fixture(ProgramFrequency::Monthly, 100);
        let senior = make_resident(&f.conn, date(1950, 5, 1), "San Isidro", None);
        let off = make_user(&f.conn, UserRole::Bhw, "San Isidro", None);
        let err = record_claim(&f.conn, &f.program.id, &senior.id, &off.id, now()).unwrap_err();
        assert!(matches!(err, ClaimError::Dispense(DispenseError::NotOnDuty)));

        let outsider = make_resident(&f.conn, date(1950, 5, 1), "Poblacion", None);
        let err = record_claim(&f.conn, &f.program.id, &outsider.id, &f.bhw.id, now()).unwrap_err();
        assert!(matches!(err, ClaimError::Workflow(WorkflowError::OutOfScope(_))));
    }

    #[test]
    fn claim_rolls_back_when_stock_is_short() {
        let f = fixture(ProgramFrequency::Monthly, 20);
        let senior = make_resident(&f.conn, date(1950, 5, 1), "San Isidro", None);
        let err = record_claim(&f.conn, &f.program.id, &senior.id, &f.bhw.id, now()).unwrap_err();
        assert!(matches!(
            err,
            ClaimError::Dispense(DispenseError::InsufficientStock { .. })
        ));
        assert_eq!(stock_left(&f), 20);
        assert!(!db::has_claimed(&f.conn, &f.program.id, &senior.id, "2026-10").unwrap());
    }

    #[test]
    fn roster_lists_seniors_with_claim_status() {
        let f = fixture(ProgramFrequency::Monthly, 100);
        let claimed = make_resident(&f.conn, date(1950, 5, 1), "San Isidro", None);
        let waiting = make_resident(&f.conn, date(1960, 1, 1), "San Isidro", None);
        make_resident(&f.conn, date(1990, 1, 1), "San Isidro", None);
        make_resident(&f.conn, date(1940, 1, 1), "Poblacion", None);
        record_claim(&f.conn, &f.program.id, &claimed.id, &f.bhw.id, now()).unwrap();

        let roster = program_roster(&f.conn, &f.program.id, None, date(2026, 10, 19)).unwrap();
        assert_eq!(roster.period, "2026-10");
        assert_eq!(roster.entries.len(), 2);
        let by_id: HashMap<Uuid, &RosterEntry> =
            roster.entries.iter().map(|e| (e.resident_id, e)).collect();
        assert!(by_id[&claimed.id].claimed);
        assert!(!by_id[&waiting.id].claimed);
        assert_eq!(by_id[&waiting.id].age, 66);
    }

    #[test]
    fn active_programs_respect_scope_and_dates() {
        let f = fixture(ProgramFrequency::Monthly, 100);
        let mut purok_only = f.program.clone();
        purok_only.id = Uuid::new_v4();
        purok_only.scope_type = ScopeType::Purok;
        purok_only.purok = Some("Purok 2".into());
        db::insert_program(&f.conn, &purok_only).unwrap();
        let mut ended = f.program.clone();
        ended.id = Uuid::new_v4();
        ended.end_date = Some(date(2026, 6, 30));
        db::insert_program(&f.conn, &ended).unwrap();

        let today = date(2026, 10, 19);
        let purok_1 = Scope {
            barangay: "San Isidro".into(),
            purok: Some("Purok 1".into()),
        };
        let visible = active_programs(&f.conn, Some(&purok_1), today).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].medicine_name, "Losartan");
        assert_eq!(visible[0].period, "2026-10");

        assert_eq!(active_programs(&f.conn, Some(&f.bhw.scope()), today).unwrap().len(), 2);
        assert_eq!(active_programs(&f.conn, None, today).unwrap().len(), 2);
    }
}
