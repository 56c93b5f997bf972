use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::repository::{parse_date, parse_ts, parse_uuid};
use crate::db::DatabaseError;
use crate::models::InsurancePolicy;

pub fn insert_policy(conn: &Connection, policy: &InsurancePolicy) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO insurance_policies (id, patient_id, provider, policy_number, coverage_type,
         valid_from, valid_until, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            policy.id.to_string(),
            policy.patient_id.to_string(),
            policy.provider,
            policy.policy_number,
            policy.coverage_type,
            policy.valid_from.to_string(),
            policy.valid_until.map(|d| d.to_string()),
            policy.created_at.to_rfc3339(),
            policy.updated_at.to_rfc3339(),
        ],
    )?;
    Ok(())
}

pub fn list_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<InsurancePolicy>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, provider, policy_number, coverage_type, valid_from, valid_until,
         created_at, updated_at
         FROM insurance_policies WHERE patient_id = ?1 ORDER BY valid_from DESC",
    )?;
    let rows = stmt.query_map(params![patient_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, Option<String>>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut policies = Vec::new();
    for row in rows {
        let (id, patient_id, provider, number, coverage, from, until, created_at, updated_at) =
            row?;
        policies.push(InsurancePolicy {
            id: parse_uuid(&id)?,
            patient_id: parse_uuid(&patient_id)?,
            provider,
            policy_number: number,
            coverage_type: coverage,
            valid_from: parse_date(&from)?,
            valid_until: until.as_deref().map(parse_date).transpose()?,
            created_at: parse_ts(&created_at)?,
            updated_at: parse_ts(&updated_at)?,
        });
    }
    Ok(policies)
}
