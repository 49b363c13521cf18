use chrono::{DateTime, TimeDelta, Utc};
use serde_json::{Value, json};

use crate::auth::{Employee, Session};
use crate::cargo::{CargoRecord, GroupSummary, ShipmentSnapshot, Totals};
use crate::cli::SortOrder;
use crate::output::format::ordered;
use crate::qr::{Detection, PayloadKind};

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string())
}

/// Record with photo names only
fn record_json(record: &CargoRecord) -> Value {
    json!({
        "id": record.id,
        "cargoType": record.cargo_type,
        "length": record.dimensions.length,
        "width": record.dimensions.width,
        "height": record.dimensions.height,
        "weight": record.weight,
        "volume": record.volume,
        "packaging": record.packaging,
        "photos": record.photos,
        "quantity": record.quantity,
        "batchQuantity": record.batch_quantity,
        "batchId": record.batch_id,
        "groupKey": record.group_key,
        "employeeId": record.employee_id,
        "timestamp": record.timestamp,
    })
}

pub(crate) fn output_records_json(records: &[CargoRecord], order: SortOrder) -> String {
    let rows: Vec<Value> = ordered(records, order).into_iter().map(record_json).collect();
    pretty(&Value::Array(rows))
}

pub(crate) fn output_groups_json(groups: &[GroupSummary], order: SortOrder) -> String {
    let rows: Vec<Value> = ordered(groups, order)
        .into_iter()
        .map(|g| {
            json!({
                "groupKey": g.group_key,
                "count": g.count,
                "totalWeight": g.total_weight,
                "totalVolume": g.total_volume,
                "representative": record_json(&g.representative),
            })
        })
        .collect();
    pretty(&Value::Array(rows))
}

/// Outcome of `remove` and `clear`
pub(crate) fn output_removal_json(removed: usize, remaining: usize) -> String {
    pretty(&json!({ "removed": removed, "remaining": remaining }))
}

pub(crate) fn output_summary_json(totals: &Totals) -> String {
    pretty(&json!(totals))
}

fn snapshot_json(shipment: &ShipmentSnapshot) -> Value {
    json!({
        "id": shipment.id,
        "employeeId": shipment.employee_id,
        "employeeName": shipment.employee_name,
        "createdAt": shipment.created_at,
        "status": shipment.status,
        "totals": shipment.totals,
        "records": shipment.records.iter().map(record_json).collect::<Vec<_>>(),
    })
}

pub(crate) fn output_snapshot_json(shipment: &ShipmentSnapshot) -> String {
    pretty(&snapshot_json(shipment))
}

pub(crate) fn output_history_json(history: &[ShipmentSnapshot], order: SortOrder) -> String {
    let rows: Vec<Value> = ordered(history, order).into_iter().map(snapshot_json).collect();
    pretty(&Value::Array(rows))
}

fn employee_json(employee: &Employee) -> Value {
    json!({
        "code": employee.code,
        "name": employee.full_name,
        "lastName": employee.last_name(),
        "firstName": employee.first_name(),
        "position": employee.position,
        "department": employee.department,
    })
}

pub(crate) fn output_employees_json<'a>(employees: impl Iterator<Item = &'a Employee>) -> String {
    let rows: Vec<Value> = employees.map(employee_json).collect();
    pretty(&Value::Array(rows))
}

pub(crate) fn output_status_json(
    session: Option<&Session>,
    now: DateTime<Utc>,
    window: TimeDelta,
    places: usize,
) -> String {
    let value = match session {
        Some(session) => json!({
            "loggedIn": true,
            "session": session,
            "remainingMinutes": session.remaining(now, window).num_minutes(),
            "places": places,
        }),
        None => json!({ "loggedIn": false }),
    };
    pretty(&value)
}

pub(crate) fn output_decode_json(payload: &str, result: Result<&Detection, &PayloadKind>) -> String {
    let value = match result {
        Ok(detection) => json!({
            "payload": payload,
            "code": detection.code,
            "strategy": detection.strategy.label(),
        }),
        Err(kind) => json!({
            "payload": payload,
            "code": Value::Null,
            "kind": kind.to_string(),
        }),
    };
    pretty(&value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EmployeeCode;
    use crate::cargo::{CargoType, Packaging};

    fn record(id: u64) -> CargoRecord {
        let dimensions = CargoType::Box.default_dimensions();
        CargoRecord {
            id,
            cargo_type: CargoType::Box,
            dimensions,
            weight: 2.5,
            volume: dimensions.volume_m3(),
            packaging: Packaging::default(),
            photos: vec!["front.jpg".to_string()],
            quantity: 1,
            batch_quantity: 1,
            batch_id: 1,
            group_key: "k".to_string(),
            employee_id: EmployeeCode::parse("EMP001").unwrap(),
            timestamp: "2026-03-01T09:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn records_json_lists_photo_names_and_respects_order() {
        let records = vec![record(1), record(2)];
        let json: Value = serde_json::from_str(&output_records_json(&records, SortOrder::Desc)).unwrap();
        let arr = json.as_array().unwrap();
        assert_eq!(arr[0]["id"], 2);
        assert_eq!(arr[0]["cargoType"], "box");
        assert_eq!(arr[0]["length"], 60);
        assert_eq!(arr[0]["photos"], json!(["front.jpg"]));
        assert_eq!(arr[0]["packaging"]["kind"], "none");
        assert_eq!(arr[0]["timestamp"], "2026-03-01T09:00:00Z");
    }

    #[test]
    fn removal_json_counts() {
        let json: Value = serde_json::from_str(&output_removal_json(2, 5)).unwrap();
        assert_eq!(json, json!({ "removed": 2, "remaining": 5 }));
    }

    #[test]
    fn status_json_when_logged_out() {
        let json: Value =
            serde_json::from_str(&output_status_json(None, Utc::now(), TimeDelta::hours(8), 0)).unwrap();
        assert_eq!(json, json!({ "loggedIn": false }));
    }
}
