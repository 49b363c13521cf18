use std::fmt::Write;

use crate::cargo::{CargoRecord, ShipmentSnapshot};
use crate::cli::SortOrder;
use crate::output::format::ordered;

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub(crate) fn output_records_csv(records: &[CargoRecord], order: SortOrder) -> String {
    let mut out = String::from(
        "id,cargo_type,length,width,height,weight,volume,packaging,packaging_count,photos,batch_quantity,group_key,employee_id,timestamp\n",
    );
    for r in ordered(records, order) {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            r.id,
            r.cargo_type,
            r.dimensions.length,
            r.dimensions.width,
            r.dimensions.height,
            r.weight,
            r.volume,
            r.packaging.kind.as_str(),
            r.packaging.count,
            csv_escape(&r.photos.join(";")),
            r.batch_quantity,
            csv_escape(&r.group_key),
            r.employee_id,
            r.timestamp.to_rfc3339(),
        );
    }
    out
}

pub(crate) fn output_history_csv(history: &[ShipmentSnapshot], order: SortOrder) -> String {
    let mut out = String::from("id,created_at,employee_id,employee_name,status,places,weight,volume\n");
    for s in ordered(history, order) {
        let _ = writeln!(
            out,
            "{},{},{},{},{},{},{},{}",
            s.id,
            s.created_at.to_rfc3339(),
            s.employee_id,
            csv_escape(&s.employee_name),
            s.status.as_str(),
            s.totals.total_places,
            s.totals.total_weight,
            s.totals.total_volume,
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::EmployeeCode;
    use crate::cargo::{CargoType, Packaging, PackagingKind};

    #[test]
    fn csv_escape_quotes_special_chars() {
        assert_eq!(csv_escape("plain"), "plain");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn records_csv_one_line_per_unit() {
        let dimensions = CargoType::EuroPallet.default_dimensions();
        let record = CargoRecord {
            id: 7,
            cargo_type: CargoType::EuroPallet,
            dimensions,
            weight: 250.0,
            volume: dimensions.volume_m3(),
            packaging: Packaging::new(PackagingKind::Crate, 2),
            photos: vec!["a.jpg".to_string(), "b.jpg".to_string()],
            quantity: 1,
            batch_quantity: 1,
            batch_id: 7,
            group_key: "euro-pallet|120x80x30|250|crate:2|1|2".to_string(),
            employee_id: EmployeeCode::parse("EMP003").unwrap(),
            timestamp: "2026-03-01T09:00:00Z".parse().unwrap(),
        };
        let csv = output_records_csv(&[record], SortOrder::Asc);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "7,euro-pallet,120,80,30,250,0.288,crate,2,a.jpg;b.jpg,1,euro-pallet|120x80x30|250|crate:2|1|2,EMP003,2026-03-01T09:00:00+00:00"
        );
    }
}
