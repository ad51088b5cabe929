//! Report rollups: the secondary sheets an export shows next to the raw rows.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::aggregation::{AppointmentSummaryRow, MedicineSales, PatientSummaryRow};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockValueRow {
    pub name: String,
    pub category: String,
    pub stock: i64,
    pub price_cents: i64,
    pub stock_value_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MedicineReportTotals {
    pub medicine_count: usize,
    pub total_stock: i64,
    pub total_revenue_cents: i64,
    pub average_price_cents: f64,
}

#[derive(Debug, Serialize)]
pub struct MedicineReport {
    pub sales: Vec<MedicineSales>,
    pub stock_value: Vec<StockValueRow>,
    pub totals: MedicineReportTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct AppointmentReport {
    pub appointments: Vec<AppointmentSummaryRow>,
    pub by_department: Vec<Tally>,
    pub by_status: Vec<Tally>,
}

#[derive(Debug, Serialize)]
pub struct PatientReport {
    pub patients: Vec<PatientSummaryRow>,
    pub by_age: Vec<Tally>,
    pub by_gender: Vec<Tally>,
}

/// Right-inclusive age bins: (lower exclusive, upper inclusive, label).
/// Age 0 falls below the first bin and is counted as "other".
const AGE_BINS: [(i64, i64, &str); 5] = [
    (0, 18, "0-18"),
    (18, 30, "19-30"),
    (30, 50, "31-50"),
    (50, 70, "51-70"),
    (70, 100, "71-100"),
];

pub fn medicine_report(sales: Vec<MedicineSales>) -> MedicineReport {
    let stock_value = sales
        .iter()
        .map(|s| StockValueRow {
            name: s.name.clone(),
            category: s.category.clone(),
            stock: s.stock,
            price_cents: s.price_cents,
            stock_value_cents: s.stock * s.price_cents,
        })
        .collect();

    let medicine_count = sales.len();
    let average_price_cents = if medicine_count == 0 {
        0.0
    } else {
        sales.iter().map(|s| s.price_cents as f64).sum::<f64>() / medicine_count as f64
    };

    let totals = MedicineReportTotals {
        medicine_count,
        total_stock: sales.iter().map(|s| s.stock).sum(),
        total_revenue_cents: sales.iter().map(|s| s.revenue_cents).sum(),
        average_price_cents,
    };

    MedicineReport {
        sales,
        stock_value,
        totals,
    }
}

fn tally<'a>(labels: impl Iterator<Item = &'a str>) -> Vec<Tally> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(label, count)| Tally {
            label: label.to_string(),
            count,
        })
        .collect()
}

pub fn appointment_report(appointments: Vec<AppointmentSummaryRow>) -> AppointmentReport {
    let by_department = tally(appointments.iter().map(|a| a.department.as_str()));
    let by_status = tally(appointments.iter().map(|a| a.status.as_str()));
    AppointmentReport {
        appointments,
        by_department,
        by_status,
    }
}

pub fn age_bucket(age: i64) -> &'static str {
    AGE_BINS
        .iter()
        .find(|(lo, hi, _)| age > *lo && age <= *hi)
        .map(|(_, _, label)| *label)
        .unwrap_or("other")
}

fn age_tally(patients: &[PatientSummaryRow]) -> Vec<Tally> {
    // every bin is listed, in age order, even when empty
    let mut by_age: Vec<Tally> = AGE_BINS
        .iter()
        .map(|(_, _, label)| Tally {
            label: label.to_string(),
            count: patients.iter().filter(|p| age_bucket(p.age) == *label).count(),
        })
        .collect();
    let other = patients.iter().filter(|p| age_bucket(p.age) == "other").count();
    if other > 0 {
        by_age.push(Tally {
            label: "other".into(),
            count: other,
        });
    }
    by_age
}

pub fn patient_report(patients: Vec<PatientSummaryRow>) -> PatientReport {
    let by_age = if patients.is_empty() {
        Vec::new()
    } else {
        age_tally(&patients)
    };
    let by_gender = tally(patients.iter().map(|p| p.gender.as_str()));
    PatientReport {
        patients,
        by_age,
        by_gender,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AppointmentStatus;
    use chrono::{NaiveDate, Utc};

    fn sales(name: &str, price_cents: i64, stock: i64, sold: i64) -> MedicineSales {
        MedicineSales {
            medicine_id: 1,
            name: name.into(),
            category: "OTC".into(),
            price_cents,
            stock,
            total_sold: sold,
            revenue_cents: sold * price_cents,
        }
    }

    fn appointment(department: &str, status: AppointmentStatus) -> AppointmentSummaryRow {
        AppointmentSummaryRow {
            id: 1,
            patient_name: "Zhang San".into(),
            doctor_name: "Dr. Li".into(),
            department: department.into(),
            scheduled_at: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
            status,
            notes: None,
        }
    }

    fn patient(age: i64, gender: &str) -> PatientSummaryRow {
        PatientSummaryRow {
            id: 1,
            name: "Li Si".into(),
            age,
            gender: gender.into(),
            registered_at: Utc::now(),
            appointment_count: 0,
        }
    }

    #[test]
    fn medicine_report_values_stock_and_sums_revenue() {
        let report = medicine_report(vec![sales("Aspirin", 1500, 10, 4), sales("Ibuprofen", 2500, 2, 0)]);

        assert_eq!(report.stock_value[0].stock_value_cents, 15_000);
        assert_eq!(report.stock_value[1].stock_value_cents, 5_000);
        assert_eq!(
            report.totals,
            MedicineReportTotals {
                medicine_count: 2,
                total_stock: 12,
                total_revenue_cents: 6_000,
                average_price_cents: 2_000.0,
            }
        );
    }

    #[test]
    fn empty_medicine_report_has_zero_average() {
        let report = medicine_report(Vec::new());
        assert_eq!(report.totals.medicine_count, 0);
        assert_eq!(report.totals.average_price_cents, 0.0);
    }

    #[test]
    fn appointment_report_counts_departments_and_statuses() {
        let report = appointment_report(vec![
            appointment("Surgery", AppointmentStatus::Completed),
            appointment("Internal Medicine", AppointmentStatus::Scheduled),
            appointment("Surgery", AppointmentStatus::Scheduled),
        ]);
        assert_eq!(
            report.by_department,
            vec![
                Tally { label: "Internal Medicine".into(), count: 1 },
                Tally { label: "Surgery".into(), count: 2 },
            ]
        );
        assert_eq!(
            report.by_status,
            vec![
                Tally { label: "completed".into(), count: 1 },
                Tally { label: "scheduled".into(), count: 2 },
            ]
        );
        assert!(appointment_report(Vec::new()).by_department.is_empty());
    }

    #[test]
    fn age_bins_are_right_inclusive() {
        assert_eq!(age_bucket(0), "other");
        assert_eq!(age_bucket(1), "0-18");
        assert_eq!(age_bucket(18), "0-18");
        assert_eq!(age_bucket(19), "19-30");
        assert_eq!(age_bucket(30), "19-30");
        assert_eq!(age_bucket(50), "31-50");
        assert_eq!(age_bucket(100), "71-100");
        assert_eq!(age_bucket(101), "other");
    }

    #[test]
    fn patient_report_lists_every_age_bin_and_gender() {
        let report = patient_report(vec![
            patient(35, "male"),
            patient(28, "female"),
            patient(42, "male"),
            patient(120, "female"),
            patient(0, "female"),
        ]);
        let ages: Vec<(&str, usize)> = report.by_age.iter().map(|t| (t.label.as_str(), t.count)).collect();
        assert_eq!(
            ages,
            vec![("0-18", 0), ("19-30", 1), ("31-50", 2), ("51-70", 0), ("71-100", 0), ("other", 2)]
        );
        assert_eq!(
            report.by_gender,
            vec![
                Tally { label: "female".into(), count: 3 },
                Tally { label: "male".into(), count: 2 },
            ]
        );
        assert!(patient_report(Vec::new()).by_age.is_empty());
    }
}
