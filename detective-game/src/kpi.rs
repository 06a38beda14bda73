//! Dashboard KPIs. Display-only: the game core never branches on these values.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::DEFAULT_WAREHOUSE_LOAD_PCT;
use crate::dataset::{Shipment, Warehouse};
use crate::numbers::{round_to, usize_to_f64};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Kpis {
    pub total_shipments: usize,
    pub late_shipments: usize,
    pub average_delay_minutes: f64,
    pub percent_delayed: f64,
    pub order_backlog: usize,
    pub cost_delay_correlation: f64,
    pub supplier_reliability: BTreeMap<String, f64>,
    pub warehouse_load_index: Option<f64>,
}

impl Kpis {
    /// Scalar KPIs as `(name, value)` pairs in display order.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, f64)> {
        let mut out = vec![
            ("total_shipments", usize_to_f64(self.total_shipments)),
            ("late_shipments", usize_to_f64(self.late_shipments)),
            ("average_delay_minutes", self.average_delay_minutes),
            ("percent_delayed", self.percent_delayed),
            ("order_backlog", usize_to_f64(self.order_backlog)),
            ("cost_delay_correlation", self.cost_delay_correlation),
        ];
        if let Some(load) = self.warehouse_load_index {
            out.push(("warehouse_load_index", load));
        }
        out
    }

    /// Least reliable supplier, if any.
    #[must_use]
    pub fn weakest_supplier(&self) -> Option<(&str, f64)> {
        self.supplier_reliability
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(name, score)| (name.as_str(), *score))
    }
}

/// Mean delay in minutes over late shipments only; 0 when nothing is late.
#[must_use]
pub fn average_delay(shipments: &[Shipment]) -> f64 {
    let late: Vec<f64> = shipments
        .iter()
        .map(Shipment::delay_minutes)
        .filter(|d| *d > 0.0)
        .collect();
    if late.is_empty() {
        return 0.0;
    }
    late.iter().sum::<f64>() / usize_to_f64(late.len())
}

#[must_use]
pub fn percent_delayed(shipments: &[Shipment]) -> f64 {
    if shipments.is_empty() {
        return 0.0;
    }
    usize_to_f64(order_backlog(shipments)) / usize_to_f64(shipments.len()) * 100.0
}

/// Count of shipments that arrived after their expected time.
#[must_use]
pub fn order_backlog(shipments: &[Shipment]) -> usize {
    shipments.iter().filter(|s| s.is_late()).count()
}

/// Mean utilisation (%) across warehouses, each clipped to 0..=100.
///
/// Falls back to a 65% baseline when no warehouse reports its current load.
#[must_use]
pub fn warehouse_load_index(warehouses: &[Warehouse]) -> f64 {
    if warehouses.is_empty() {
        return 0.0;
    }
    let ratios: Vec<f64> = warehouses
        .iter()
        .filter(|w| w.capacity > 0)
        .filter_map(|w| {
            w.current_load
                .map(|load| (f64::from(load) / f64::from(w.capacity) * 100.0).clamp(0.0, 100.0))
        })
        .collect();
    if ratios.is_empty() {
        return DEFAULT_WAREHOUSE_LOAD_PCT;
    }
    ratios.iter().sum::<f64>() / usize_to_f64(ratios.len())
}

/// Reliability per supplier: 100 minus that supplier's late percentage.
#[must_use]
pub fn supplier_reliability(shipments: &[Shipment]) -> BTreeMap<String, f64> {
    let mut tallies: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for s in shipments {
        let entry = tallies.entry(s.supplier.as_str()).or_default();
        entry.0 += 1;
        if s.is_late() {
            entry.1 += 1;
        }
    }
    tallies
        .into_iter()
        .map(|(supplier, (total, late))| {
            let delay_rate = usize_to_f64(late) / usize_to_f64(total) * 100.0;
            (supplier.to_string(), 100.0 - delay_rate)
        })
        .collect()
}

/// Pearson correlation between cost and delay; 0 when undefined.
#[must_use]
pub fn cost_delay_correlation(shipments: &[Shipment]) -> f64 {
    let pairs: Vec<(f64, f64)> = shipments
        .iter()
        .map(|s| (s.cost, s.delay_minutes()))
        .filter(|(c, d)| c.is_finite() && d.is_finite())
        .collect();
    if pairs.len() < 2 {
        return 0.0;
    }
    let n = usize_to_f64(pairs.len());
    let mean_c = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_d = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut cov, mut var_c, mut var_d) = (0.0, 0.0, 0.0);
    for (c, d) in &pairs {
        cov += (c - mean_c) * (d - mean_d);
        var_c += (c - mean_c).powi(2);
        var_d += (d - mean_d).powi(2);
    }
    let denom = (var_c * var_d).sqrt();
    if denom <= f64::EPSILON || !denom.is_finite() {
        return 0.0;
    }
    (cov / denom).clamp(-1.0, 1.0)
}

/// Compute every KPI for the dashboard.
#[must_use]
pub fn compute_kpis(shipments: &[Shipment], warehouses: Option<&[Warehouse]>) -> Kpis {
    let backlog = order_backlog(shipments);
    Kpis {
        total_shipments: shipments.len(),
        late_shipments: backlog,
        average_delay_minutes: round_to(average_delay(shipments), 2),
        percent_delayed: round_to(percent_delayed(shipments), 2),
        order_backlog: backlog,
        cost_delay_correlation: round_to(cost_delay_correlation(shipments), 3),
        supplier_reliability: supplier_reliability(shipments),
        warehouse_load_index: warehouses.map(|w| round_to(warehouse_load_index(w), 2)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::{shipment, warehouse};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn empty_inputs_are_zero() {
        let kpis = compute_kpis(&[], None);
        assert_eq!(kpis.total_shipments, 0);
        assert!(approx(kpis.percent_delayed, 0.0));
        assert!(approx(kpis.average_delay_minutes, 0.0));
        assert!(kpis.supplier_reliability.is_empty());
        assert!(kpis.warehouse_load_index.is_none());
        assert!(approx(warehouse_load_index(&[]), 0.0));
    }

    #[test]
    fn delay_metrics_only_count_late_shipments() {
        let shipments = vec![
            shipment("S1", "Acme", 30, 100.0),
            shipment("S2", "Acme", 90, 200.0),
            shipment("S3", "Globex", -20, 150.0),
            shipment("S4", "Globex", 0, 150.0),
        ];
        let kpis = compute_kpis(&shipments, None);
        assert_eq!(kpis.late_shipments, 2);
        assert_eq!(kpis.order_backlog, 2);
        assert!(approx(kpis.average_delay_minutes, 60.0));
        assert!(approx(kpis.percent_delayed, 50.0));
        assert!(approx(kpis.supplier_reliability["Acme"], 0.0));
        assert!(approx(kpis.supplier_reliability["Globex"], 100.0));
        assert_eq!(kpis.weakest_supplier(), Some(("Acme", 0.0)));
    }

    #[test]
    fn correlation_is_bounded_and_handles_zero_variance() {
        let rising = vec![
            shipment("S1", "Acme", 10, 100.0),
            shipment("S2", "Acme", 20, 200.0),
            shipment("S3", "Acme", 30, 300.0),
        ];
        assert!(approx(cost_delay_correlation(&rising), 1.0));

        let flat = vec![
            shipment("S1", "Acme", 10, 100.0),
            shipment("S2", "Acme", 20, 100.0),
        ];
        assert!(approx(cost_delay_correlation(&flat), 0.0));
        assert!(approx(cost_delay_correlation(&rising[..1]), 0.0));
    }

    #[test]
    fn warehouse_load_clips_and_falls_back() {
        let loaded = vec![
            warehouse("WH-01", 100, Some(50)),
            warehouse("WH-02", 100, Some(250)),
        ];
        assert!(approx(warehouse_load_index(&loaded), 75.0));

        let unknown = vec![warehouse("WH-01", 100, None)];
        assert!(approx(warehouse_load_index(&unknown), 65.0));

        let kpis = compute_kpis(&[shipment("S1", "Acme", 5, 1.0)], Some(&loaded));
        assert_eq!(kpis.warehouse_load_index, Some(75.0));
        assert_eq!(kpis.entries().last().map(|e| e.0), Some("warehouse_load_index"));
        assert_eq!(kpis.entries().len(), 7);
    }
}
