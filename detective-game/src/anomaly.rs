//! Shipment anomaly detection.
//!
//! Each shipment is scored on delay, distance and cost using robust z-scores
//! (median and scaled MAD). The anomaly score is the root-mean-square of the
//! three z-scores, so larger scores are more unusual. The top `contamination`
//! fraction of shipments is flagged.
use serde::{Deserialize, Serialize};

use crate::constants::{MAD_NORMAL_SCALE, MOST_ANOMALOUS_LIMIT};
use crate::dataset::{AnomalyRecord, Shipment};
use crate::numbers::{floor_f64_to_usize, round_to, usize_to_f64};

/// Features used for anomaly scoring, in column order.
pub const ANOMALY_FEATURES: [&str; 3] = ["delay_minutes", "distance_km", "cost"];

fn feature_row(shipment: &Shipment) -> [f64; 3] {
    [
        shipment.delay_minutes(),
        shipment.distance_km,
        shipment.cost,
    ]
}

pub(crate) fn median(values: &[f64]) -> Option<f64> {
    let mut finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if finite.is_empty() {
        return None;
    }
    finite.sort_by(f64::total_cmp);
    let mid = finite.len() / 2;
    if finite.len() % 2 == 0 {
        Some(f64::midpoint(finite[mid - 1], finite[mid]))
    } else {
        Some(finite[mid])
    }
}

fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = usize_to_f64(values.len());
    let mean = values.iter().sum::<f64>() / n;
    (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt()
}

/// Robust z-scores of one column; missing values are imputed with the median.
fn robust_z(column: &[f64]) -> Vec<f64> {
    let Some(center) = median(column) else {
        return vec![0.0; column.len()];
    };
    let imputed: Vec<f64> = column
        .iter()
        .map(|v| if v.is_finite() { *v } else { center })
        .collect();
    let deviations: Vec<f64> = imputed.iter().map(|v| (v - center).abs()).collect();
    let mut spread = median(&deviations).unwrap_or(0.0) * MAD_NORMAL_SCALE;
    if spread <= f64::EPSILON {
        spread = std_dev(&imputed);
    }
    if spread <= f64::EPSILON {
        return vec![0.0; column.len()];
    }
    imputed.iter().map(|v| (v - center) / spread).collect()
}

/// Score every shipment. The output order matches `shipments`.
#[must_use]
pub fn anomaly_scores(shipments: &[Shipment]) -> Vec<f64> {
    if shipments.is_empty() {
        return Vec::new();
    }
    let rows: Vec<[f64; 3]> = shipments.iter().map(feature_row).collect();
    let columns: Vec<Vec<f64>> = (0..ANOMALY_FEATURES.len())
        .map(|col| robust_z(&rows.iter().map(|r| r[col]).collect::<Vec<_>>()))
        .collect();
    let width = usize_to_f64(ANOMALY_FEATURES.len());
    (0..shipments.len())
        .map(|i| {
            let sum_sq: f64 = columns.iter().map(|c| c[i].powi(2)).sum();
            (sum_sq / width).sqrt()
        })
        .collect()
}

/// Score shipments and flag the most unusual `contamination` fraction.
///
/// At least one shipment is flagged whenever the input is non-empty and
/// `contamination` is positive. Ties keep input order.
#[must_use]
pub fn detect_anomalies(shipments: &[Shipment], contamination: f64) -> Vec<AnomalyRecord> {
    let scores = anomaly_scores(shipments);
    let contamination = if contamination.is_finite() {
        contamination.clamp(0.0, 0.5)
    } else {
        0.0
    };
    let mut flag_count = floor_f64_to_usize(usize_to_f64(shipments.len()) * contamination);
    if flag_count == 0 && contamination > 0.0 && !shipments.is_empty() {
        flag_count = 1;
    }

    let mut order: Vec<usize> = (0..shipments.len()).collect();
    order.sort_by(|a, b| scores[*b].total_cmp(&scores[*a]));
    let mut flagged = vec![false; shipments.len()];
    for idx in order.into_iter().take(flag_count) {
        flagged[idx] = true;
    }

    let anomaly_count = flagged.iter().filter(|f| **f).count();
    log::debug!(
        "flagged {anomaly_count} of {} shipments as anomalous",
        shipments.len()
    );

    shipments
        .iter()
        .zip(scores)
        .zip(flagged)
        .map(|((s, score), flag)| AnomalyRecord {
            shipment_id: s.shipment_id.clone(),
            anomaly_score: score,
            anomaly_flag: flag,
        })
        .collect()
}

/// Mean of one feature for anomalous versus normal shipments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureInsight {
    pub feature: String,
    pub anomaly_avg: f64,
    pub normal_avg: f64,
    pub difference_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AnomalyInsights {
    pub total_anomalies: usize,
    pub anomaly_percentage: f64,
    pub insights: Vec<FeatureInsight>,
    pub most_anomalous_ids: Vec<String>,
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / usize_to_f64(count))
}

/// Summarize how flagged shipments differ from the rest.
///
/// `anomalies` must be aligned with `shipments` by shipment id.
#[must_use]
pub fn anomaly_insights(shipments: &[Shipment], anomalies: &[AnomalyRecord]) -> AnomalyInsights {
    if shipments.is_empty() || anomalies.is_empty() {
        return AnomalyInsights::default();
    }
    let is_flagged = |s: &Shipment| {
        anomalies
            .iter()
            .any(|a| a.anomaly_flag && a.shipment_id == s.shipment_id)
    };
    let (flagged, normal): (Vec<&Shipment>, Vec<&Shipment>) =
        shipments.iter().partition(|s| is_flagged(s));

    let mut out = AnomalyInsights {
        total_anomalies: flagged.len(),
        anomaly_percentage: round_to(
            usize_to_f64(flagged.len()) / usize_to_f64(shipments.len()) * 100.0,
            2,
        ),
        ..AnomalyInsights::default()
    };

    if !flagged.is_empty() && !normal.is_empty() {
        for (col, feature) in ANOMALY_FEATURES.iter().enumerate() {
            let anomaly_avg = mean(flagged.iter().map(|s| feature_row(s)[col])).unwrap_or(0.0);
            let normal_avg = mean(normal.iter().map(|s| feature_row(s)[col])).unwrap_or(0.0);
            let difference_pct = if normal_avg.abs() > f64::EPSILON {
                (anomaly_avg - normal_avg) / normal_avg * 100.0
            } else {
                0.0
            };
            out.insights.push(FeatureInsight {
                feature: (*feature).to_string(),
                anomaly_avg: round_to(anomaly_avg, 2),
                normal_avg: round_to(normal_avg, 2),
                difference_pct: round_to(difference_pct, 2),
            });
        }
    }

    let mut ranked: Vec<&AnomalyRecord> = anomalies.iter().filter(|a| a.anomaly_flag).collect();
    ranked.sort_by(|a, b| b.anomaly_score.total_cmp(&a.anomaly_score));
    out.most_anomalous_ids = ranked
        .into_iter()
        .take(MOST_ANOMALOUS_LIMIT)
        .map(|a| a.shipment_id.clone())
        .collect();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::fixtures::shipment;

    fn fleet() -> Vec<Shipment> {
        let mut v: Vec<Shipment> = (0..19)
            .map(|i| shipment(&format!("S{i}"), "Acme", 10 + i, 100.0 + f64::from(i as u8)))
            .collect();
        v.push(shipment("S-OUT", "Globex", 900, 2_000.0));
        v
    }

    #[test]
    fn median_handles_even_odd_and_nan() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 2.0, 3.0]), Some(2.5));
        assert_eq!(median(&[f64::NAN, 5.0]), Some(5.0));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn outlier_is_flagged_and_ranked_first() {
        let shipments = fleet();
        let records = detect_anomalies(&shipments, 0.1);
        assert_eq!(records.len(), 20);
        assert_eq!(records.iter().filter(|r| r.anomaly_flag).count(), 2);
        let outlier = records.iter().find(|r| r.shipment_id == "S-OUT").unwrap();
        assert!(outlier.anomaly_flag);
        assert!(records.iter().all(|r| r.anomaly_score <= outlier.anomaly_score));

        let insights = anomaly_insights(&shipments, &records);
        assert_eq!(insights.total_anomalies, 2);
        assert!((insights.anomaly_percentage - 10.0).abs() < 1e-9);
        assert_eq!(insights.most_anomalous_ids[0], "S-OUT");
        assert_eq!(insights.insights.len(), 3);
        let delay = &insights.insights[0];
        assert_eq!(delay.feature, "delay_minutes");
        assert!(delay.anomaly_avg > delay.normal_avg);
    }

    #[test]
    fn small_inputs_still_flag_one() {
        let shipments = vec![shipment("A", "Acme", 5, 10.0), shipment("B", "Acme", 500, 10.0)];
        let records = detect_anomalies(&shipments, 0.1);
        assert_eq!(records.iter().filter(|r| r.anomaly_flag).count(), 1);
        assert!(detect_anomalies(&[], 0.1).is_empty());
        assert_eq!(
            detect_anomalies(&shipments, 0.0)
                .iter()
                .filter(|r| r.anomaly_flag)
                .count(),
            0
        );
    }

    #[test]
    fn identical_rows_score_zero() {
        let shipments: Vec<Shipment> = (0..5)
            .map(|i| shipment(&format!("S{i}"), "Acme", 30, 50.0))
            .collect();
        assert!(anomaly_scores(&shipments).iter().all(|s| s.abs() < 1e-12));
        assert_eq!(
            anomaly_insights(&[], &[]),
            AnomalyInsights::default()
        );
    }
}
