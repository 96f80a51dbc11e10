//! Historical baseline aggregation.
//!
//! Reduces past reports to a per-channel mean. The result is only an
//! advisory trend signal and never feeds classification.

use crate::models::AnalysisReport;
use std::collections::HashMap;

/// Per-channel historical mean keyed by insight name.
pub type Baselines = HashMap<String, f64>;

/// Mean value of every insight name seen across `reports`.
///
/// Returns `None` for an empty history. Channels never observed are absent.
pub fn averages(reports: &[AnalysisReport]) -> Option<Baselines> {
    if reports.is_empty() {
        return None;
    }

    let mut totals: HashMap<&str, (f64, usize)> = HashMap::new();

    for insight in reports.iter().flat_map(|r| &r.biomarker_insights) {
        let entry = totals.entry(insight.name.as_str()).or_insert((0.0, 0));
        entry.0 += insight.value;
        entry.1 += 1;
    }

    Some(
        totals
            .into_iter()
            .map(|(name, (sum, count))| (name.to_string(), sum / count as f64))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerInsight, BiomarkerStatus, RiskLevel};

    fn insight(name: &str, value: f64) -> BiomarkerInsight {
        BiomarkerInsight {
            name: name.to_string(),
            value,
            unit: "ppm".to_string(),
            status: BiomarkerStatus::Normal,
            interpretation: String::new(),
        }
    }

    fn report(insights: Vec<BiomarkerInsight>) -> AnalysisReport {
        AnalysisReport {
            id: "rpt".to_string(),
            timestamp: 0,
            risk_level: RiskLevel::Low,
            summary: String::new(),
            diseases: Vec::new(),
            explanation: String::new(),
            recommendation: String::new(),
            biomarker_insights: insights,
        }
    }

    #[test]
    fn test_empty_history_has_no_baseline() {
        assert!(averages(&[]).is_none());
    }

    #[test]
    fn test_averages_per_name() {
        let history = vec![
            report(vec![insight("Acetone", 1.0), insight("Ammonia", 0.4)]),
            report(vec![insight("Acetone", 3.0)]),
        ];

        let avg = averages(&history).unwrap();

        assert_eq!(avg.get("Acetone"), Some(&2.0));
        assert_eq!(avg.get("Ammonia"), Some(&0.4));
        assert!(avg.get("Methane").is_none());
    }

    #[test]
    fn test_reports_without_insights_give_empty_baseline() {
        let avg = averages(&[report(Vec::new())]).unwrap();
        assert!(avg.is_empty());
    }
}
