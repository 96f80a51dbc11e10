//! Report text composition.
//!
//! Derives the risk level and summary from the top-ranked candidate and
//! renders the explanation and recommendation blocks. Explanation lines are
//! newline-joined and carry `**bold**` markers; recommendations are joined
//! with `||`.

use crate::analysis::catalogue::{rule_for_condition, CHANNEL_ADVICE};
use crate::analysis::scorer::is_sentinel;
use crate::models::{
    BiomarkerInsight, BiomarkerStatus, DiseaseLikelihood, RiskLevel, SymptomState,
};

/// Delimiter between recommendation items.
pub const RECOMMENDATION_DELIMITER: &str = "||";

const URGENT_CARE: &str = "URGENT: Proceed to emergency care immediately.";
const FALLBACK_RECOMMENDATION: &str = "Maintain current healthy lifestyle protocols.";
const REASSURANCE: &str = "All biomarkers are within normal ranges and no symptoms were reported.";
const NORMAL_SUMMARY: &str = "Normal Health Profile";

/// Text portion of a report.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedReport {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub explanation: String,
    pub recommendation: String,
}

/// Composes the report text. `diseases` must be sorted and non-empty.
pub fn compose(
    diseases: &[DiseaseLikelihood],
    insights: &[BiomarkerInsight],
    symptoms: &SymptomState,
) -> ComposedReport {
    let top = diseases.first();
    let (risk_level, summary) = assess_risk(top);

    ComposedReport {
        risk_level,
        summary,
        explanation: explanation_lines(top, insights, symptoms).join("\n"),
        recommendation: recommendation_items(top, risk_level, insights)
            .join(RECOMMENDATION_DELIMITER),
    }
}

/// Risk level and summary for the top candidate.
///
/// The sentinel always maps to Low regardless of its probability.
pub fn assess_risk(top: Option<&DiseaseLikelihood>) -> (RiskLevel, String) {
    let top = match top {
        Some(top) if !is_sentinel(top) => top,
        _ => return (RiskLevel::Low, NORMAL_SUMMARY.to_string()),
    };

    let risk = RiskLevel::from_probability(top.probability);
    let summary = match risk {
        RiskLevel::Critical => format!("Critical Warning: {}", top.name),
        RiskLevel::High => format!("High Likelihood of {}", top.name),
        RiskLevel::Moderate => "Metabolic Irregularities Detected".to_string(),
        RiskLevel::Low => NORMAL_SUMMARY.to_string(),
    };

    (risk, summary)
}

fn explanation_lines(
    top: Option<&DiseaseLikelihood>,
    insights: &[BiomarkerInsight],
    symptoms: &SymptomState,
) -> Vec<String> {
    let mut lines = vec!["**Diagnosis based on current inputs and patient history:**".to_string()];

    if let Some(top) = top {
        lines.push(format!(
            "Highest probability condition: **{} ({}%)**.",
            top.name, top.probability
        ));
    }

    let abnormal: Vec<_> = insights
        .iter()
        .filter(|i| i.status != BiomarkerStatus::Normal)
        .collect();

    if !abnormal.is_empty() {
        lines.push("\n**Biomarker Drivers:**".to_string());
        for insight in &abnormal {
            lines.push(format!(
                "- **{}** is {} ({:.1} {}). {}",
                insight.name, insight.status, insight.value, insight.unit, insight.interpretation
            ));
        }
    }

    let active: Vec<&str> = symptoms.active().iter().map(|s| s.label()).collect();
    if !active.is_empty() {
        lines.push(format!(
            "\n**Clinical Correlation:** Symptoms ({}) align with the biomarker profile.",
            active.join(", ")
        ));
    }

    if abnormal.is_empty() && active.is_empty() {
        lines.push(REASSURANCE.to_string());
    }

    lines
}

fn recommendation_items(
    top: Option<&DiseaseLikelihood>,
    risk_level: RiskLevel,
    insights: &[BiomarkerInsight],
) -> Vec<String> {
    let mut items: Vec<String> = Vec::new();
    let mut push = |item: &str| {
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    };

    if risk_level == RiskLevel::Critical {
        push(URGENT_CARE);
    }

    let top_rule = top.and_then(|t| rule_for_condition(&t.name));
    if let Some(rule) = top_rule {
        for item in rule.recommendations {
            push(*item);
        }
    }

    let top_family = top_rule.map(|r| r.family);
    for advice in CHANNEL_ADVICE {
        let abnormal = insights.iter().any(|i| {
            i.name == advice.channel.display_name() && i.status != BiomarkerStatus::Normal
        });
        let suppressed = advice.unless_top.is_some() && advice.unless_top == top_family;
        if abnormal && !suppressed {
            push(advice.text);
        }
    }

    if items.is_empty() {
        items.push(FALLBACK_RECOMMENDATION.to_string());
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Channel, Symptom};

    fn disease(name: &str, probability: u8) -> DiseaseLikelihood {
        DiseaseLikelihood {
            name: name.to_string(),
            probability,
        }
    }

    fn insight(channel: Channel, value: f64, status: BiomarkerStatus) -> BiomarkerInsight {
        BiomarkerInsight {
            name: channel.display_name().to_string(),
            value,
            unit: channel.unit().to_string(),
            status,
            interpretation: "Interpretation.".to_string(),
        }
    }

    #[test]
    fn test_sentinel_is_low_risk() {
        let (risk, summary) = assess_risk(Some(&disease("Metabolically Healthy", 98)));
        assert_eq!(risk, RiskLevel::Low);
        assert_eq!(summary, "Normal Health Profile");
    }

    #[test]
    fn test_risk_levels_and_summaries() {
        let (risk, summary) = assess_risk(Some(&disease("Diabetic Ketoacidosis (DKA)", 80)));
        assert_eq!(risk, RiskLevel::Critical);
        assert_eq!(summary, "Critical Warning: Diabetic Ketoacidosis (DKA)");

        let (risk, summary) = assess_risk(Some(&disease("H. Pylori / Gastric Infection", 65)));
        assert_eq!(risk, RiskLevel::High);
        assert_eq!(summary, "High Likelihood of H. Pylori / Gastric Infection");

        let (risk, summary) = assess_risk(Some(&disease("Hepatic or Renal Insufficiency", 30)));
        assert_eq!(risk, RiskLevel::Moderate);
        assert_eq!(summary, "Metabolic Irregularities Detected");
    }

    #[test]
    fn test_reassurance_when_nothing_abnormal() {
        let insights = vec![insight(Channel::Acetone, 0.5, BiomarkerStatus::Normal)];
        let composed = compose(
            &[disease("Metabolically Healthy", 98)],
            &insights,
            &SymptomState::default(),
        );

        assert!(composed.explanation.contains(REASSURANCE));
        assert!(!composed.explanation.contains("Biomarker Drivers"));
        assert_eq!(composed.recommendation, FALLBACK_RECOMMENDATION);
    }

    #[test]
    fn test_explanation_cites_drivers_and_symptoms() {
        let insights = vec![
            insight(Channel::Acetone, 6.04, BiomarkerStatus::Critical),
            insight(Channel::Ammonia, 0.2, BiomarkerStatus::Normal),
        ];
        let symptoms = SymptomState::with(&[Symptom::Thirst, Symptom::FrequentUrination]);
        let composed = compose(
            &[disease("Diabetic Ketoacidosis (DKA)", 99)],
            &insights,
            &symptoms,
        );

        let lines: Vec<&str> = composed.explanation.lines().collect();
        assert_eq!(lines[0], "**Diagnosis based on current inputs and patient history:**");
        assert_eq!(
            lines[1],
            "Highest probability condition: **Diabetic Ketoacidosis (DKA) (99%)**."
        );
        assert!(composed
            .explanation
            .contains("- **Acetone** is Critical (6.0 ppm). Interpretation."));
        assert!(!composed.explanation.contains("**Ammonia**"));
        assert!(composed
            .explanation
            .contains("Symptoms (thirst, frequent urination) align"));
        assert!(!composed.explanation.contains(REASSURANCE));
    }

    #[test]
    fn test_critical_prepends_urgent_care() {
        let insights = vec![insight(Channel::Acetone, 6.0, BiomarkerStatus::Critical)];
        let composed = compose(
            &[disease("Diabetic Ketoacidosis (DKA)", 80)],
            &insights,
            &SymptomState::default(),
        );

        let items: Vec<&str> = composed.recommendation.split("||").collect();
        assert_eq!(
            items,
            vec![
                "URGENT: Proceed to emergency care immediately.",
                "Endocrinology: Immediate blood glucose check required.",
                "Hydration: Increase water intake to flush ketones.",
            ]
        );
    }

    #[test]
    fn test_channel_advice_respects_top_family() {
        let co = insight(Channel::CarbonMonoxide, 6.0, BiomarkerStatus::Elevated);

        let toxic = compose(
            &[disease("Environmental Toxicity / CO Exposure", 60)],
            &[co.clone()],
            &SymptomState::default(),
        );
        assert!(!toxic.recommendation.contains("Ventilate"));
        assert!(toxic.recommendation.contains("Evacuate"));

        let other = compose(
            &[disease("H. Pylori / Gastric Infection", 45)],
            &[co],
            &SymptomState::default(),
        );
        assert!(other.recommendation.contains("Ventilate"));
        assert!(!other.recommendation.contains("URGENT"));
    }

    #[test]
    fn test_ethanol_advice_without_rule() {
        let composed = compose(
            &[disease("Metabolically Healthy", 98)],
            &[insight(Channel::Ethanol, 80.0, BiomarkerStatus::Elevated)],
            &SymptomState::default(),
        );
        assert_eq!(
            composed.recommendation,
            "Abstain from alcohol for 24 hours and repeat the breath test."
        );
        assert_eq!(composed.risk_level, RiskLevel::Low);
    }
}
