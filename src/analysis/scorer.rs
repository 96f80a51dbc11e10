//! Differential-diagnosis scoring.
//!
//! Runs every rule of the catalogue independently over the evaluated
//! insights and the symptom flags. Rules do not exclude each other, so
//! several candidates can be reported for one evaluation.

use crate::analysis::catalogue::{ConditionLabel, ConditionRule, CATALOGUE};
use crate::models::{BiomarkerInsight, BiomarkerStatus, Channel, DiseaseLikelihood, SymptomState};
use std::collections::HashMap;
use tracing::debug;

/// Name of the candidate emitted when no rule clears its floor.
pub const SENTINEL_CONDITION: &str = "Metabolically Healthy";

/// Probability attached to the sentinel. Informational only.
pub const SENTINEL_PROBABILITY: u8 = 98;

/// Channel statuses looked up by rules.
///
/// Channels without an insight read as Normal.
#[derive(Debug, Default)]
pub struct StatusTable(HashMap<Channel, BiomarkerStatus>);

impl StatusTable {
    pub fn from_insights(insights: &[BiomarkerInsight]) -> Self {
        let statuses = insights
            .iter()
            .filter_map(|insight| {
                Channel::ALL
                    .into_iter()
                    .find(|c| c.display_name() == insight.name)
                    .map(|c| (c, insight.status))
            })
            .collect();
        Self(statuses)
    }

    pub fn status(&self, channel: Channel) -> BiomarkerStatus {
        self.0
            .get(&channel)
            .copied()
            .unwrap_or(BiomarkerStatus::Normal)
    }

    /// Worst status among `channels`.
    pub fn worst(&self, channels: &[Channel]) -> BiomarkerStatus {
        channels
            .iter()
            .map(|c| self.status(*c))
            .max()
            .unwrap_or(BiomarkerStatus::Normal)
    }
}

impl ConditionRule {
    /// Unclamped score for this rule.
    pub fn accumulate(&self, statuses: &StatusTable, symptoms: &SymptomState) -> u32 {
        let channel_points: u32 = self
            .channel_terms
            .iter()
            .map(|term| term.points(statuses.worst(term.channels)))
            .sum();

        let symptom_points: u32 = self
            .symptom_weights
            .iter()
            .filter(|(symptom, _)| symptoms.is_set(*symptom))
            .map(|(_, points)| *points)
            .sum();

        channel_points + symptom_points
    }

    /// Display name for a given unclamped score.
    pub fn label_for(&self, score: u32, statuses: &StatusTable) -> &'static str {
        match self.label {
            ConditionLabel::Fixed(name) => name,
            ConditionLabel::ByScore {
                above,
                severe,
                generic,
            } => {
                if score > above {
                    severe
                } else {
                    generic
                }
            }
            ConditionLabel::ByCriticalChannel {
                channel,
                critical,
                otherwise,
            } => {
                if statuses.status(channel) == BiomarkerStatus::Critical {
                    critical
                } else {
                    otherwise
                }
            }
        }
    }

    /// Scores the rule, returning a candidate only above the floor.
    pub fn evaluate(
        &self,
        statuses: &StatusTable,
        symptoms: &SymptomState,
    ) -> Option<DiseaseLikelihood> {
        let score = self.accumulate(statuses, symptoms);
        if score <= self.floor {
            return None;
        }

        let name = self.label_for(score, statuses);
        let probability = score.min(u32::from(self.ceiling)) as u8;
        debug!("{:?} rule fired: {} ({}%)", self.family, name, probability);

        Some(DiseaseLikelihood {
            name: name.to_string(),
            probability,
        })
    }
}

/// Scores the built-in catalogue.
pub fn score(insights: &[BiomarkerInsight], symptoms: &SymptomState) -> Vec<DiseaseLikelihood> {
    score_with(CATALOGUE, insights, symptoms)
}

/// Scores an arbitrary catalogue.
///
/// The result is sorted by descending probability, ties kept in catalogue
/// order, and is never empty.
pub fn score_with(
    catalogue: &[ConditionRule],
    insights: &[BiomarkerInsight],
    symptoms: &SymptomState,
) -> Vec<DiseaseLikelihood> {
    let statuses = StatusTable::from_insights(insights);

    let mut diseases: Vec<DiseaseLikelihood> = catalogue
        .iter()
        .filter_map(|rule| rule.evaluate(&statuses, symptoms))
        .collect();

    if diseases.is_empty() {
        diseases.push(DiseaseLikelihood {
            name: SENTINEL_CONDITION.to_string(),
            probability: SENTINEL_PROBABILITY,
        });
    }

    diseases.sort_by(|a, b| b.probability.cmp(&a.probability));
    diseases
}

/// Whether a candidate is the no-finding sentinel.
pub fn is_sentinel(disease: &DiseaseLikelihood) -> bool {
    disease.name == SENTINEL_CONDITION
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::catalogue::{ChannelTerm, Family};
    use crate::models::Symptom;

    fn insight(channel: Channel, status: BiomarkerStatus) -> BiomarkerInsight {
        BiomarkerInsight {
            name: channel.display_name().to_string(),
            value: 1.0,
            unit: channel.unit().to_string(),
            status,
            interpretation: String::new(),
        }
    }

    fn all_normal() -> Vec<BiomarkerInsight> {
        Channel::ALL
            .into_iter()
            .map(|c| insight(c, BiomarkerStatus::Normal))
            .collect()
    }

    fn with_status(channel: Channel, status: BiomarkerStatus) -> Vec<BiomarkerInsight> {
        let mut insights = all_normal();
        for i in insights.iter_mut() {
            if i.name == channel.display_name() {
                i.status = status;
            }
        }
        insights
    }

    #[test]
    fn test_sentinel_when_nothing_fires() {
        let diseases = score(&all_normal(), &SymptomState::default());
        assert_eq!(
            diseases,
            vec![DiseaseLikelihood {
                name: "Metabolically Healthy".to_string(),
                probability: 98,
            }]
        );
    }

    #[test]
    fn test_critical_acetone_is_ketoacidosis() {
        let insights = with_status(Channel::Acetone, BiomarkerStatus::Critical);
        let diseases = score(&insights, &SymptomState::default());

        assert_eq!(diseases[0].name, "Diabetic Ketoacidosis (DKA)");
        assert_eq!(diseases[0].probability, 80);
    }

    #[test]
    fn test_elevated_acetone_with_thirst_is_hyperglycemia() {
        let insights = with_status(Channel::Acetone, BiomarkerStatus::Elevated);
        let diseases = score(&insights, &SymptomState::with(&[Symptom::Thirst]));

        assert_eq!(diseases[0].name, "Hyperglycemia / Pre-Diabetes");
        assert_eq!(diseases[0].probability, 55);
    }

    #[test]
    fn test_gut_overgrowth_elevated_hydrogen_with_pain() {
        let insights = with_status(Channel::Hydrogen, BiomarkerStatus::Elevated);
        let diseases = score(&insights, &SymptomState::with(&[Symptom::AbdominalPain]));

        assert_eq!(
            diseases,
            vec![DiseaseLikelihood {
                name: "Small Intestinal Bacterial Overgrowth (SIBO)".to_string(),
                probability: 60,
            }]
        );
    }

    #[test]
    fn test_critical_methane_switches_label() {
        let insights = with_status(Channel::Methane, BiomarkerStatus::Critical);
        let diseases = score(&insights, &SymptomState::default());
        assert_eq!(diseases[0].name, "Intestinal Methanogen Overgrowth (IMO)");
    }

    #[test]
    fn test_ceiling_clamps_score() {
        let insights = with_status(Channel::Acetone, BiomarkerStatus::Critical);
        let symptoms = SymptomState::with(&[
            Symptom::Thirst,
            Symptom::FrequentUrination,
            Symptom::Confusion,
            Symptom::UnexplainedWeightLoss,
        ]);
        let diseases = score(&insights, &symptoms);

        let dka = diseases
            .iter()
            .find(|d| d.name == "Diabetic Ketoacidosis (DKA)")
            .unwrap();
        assert_eq!(dka.probability, 99);
    }

    #[test]
    fn test_floor_is_exclusive() {
        // Toxicity: dizziness + confusion = 40 > 30; dizziness alone = 20.
        let only_dizzy = score(&all_normal(), &SymptomState::with(&[Symptom::Dizziness]));
        assert!(is_sentinel(&only_dizzy[0]));

        // Cardiovascular: elevated isoprene (30) + shortness of breath (10) = 40 > 35.
        // Airway scores 20 from shortness of breath, under its floor of 25.
        let insights = with_status(Channel::Isoprene, BiomarkerStatus::Elevated);
        let diseases = score(&insights, &SymptomState::with(&[Symptom::ShortnessOfBreath]));
        assert_eq!(diseases.len(), 1);
        assert_eq!(diseases[0].name, "Metabolic Stress / Cardiovascular Risk");
        assert_eq!(diseases[0].probability, 40);
    }

    #[test]
    fn test_carbon_monoxide_critical_stacks_terms() {
        let insights = with_status(Channel::CarbonMonoxide, BiomarkerStatus::Critical);
        let diseases = score(&insights, &SymptomState::default());
        assert_eq!(diseases[0].name, "Environmental Toxicity / CO Exposure");
        assert_eq!(diseases[0].probability, 90);
    }

    #[test]
    fn test_concurrent_candidates_sorted() {
        let mut insights = with_status(Channel::Sulfur, BiomarkerStatus::Elevated);
        for i in insights.iter_mut() {
            if i.name == "Nitric Oxide" {
                i.status = BiomarkerStatus::Critical;
            }
        }
        let diseases = score(&insights, &SymptomState::default());

        assert_eq!(diseases.len(), 2);
        assert_eq!(diseases[0].name, "Eosinophilic Airway Inflammation / Asthma");
        assert_eq!(diseases[0].probability, 85);
        assert_eq!(diseases[1].name, "H. Pylori / Gastric Infection");
        assert_eq!(diseases[1].probability, 45);
        assert!(diseases.windows(2).all(|w| w[0].probability >= w[1].probability));
    }

    #[test]
    fn test_ties_keep_catalogue_order() {
        static CATALOGUE_UNDER_TEST: &[ConditionRule] = &[
            ConditionRule {
                family: Family::Infection,
                label: ConditionLabel::Fixed("First"),
                channel_terms: &[ChannelTerm {
                    channels: &[Channel::Sulfur],
                    critical: 50,
                    elevated: 50,
                }],
                symptom_weights: &[],
                floor: 25,
                ceiling: 95,
                recommendations: &[],
            },
            ConditionRule {
                family: Family::Airway,
                label: ConditionLabel::Fixed("Second"),
                channel_terms: &[ChannelTerm {
                    channels: &[Channel::Sulfur],
                    critical: 50,
                    elevated: 50,
                }],
                symptom_weights: &[],
                floor: 25,
                ceiling: 95,
                recommendations: &[],
            },
        ];

        let insights = with_status(Channel::Sulfur, BiomarkerStatus::Elevated);
        let diseases = score_with(CATALOGUE_UNDER_TEST, &insights, &SymptomState::default());

        assert_eq!(diseases[0].name, "First");
        assert_eq!(diseases[1].name, "Second");
    }

    #[test]
    fn test_missing_insight_reads_as_normal() {
        let statuses = StatusTable::from_insights(&[]);
        assert_eq!(statuses.status(Channel::Acetone), BiomarkerStatus::Normal);
    }
}
