//! Declarative condition rule catalogue.
//!
//! Each record describes one condition family: which channels feed it and
//! with what weight, which symptoms add points, where the score is clamped,
//! the inclusion floor, how the display label is chosen and which actions
//! to recommend when it is the top finding.

use crate::models::{BiomarkerStatus, Channel, Symptom};

/// Condition family a rule belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Glycemic,
    RenalHepatic,
    GutOvergrowth,
    Airway,
    Cardiovascular,
    Toxicity,
    Infection,
}

/// Points awarded on the worst status among `channels`.
#[derive(Debug, Clone, Copy)]
pub struct ChannelTerm {
    pub channels: &'static [Channel],
    pub critical: u32,
    pub elevated: u32,
}

impl ChannelTerm {
    pub fn points(&self, worst: BiomarkerStatus) -> u32 {
        match worst {
            BiomarkerStatus::Critical => self.critical,
            BiomarkerStatus::Elevated => self.elevated,
            BiomarkerStatus::Normal => 0,
        }
    }
}

/// How a rule picks its display name.
#[derive(Debug, Clone, Copy)]
pub enum ConditionLabel {
    Fixed(&'static str),
    /// `severe` when the unclamped score exceeds `above`.
    ByScore {
        above: u32,
        severe: &'static str,
        generic: &'static str,
    },
    /// `critical` when `channel` is Critical.
    ByCriticalChannel {
        channel: Channel,
        critical: &'static str,
        otherwise: &'static str,
    },
}

impl ConditionLabel {
    /// Every name this label can produce.
    pub fn names(&self) -> Vec<&'static str> {
        match *self {
            ConditionLabel::Fixed(name) => vec![name],
            ConditionLabel::ByScore {
                severe, generic, ..
            } => vec![severe, generic],
            ConditionLabel::ByCriticalChannel {
                critical,
                otherwise,
                ..
            } => vec![critical, otherwise],
        }
    }
}

/// One weighted rule.
#[derive(Debug, Clone, Copy)]
pub struct ConditionRule {
    pub family: Family,
    pub label: ConditionLabel,
    pub channel_terms: &'static [ChannelTerm],
    pub symptom_weights: &'static [(Symptom, u32)],
    /// Score must exceed this to be reported.
    pub floor: u32,
    /// Always below 100.
    pub ceiling: u8,
    pub recommendations: &'static [&'static str],
}

/// Advice triggered by a non-Normal channel regardless of the top condition.
#[derive(Debug, Clone, Copy)]
pub struct ChannelAdvice {
    pub channel: Channel,
    pub text: &'static str,
    /// Skipped when the top condition is of this family.
    pub unless_top: Option<Family>,
}

pub static CATALOGUE: &[ConditionRule] = &[
    ConditionRule {
        family: Family::Glycemic,
        label: ConditionLabel::ByScore {
            above: 75,
            severe: "Diabetic Ketoacidosis (DKA)",
            generic: "Hyperglycemia / Pre-Diabetes",
        },
        channel_terms: &[ChannelTerm {
            channels: &[Channel::Acetone],
            critical: 80,
            elevated: 40,
        }],
        symptom_weights: &[
            (Symptom::Thirst, 15),
            (Symptom::FrequentUrination, 15),
            (Symptom::Confusion, 10),
            (Symptom::UnexplainedWeightLoss, 20),
        ],
        floor: 25,
        ceiling: 99,
        recommendations: &[
            "Endocrinology: Immediate blood glucose check required.",
            "Hydration: Increase water intake to flush ketones.",
        ],
    },
    ConditionRule {
        family: Family::RenalHepatic,
        label: ConditionLabel::Fixed("Hepatic or Renal Insufficiency"),
        channel_terms: &[ChannelTerm {
            channels: &[Channel::Ammonia],
            critical: 85,
            elevated: 50,
        }],
        symptom_weights: &[
            (Symptom::Confusion, 20),
            (Symptom::Nausea, 15),
            (Symptom::Fatigue, 10),
        ],
        floor: 25,
        ceiling: 99,
        recommendations: &[
            "Lab: Liver Function Panel (ALT/AST).",
            "Lab: Renal panel (creatinine, BUN) to rule out kidney involvement.",
        ],
    },
    ConditionRule {
        family: Family::GutOvergrowth,
        label: ConditionLabel::ByCriticalChannel {
            channel: Channel::Methane,
            critical: "Intestinal Methanogen Overgrowth (IMO)",
            otherwise: "Small Intestinal Bacterial Overgrowth (SIBO)",
        },
        channel_terms: &[ChannelTerm {
            channels: &[Channel::Hydrogen, Channel::Methane],
            critical: 80,
            elevated: 40,
        }],
        symptom_weights: &[(Symptom::AbdominalPain, 20), (Symptom::Nausea, 10)],
        floor: 25,
        ceiling: 95,
        recommendations: &[
            "Gastroenterology: Schedule a Hydrogen/Methane Breath Test (HMBT).",
            "Diet: Consider Low-FODMAP diet intervention.",
        ],
    },
    ConditionRule {
        family: Family::Airway,
        label: ConditionLabel::Fixed("Eosinophilic Airway Inflammation / Asthma"),
        channel_terms: &[ChannelTerm {
            channels: &[Channel::NitricOxide],
            critical: 85,
            elevated: 50,
        }],
        symptom_weights: &[
            (Symptom::ShortnessOfBreath, 20),
            (Symptom::DryCough, 20),
            (Symptom::ChestPain, 10),
        ],
        floor: 25,
        ceiling: 98,
        recommendations: &[
            "Pulmonology: FeNO test recommended.",
            "Monitor: Track peak flow variability.",
        ],
    },
    ConditionRule {
        family: Family::Cardiovascular,
        label: ConditionLabel::Fixed("Metabolic Stress / Cardiovascular Risk"),
        channel_terms: &[ChannelTerm {
            channels: &[Channel::Isoprene],
            critical: 60,
            elevated: 30,
        }],
        symptom_weights: &[
            (Symptom::ChestPain, 30),
            (Symptom::ShortnessOfBreath, 10),
            (Symptom::NightSweats, 20),
        ],
        floor: 35,
        ceiling: 85,
        recommendations: &[
            "Cardiology: Schedule a lipid profile and stress test.",
            "Lifestyle: Review sleep apnea potential.",
        ],
    },
    ConditionRule {
        family: Family::Toxicity,
        label: ConditionLabel::Fixed("Environmental Toxicity / CO Exposure"),
        channel_terms: &[
            ChannelTerm {
                channels: &[Channel::Ether, Channel::CarbonMonoxide],
                critical: 60,
                elevated: 60,
            },
            ChannelTerm {
                channels: &[Channel::CarbonMonoxide],
                critical: 30,
                elevated: 0,
            },
        ],
        symptom_weights: &[(Symptom::Dizziness, 20), (Symptom::Confusion, 20)],
        floor: 30,
        ceiling: 99,
        recommendations: &[
            "Safety: Evacuate current environment immediately.",
            "Emergency: Check for gas leaks or combustion sources.",
        ],
    },
    ConditionRule {
        family: Family::Infection,
        label: ConditionLabel::Fixed("H. Pylori / Gastric Infection"),
        channel_terms: &[ChannelTerm {
            channels: &[Channel::Sulfur],
            critical: 80,
            elevated: 45,
        }],
        symptom_weights: &[(Symptom::NightSweats, 20)],
        floor: 25,
        ceiling: 95,
        recommendations: &["Gastroenterology: Urea breath test or stool antigen test for H. pylori."],
    },
];

pub static CHANNEL_ADVICE: &[ChannelAdvice] = &[
    ChannelAdvice {
        channel: Channel::Ethanol,
        text: "Abstain from alcohol for 24 hours and repeat the breath test.",
        unless_top: None,
    },
    ChannelAdvice {
        channel: Channel::CarbonMonoxide,
        text: "Environment: Ventilate the room and check for combustion sources.",
        unless_top: Some(Family::Toxicity),
    },
];

/// Finds the rule that can produce `name`.
pub fn rule_for_condition(name: &str) -> Option<&'static ConditionRule> {
    CATALOGUE
        .iter()
        .find(|rule| rule.label.names().contains(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ceilings_below_certainty() {
        for rule in CATALOGUE {
            assert!(rule.ceiling < 100, "{:?}", rule.family);
            assert!(u32::from(rule.ceiling) > rule.floor, "{:?}", rule.family);
        }
    }

    #[test]
    fn test_condition_names_unique() {
        let mut seen = HashSet::new();
        for rule in CATALOGUE {
            for name in rule.label.names() {
                assert!(seen.insert(name), "duplicate condition name: {}", name);
            }
        }
    }

    #[test]
    fn test_every_rule_recommends_something() {
        assert!(CATALOGUE.iter().all(|r| !r.recommendations.is_empty()));
    }

    #[test]
    fn test_rule_lookup_by_name() {
        let rule = rule_for_condition("Intestinal Methanogen Overgrowth (IMO)").unwrap();
        assert_eq!(rule.family, Family::GutOvergrowth);
        assert!(rule_for_condition("Metabolically Healthy").is_none());
    }
}
