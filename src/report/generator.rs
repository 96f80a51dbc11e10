//! Markdown report generation.
//!
//! This module renders an `AnalysisReport` as a Markdown document or JSON,
//! and the stored history as a compact table.

use crate::cli::OutputFormat;
use crate::models::{AnalysisReport, BiomarkerInsight, BiomarkerStatus, DiseaseLikelihood, RiskLevel};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    // Title
    output.push_str("# OdourSense Breath Analysis\n\n");

    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_assessment_section(report));
    output.push_str(&generate_differential_section(&report.diseases));
    output.push_str(&generate_biomarker_section(&report.biomarker_insights));
    output.push_str(&generate_explanation_section(&report.explanation));
    output.push_str(&generate_recommendations_section(&report.recommendations()));
    output.push_str(&generate_footer());

    output
}

fn format_timestamp(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|at| at.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Generate the metadata section.
fn generate_metadata_section(report: &AnalysisReport) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Report ID:** `{}`\n", report.id));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        format_timestamp(report.timestamp)
    ));
    section.push_str(&format!(
        "- **Biomarkers Evaluated:** {}\n",
        report.biomarker_insights.len()
    ));
    section.push('\n');

    section
}

fn risk_badge(risk: RiskLevel) -> String {
    format!("{} **{}**", risk.emoji(), risk.to_string().to_uppercase())
}

/// Generate the headline risk section.
fn generate_assessment_section(report: &AnalysisReport) -> String {
    let mut section = String::new();

    section.push_str("## Assessment\n\n");
    section.push_str(&format!("**Risk Level:** {}\n\n", risk_badge(report.risk_level)));
    section.push_str(&format!("**Summary:** {}\n\n", report.summary));

    section
}

/// Generate the ranked differential table.
fn generate_differential_section(diseases: &[DiseaseLikelihood]) -> String {
    let mut section = String::new();

    section.push_str("## Differential Diagnosis\n\n");

    if diseases.is_empty() {
        section.push_str("No candidate conditions.\n\n");
        return section;
    }

    section.push_str("| Rank | Condition | Probability |\n");
    section.push_str("|:---:|:---|:---:|\n");

    for (i, disease) in diseases.iter().enumerate() {
        section.push_str(&format!(
            "| {} | {} | {}% |\n",
            i + 1,
            disease.name,
            disease.probability
        ));
    }
    section.push('\n');

    section
}

fn status_badge(status: BiomarkerStatus) -> &'static str {
    match status {
        BiomarkerStatus::Critical => "🔴 Critical",
        BiomarkerStatus::Elevated => "🟡 Elevated",
        BiomarkerStatus::Normal => "🟢 Normal",
    }
}

/// Generate the per-biomarker table.
fn generate_biomarker_section(insights: &[BiomarkerInsight]) -> String {
    if insights.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Biomarkers\n\n");
    section.push_str("| Biomarker | Value | Status | Interpretation |\n");
    section.push_str("|:---|---:|:---|:---|\n");

    for insight in insights {
        section.push_str(&format!(
            "| {} | {:.2} {} | {} | {} |\n",
            insight.name,
            insight.value,
            insight.unit,
            status_badge(insight.status),
            insight.interpretation.trim().replace('|', "\\|")
        ));
    }
    section.push('\n');

    section
}

/// Generate the explanation section.
fn generate_explanation_section(explanation: &str) -> String {
    if explanation.trim().is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Explanation\n\n");
    for line in explanation.lines().filter(|l| !l.trim().is_empty()) {
        section.push_str(line.trim_end());
        section.push_str("\n\n");
    }

    section
}

/// Generate the recommendations section.
fn generate_recommendations_section(recommendations: &[&str]) -> String {
    if recommendations.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## Recommendations\n\n");

    for (i, rec) in recommendations.iter().enumerate() {
        section.push_str(&format!("{}. {}\n", i + 1, rec));
    }
    section.push('\n');

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(
        "*Generated by OdourSense. Breath analysis is a screening aid, not a diagnosis; \
         confirm findings with a clinician.*\n",
    );

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

/// Render `report` in `format` and write it to `path`.
pub fn write_report(report: &AnalysisReport, format: OutputFormat, path: &Path) -> Result<()> {
    let content = match format {
        OutputFormat::Markdown => generate_markdown_report(report),
        OutputFormat::Json => generate_json_report(report)?,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report: {}", path.display()))
}

/// Generate a table of stored reports, newest first.
pub fn generate_history_listing(reports: &[AnalysisReport]) -> String {
    if reports.is_empty() {
        return "No saved reports.\n".to_string();
    }

    let mut output = String::new();

    output.push_str("| Date | ID | Risk | Summary | Top Condition |\n");
    output.push_str("|:---|:---|:---|:---|:---|\n");

    for report in reports.iter().rev() {
        let top = report
            .top_condition()
            .map(|d| format!("{} ({}%)", d.name, d.probability))
            .unwrap_or_else(|| "-".to_string());

        output.push_str(&format!(
            "| {} | `{}` | {} {} | {} | {} |\n",
            format_timestamp(report.timestamp),
            report.id,
            report.risk_level.emoji(),
            report.risk_level,
            report.summary,
            top
        ));
    }

    output.push_str(&format!("\n{} report(s)\n", reports.len()));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_report() -> AnalysisReport {
        AnalysisReport {
            id: "rpt-20261017083005123".to_string(),
            timestamp: 1_791_793_805_123,
            risk_level: RiskLevel::High,
            summary: "Possible Diabetic Ketoacidosis (DKA)".to_string(),
            diseases: vec![
                DiseaseLikelihood {
                    name: "Diabetic Ketoacidosis (DKA)".to_string(),
                    probability: 80,
                },
                DiseaseLikelihood {
                    name: "Renal Dysfunction (Uremia)".to_string(),
                    probability: 30,
                },
            ],
            explanation: "**Acetone** is critical.\n\n**Clinical correlation:** thirst".to_string(),
            recommendation: "Check blood glucose.||Seek care.".to_string(),
            biomarker_insights: vec![BiomarkerInsight {
                name: "Acetone".to_string(),
                value: 6.0,
                unit: "ppm".to_string(),
                status: BiomarkerStatus::Critical,
                interpretation: "High ketone levels.".to_string(),
            }],
        }
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_report());

        assert!(markdown.contains("# OdourSense Breath Analysis"));
        assert!(markdown.contains("## Metadata"));
        assert!(markdown.contains("`rpt-20261017083005123`"));
        assert!(markdown.contains("**Risk Level:** 🟠 **HIGH**"));
        assert!(markdown.contains("| 1 | Diabetic Ketoacidosis (DKA) | 80% |"));
        assert!(markdown.contains("| Acetone | 6.00 ppm | 🔴 Critical | High ketone levels. |"));
        assert!(markdown.contains("1. Check blood glucose.\n2. Seek care.\n"));
        assert!(markdown.contains("**Clinical correlation:** thirst"));
    }

    #[test]
    fn test_empty_sections_are_skipped() {
        let mut report = create_test_report();
        report.diseases.clear();
        report.biomarker_insights.clear();
        report.explanation.clear();
        report.recommendation.clear();

        let markdown = generate_markdown_report(&report);
        assert!(markdown.contains("No candidate conditions."));
        assert!(!markdown.contains("## Biomarkers"));
        assert!(!markdown.contains("## Explanation"));
        assert!(!markdown.contains("## Recommendations"));
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_report()).unwrap();

        assert!(json.contains("\"riskLevel\": \"High\""));
        assert!(json.contains("\"biomarkerInsights\""));
        assert!(json.contains("\"probability\": 80"));
    }

    #[test]
    fn test_write_report_formats() {
        let dir = TempDir::new().unwrap();
        let report = create_test_report();

        let md_path = dir.path().join("out").join("report.md");
        write_report(&report, OutputFormat::Markdown, &md_path).unwrap();
        assert!(std::fs::read_to_string(&md_path)
            .unwrap()
            .starts_with("# OdourSense"));

        let json_path = dir.path().join("report.json");
        write_report(&report, OutputFormat::Json, &json_path).unwrap();
        let parsed: AnalysisReport =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_history_listing_newest_first() {
        let older = create_test_report();
        let mut newer = create_test_report();
        newer.id = "rpt-20261018090000000".to_string();
        newer.risk_level = RiskLevel::Low;
        newer.diseases.clear();

        let listing = generate_history_listing(&[older, newer]);
        let newer_at = listing.find("rpt-20261018090000000").unwrap();
        let older_at = listing.find("rpt-20261017083005123").unwrap();

        assert!(newer_at < older_at);
        assert!(listing.contains("Diabetic Ketoacidosis (DKA) (80%)"));
        assert!(listing.contains("2 report(s)"));
        assert_eq!(generate_history_listing(&[]), "No saved reports.\n");
    }
}
