//! Ollama chat client for model-backed breath analysis.
//!
//! The model receives every reading next to its critical threshold plus the
//! reported symptoms and must answer with one JSON object shaped like an
//! `AnalysisReport`. Transport and parse failures are `UpstreamUnavailable`;
//! there is no fallback report.

use crate::analysis::report_id;
use crate::config::RemoteConfig;
use crate::error::{EngineError, EngineResult};
use crate::models::{
    AnalysisReport, AppThresholds, BiomarkerInsight, Channel, DiseaseLikelihood, RiskLevel,
    SensorReadings, SymptomState,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

/// System prompt for the model.
const SYSTEM_PROMPT: &str = r#"You are OdourSense, a medical diagnostic assistant specialised in breath biomarkers.

Respond with exactly one JSON object and nothing else:
{
  "riskLevel": "Low" | "Moderate" | "High" | "Critical",
  "summary": "short headline of the finding",
  "diseases": [{"name": "condition", "probability": 0-100}],
  "explanation": "medical reasoning that cites each sensor value against its threshold",
  "recommendation": "next steps, separated by ||",
  "biomarkerInsights": [{"name": "Acetone", "value": 0.5, "unit": "ppm",
                          "status": "Normal" | "Elevated" | "Critical",
                          "interpretation": "one sentence"}]
}"#;

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    stream: bool,
    format: &'static str,
    options: OllamaOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// The fields the model is asked to fill in.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelAssessment {
    risk_level: RiskLevel,
    summary: String,
    #[serde(default)]
    diseases: Vec<ModelDisease>,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    recommendation: String,
    #[serde(default)]
    biomarker_insights: Vec<BiomarkerInsight>,
}

#[derive(Debug, Deserialize)]
struct ModelDisease {
    name: String,
    probability: f64,
}

/// Client for the model-backed analyzer.
pub struct RemoteAnalyzer {
    config: RemoteConfig,
    http_client: reqwest::Client,
}

impl RemoteAnalyzer {
    pub fn new(config: RemoteConfig) -> EngineResult<Self> {
        info!(
            "Initializing remote analyzer with model {} at {}",
            config.model, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EngineError::upstream(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Ask the model for a report on one snapshot.
    pub async fn analyze(
        &self,
        readings: &SensorReadings,
        symptoms: &SymptomState,
        thresholds: &AppThresholds,
    ) -> EngineResult<AnalysisReport> {
        thresholds.validate()?;
        let prompt = build_prompt(readings, symptoms, thresholds)?;

        let content = self.send_prompt(&prompt).await?;
        let report = parse_assessment(&content, Utc::now())?;

        info!(
            "Remote analysis {} complete: {} risk, {} candidate(s)",
            report.id,
            report.risk_level,
            report.diseases.len()
        );
        Ok(report)
    }

    async fn send_prompt(&self, prompt: &str) -> EngineResult<String> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                },
            ],
            stream: false,
            format: "json",
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        debug!("Sending {} byte prompt to {}", prompt.len(), url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EngineError::upstream(format!(
                        "request timed out after {}s",
                        self.config.timeout_seconds
                    ))
                } else if e.is_connect() {
                    EngineError::upstream(format!(
                        "cannot connect to Ollama at {}",
                        self.config.ollama_url
                    ))
                } else {
                    EngineError::upstream(format!("failed to send request: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EngineError::upstream(format!(
                "Ollama API error {}: {}",
                status, body
            )));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| EngineError::upstream(format!("failed to parse Ollama response: {}", e)))?;

        Ok(chat_response.message.content)
    }
}

/// Builds the user prompt citing every reading against its critical threshold.
pub fn build_prompt(
    readings: &SensorReadings,
    symptoms: &SymptomState,
    thresholds: &AppThresholds,
) -> EngineResult<String> {
    let mut prompt = String::new();
    prompt.push_str("Analyze these breath biomarker readings and reported symptoms.\n\n");
    prompt.push_str("INPUT DATA SNAPSHOT:\n");

    for channel in Channel::ALL {
        let limits = thresholds.require(channel)?;
        prompt.push_str(&format!(
            "- {}: {:.2} {} (Threshold: > {})\n",
            channel.display_name(),
            readings.value(channel),
            channel.unit(),
            limits.critical
        ));
    }
    prompt.push_str(&format!(
        "- Environmental: {:.1}°C, {:.1}% Humidity\n\n",
        readings.temperature, readings.humidity
    ));

    let active: Vec<&str> = symptoms.active().iter().map(|s| s.label()).collect();
    if active.is_empty() {
        prompt.push_str("REPORTED SYMPTOMS: None reported\n\n");
    } else {
        prompt.push_str(&format!("REPORTED SYMPTOMS: {}\n\n", active.join(", ")));
    }

    prompt.push_str("TASK:\n");
    prompt.push_str("1. Provide a differential diagnosis based on the inputs.\n");
    prompt.push_str("2. Estimate a probability (0-100) for each condition.\n");
    prompt.push_str("3. Determine the overall risk level.\n");
    prompt.push_str("4. In the explanation, cite the specific sensor values and their thresholds.\n");
    prompt.push_str("5. Provide one insight per biomarker.\n\n");
    prompt.push_str("Return only the JSON object.");

    Ok(prompt)
}

/// Parses the model's answer and stamps id and timestamp.
pub fn parse_assessment(content: &str, at: DateTime<Utc>) -> EngineResult<AnalysisReport> {
    let json = extract_json(content)
        .ok_or_else(|| EngineError::upstream("model response contained no JSON object"))?;

    let assessment: ModelAssessment = serde_json::from_str(json)
        .map_err(|e| EngineError::upstream(format!("malformed model response: {}", e)))?;

    let mut diseases: Vec<DiseaseLikelihood> = assessment
        .diseases
        .into_iter()
        .map(|d| DiseaseLikelihood {
            name: d.name,
            probability: d.probability.round().clamp(0.0, 100.0) as u8,
        })
        .collect();
    diseases.sort_by(|a, b| b.probability.cmp(&a.probability));

    Ok(AnalysisReport {
        id: report_id(at),
        timestamp: at.timestamp_millis(),
        risk_level: assessment.risk_level,
        summary: assessment.summary,
        diseases,
        explanation: assessment.explanation,
        recommendation: assessment.recommendation,
        biomarker_insights: assessment.biomarker_insights,
    })
}

/// The outermost `{...}` span, ignoring code fences or chatter around it.
fn extract_json(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (start < end).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BiomarkerStatus, Symptom, ThresholdConfig};
    use chrono::TimeZone;

    fn healthy_readings() -> SensorReadings {
        crate::sensor::DriftSimulator::baseline(0)
    }

    #[test]
    fn test_prompt_cites_readings_and_thresholds() {
        let mut readings = healthy_readings();
        readings.acetone = 6.25;
        let symptoms = SymptomState::with(&[Symptom::Thirst, Symptom::FrequentUrination]);

        let prompt = build_prompt(&readings, &symptoms, &AppThresholds::default()).unwrap();

        assert!(prompt.contains("- Acetone: 6.25 ppm (Threshold: > 5)"));
        assert!(prompt.contains("- Isoprene: 50.00 ppb (Threshold: > 500)"));
        assert!(prompt.contains("- Carbon Monoxide: 0.50 ppm"));
        assert!(prompt.contains("REPORTED SYMPTOMS: thirst, frequent urination"));
    }

    #[test]
    fn test_prompt_without_symptoms() {
        let prompt = build_prompt(
            &healthy_readings(),
            &SymptomState::default(),
            &AppThresholds::default(),
        )
        .unwrap();
        assert!(prompt.contains("REPORTED SYMPTOMS: None reported"));
    }

    #[test]
    fn test_prompt_requires_thresholds() {
        let mut thresholds = AppThresholds::default();
        thresholds.remove(Channel::Ether);
        let err = build_prompt(&healthy_readings(), &SymptomState::default(), &thresholds)
            .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_parse_assessment() {
        let content = r#"```json
{
  "riskLevel": "High",
  "summary": "Possible Diabetic Ketoacidosis",
  "diseases": [
    {"name": "Type 1 Diabetes", "probability": 40.4},
    {"name": "Diabetic Ketoacidosis (DKA)", "probability": 81.6}
  ],
  "explanation": "Acetone 6.0 ppm exceeds the 5.0 ppm critical threshold.",
  "recommendation": "Check blood glucose.||Seek care.",
  "biomarkerInsights": [
    {"name": "Acetone", "value": 6.0, "unit": "ppm", "status": "Critical",
     "interpretation": "Ketosis"}
  ]
}
```"#;
        let at = Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 5).unwrap();

        let report = parse_assessment(content, at).unwrap();

        assert!(report.id.starts_with("rpt-20261017083005000-"));
        assert_eq!(report.timestamp, at.timestamp_millis());
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.diseases[0].name, "Diabetic Ketoacidosis (DKA)");
        assert_eq!(report.diseases[0].probability, 82);
        assert_eq!(report.diseases[1].probability, 40);
        assert_eq!(report.biomarker_insights[0].status, BiomarkerStatus::Critical);
        assert_eq!(report.recommendations(), vec!["Check blood glucose.", "Seek care."]);
    }

    #[test]
    fn test_parse_clamps_probability() {
        let content = r#"{"riskLevel": "Low", "summary": "ok",
                          "diseases": [{"name": "X", "probability": 250}]}"#;
        let report = parse_assessment(content, Utc::now()).unwrap();
        assert_eq!(report.diseases[0].probability, 100);
        assert!(report.biomarker_insights.is_empty());
    }

    #[test]
    fn test_parse_failures_are_upstream() {
        let no_json = parse_assessment("I cannot help with that.", Utc::now()).unwrap_err();
        assert!(matches!(no_json, EngineError::UpstreamUnavailable(_)));

        let bad_level =
            parse_assessment(r#"{"riskLevel": "Severe", "summary": "x"}"#, Utc::now()).unwrap_err();
        assert!(matches!(bad_level, EngineError::UpstreamUnavailable(_)));
    }

    #[test]
    fn test_analyzer_rejects_bad_thresholds_before_sending() {
        let analyzer = RemoteAnalyzer::new(RemoteConfig {
            ollama_url: "http://127.0.0.1:9".to_string(),
            ..RemoteConfig::default()
        })
        .unwrap();

        let mut thresholds = AppThresholds::default();
        thresholds.set(Channel::Methane, ThresholdConfig::new(30.0, 10.0));

        let err = tokio_test::block_on(analyzer.analyze(
            &healthy_readings(),
            &SymptomState::default(),
            &thresholds,
        ))
        .unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }
}
