use std::fmt::Write as _;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{parse_findings, AdvisoryError, AdvisoryFindings, PolicyAdvisor};
use crate::config::AdvisoryConfig;
use crate::notifications::templates::currency;
use crate::workflows::health::domain::ComponentScores;
use crate::workflows::health::snapshot::PolicySnapshot;

/// Advisor backed by the Gemini `generateContent` API.
pub struct GeminiAdvisor {
    client: Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl GeminiAdvisor {
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Builds an advisor from configuration, or `None` when no key is configured.
    pub fn from_config(client: Client, config: &AdvisoryConfig) -> Option<Self> {
        config.api_key.as_ref().map(|key| {
            Self::new(
                client,
                config.endpoint.clone(),
                config.model.clone(),
                key.clone(),
            )
        })
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.endpoint, self.model
        )
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    max_output_tokens: u32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[async_trait]
impl PolicyAdvisor for GeminiAdvisor {
    fn model(&self) -> &str {
        &self.model
    }

    async fn analyze(
        &self,
        snapshot: &PolicySnapshot,
        scores: &ComponentScores,
    ) -> Result<AdvisoryFindings, AdvisoryError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: build_prompt(snapshot, scores),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 0.95,
                top_k: 40,
                max_output_tokens: 2048,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| AdvisoryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AdvisoryError::Status { status, body });
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AdvisoryError::Malformed(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| AdvisoryError::Malformed("response had no candidates".to_string()))?;

        parse_findings(&text)
    }
}

pub(crate) fn build_prompt(snapshot: &PolicySnapshot, scores: &ComponentScores) -> String {
    let policy = &snapshot.policy;
    let trust = &snapshot.trust;
    let mut prompt = String::new();

    let _ = writeln!(
        prompt,
        "You are reviewing the health of a life insurance policy held by an irrevocable \
         life insurance trust (ILIT).\n"
    );
    let _ = writeln!(prompt, "## POLICY");
    let _ = writeln!(prompt, "- Carrier: {}", policy.carrier);
    let _ = writeln!(prompt, "- Policy Number: {}", policy.policy_number);
    let _ = writeln!(prompt, "- Status: {}", policy.status.label());
    let _ = writeln!(prompt, "- Annual Premium: {}", currency(policy.annual_premium));
    let _ = writeln!(
        prompt,
        "- Policy Owner: {}",
        policy.owner.as_deref().unwrap_or("Unknown")
    );
    let _ = writeln!(prompt, "\n## TRUST");
    let _ = writeln!(prompt, "- Name: {}", trust.name);
    let _ = writeln!(prompt, "- Trustee: {}", trust.trustee_name);
    let _ = writeln!(prompt, "- Beneficiary Count: {}", snapshot.beneficiaries.len());
    let _ = writeln!(
        prompt,
        "- Available Trust Assets: {}",
        currency(snapshot.trust_assets)
    );

    let _ = writeln!(
        prompt,
        "\n## PAYMENT HISTORY (Last {} Payments)",
        snapshot.payments.len()
    );
    if snapshot.payments.is_empty() {
        let _ = writeln!(prompt, "No recent payments");
    }
    for (index, payment) in snapshot.payments.iter().take(4).enumerate() {
        let _ = writeln!(
            prompt,
            "{}. {} - {} - {} days from due date",
            index + 1,
            payment.payment_date,
            currency(payment.amount),
            payment.days_late()
        );
    }

    let _ = writeln!(prompt, "\n## UPCOMING PREMIUM");
    match snapshot.upcoming_premium {
        Some(upcoming) => {
            let days = upcoming.days_until_due(snapshot.as_of);
            let _ = writeln!(prompt, "- Next Premium Due: {}", upcoming.due_date);
            let _ = writeln!(prompt, "- Amount Due: {}", currency(upcoming.amount_due));
            if days < 0 {
                let _ = writeln!(prompt, "- OVERDUE by {} days", -days);
            } else {
                let _ = writeln!(prompt, "- Days Until Due: {days}");
            }
        }
        None => {
            let _ = writeln!(prompt, "- No upcoming premium data available");
        }
    }

    let _ = writeln!(prompt, "\n## COMPLIANCE STATUS");
    let _ = writeln!(
        prompt,
        "- Crummey Notices Sent: {} (last 12 months)",
        snapshot.delivered_notice_count()
    );

    let _ = writeln!(prompt, "\n## RULE-BASED SCORES (Reference)");
    let _ = writeln!(prompt, "- Premium Payment: {}/100", scores.premium_payment);
    let _ = writeln!(prompt, "- Coverage Adequacy: {}/100", scores.coverage_adequacy);
    let _ = writeln!(prompt, "- Compliance: {}/100", scores.compliance);

    prompt.push_str(
        "\n## TASK\n\
         Provide a supplementary analysis focused on patterns the rule-based scores may miss.\n\
         Return ONLY valid JSON:\n\
         {\n  \"ai_summary\": \"2-3 sentence executive summary\",\n  \
         \"confidence\": <number 0.0-1.0>,\n  \
         \"additional_insights\": [{\"type\": \"payment_pattern\" | \"insufficient_funds\" | \
         \"crummey_violation\" | \"ownership_issue\" | \"other\", \"severity\": \"low\" | \
         \"medium\" | \"high\" | \"critical\", \"description\": \"string\", \
         \"requires_remediation\": true | false}],\n  \
         \"ai_recommendations\": [{\"action\": \"string\", \"priority\": \"low\" | \"medium\" | \
         \"high\" | \"urgent\", \"description\": \"string\"}]\n}\n\
         Rules:\n\
         - Only report insights NOT already captured by the rule-based scores.\n\
         - Do not invent problems the data does not show.\n\
         - Confidence should reflect data quality and clarity.\n",
    );

    prompt
}
