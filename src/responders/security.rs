//! Security-architecture guidance responder

use super::Responder;
use crate::extractor::{contains_phrase, normalize};
use crate::models::Response;
use crate::Result;

pub const HANDLER_ID: &str = "security_architecture";

/// (topic phrases, guidance)
const TOPICS: &[(&[&str], &str)] = &[
    (
        &["zero trust"],
        "**Zero trust**: authenticate and authorize every request, not every network. \
         Put an identity-aware proxy in front of internal services, issue short-lived \
         credentials, and evaluate device posture on each access decision.",
    ),
    (
        &["threat model", "threat modeling", "threat modelling"],
        "**Threat modeling**: draw the data flows, mark trust boundaries, then walk each \
         element through STRIDE. Rank findings by impact and likelihood and track them \
         like any other backlog item.",
    ),
    (
        &["encryption", "encrypt", "encrypted"],
        "**Encryption**: TLS 1.2+ in transit, AES-256-GCM at rest, keys in a KMS or HSM \
         with rotation. Never store keys next to the data they protect.",
    ),
    (
        &["mfa", "authentication", "2fa"],
        "**Authentication**: require phishing-resistant MFA (FIDO2/WebAuthn) for admins, \
         centralize identity in one IdP, and expire sessions aggressively.",
    ),
    (
        &["network segmentation", "segmentation", "microsegmentation"],
        "**Segmentation**: split workloads by sensitivity, default-deny between segments, \
         and log every cross-segment flow.",
    ),
];

const BASELINE: &str = "**Baseline**: least privilege everywhere, defense in depth, \
     centralized logging with alerting, and a tested incident-response runbook.";

pub struct SecurityArchitectureResponder;

impl Responder for SecurityArchitectureResponder {
    fn id(&self) -> &'static str {
        HANDLER_ID
    }

    fn respond(&self, text: &str) -> Result<Option<Response>> {
        let normalized = normalize(text);

        let sections: Vec<&str> = TOPICS
            .iter()
            .filter(|(phrases, _)| phrases.iter().any(|p| contains_phrase(&normalized, p)))
            .map(|(_, guidance)| *guidance)
            .collect();

        let mut out = String::from("### Security architecture guidance\n\n");
        if sections.is_empty() {
            out.push_str(BASELINE);
        } else {
            out.push_str(&sections.join("\n\n"));
        }

        Ok(Some(Response::from_handler(HANDLER_ID, out)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_sections() {
        let response = SecurityArchitectureResponder
            .respond("We need zero trust and encryption for the new platform")
            .unwrap()
            .unwrap();

        assert!(response.text.contains("**Zero trust**"));
        assert!(response.text.contains("**Encryption**"));
        assert!(!response.text.contains("**Baseline**"));
    }

    #[test]
    fn test_generic_question_gets_baseline() {
        let response = SecurityArchitectureResponder
            .respond("review our security architecture")
            .unwrap()
            .unwrap();

        assert!(response.text.contains("**Baseline**"));
        assert_eq!(response.kind, HANDLER_ID);
    }
}
