// src/findings/policy.rs
// =============================================================================
// The severity gate every finding passes through before it is reported.
//
// A `fail` must be backed by high confidence and complete proof. Anything
// weaker is rewritten to `warning`; the finding keeps its evidence and gains
// a human-readable note plus a structured severity_clamp action. Nothing is
// ever dropped.
//
// Missing confidence/proof values are filled in as medium/partial first, so
// an unlabelled fail is always clamped. Running the gate twice changes
// nothing the second time.
// =============================================================================

use crate::findings::model::{Confidence, Finding, PolicyAction, ProofCompleteness, Severity};

/// Stable identifier recorded on every severity_clamp action
const CLAMP_REASON: &str = "confidence_proof_gate";

pub fn enforce_policy(findings: Vec<Finding>) -> Vec<Finding> {
    findings.into_iter().map(enforce_one).collect()
}

fn enforce_one(mut finding: Finding) -> Finding {
    let confidence = *finding.confidence_level.get_or_insert(Confidence::Medium);
    let proof = *finding.proof_completeness.get_or_insert(ProofCompleteness::Partial);

    let backed = confidence == Confidence::High && proof == ProofCompleteness::Complete;
    if finding.severity != Severity::Fail || backed {
        return finding;
    }

    tracing::info!(
        id = %finding.id,
        confidence = %confidence,
        proof = %proof,
        "clamping fail to warning"
    );

    finding.severity = Severity::Warning;
    finding.policy_notes.push(format!(
        "Severity downgraded from fail to warning: fail requires confidence_level=high and proof_completeness=complete (got confidence_level={confidence}, proof_completeness={proof})."
    ));
    finding.policy_actions.push(PolicyAction::SeverityClamp {
        from: Severity::Fail,
        to: Severity::Warning,
        reason: CLAMP_REASON.to_string(),
        confidence_level: confidence,
        proof_completeness: proof,
    });
    finding
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findings::catalog;
    use crate::findings::model::Evidence;

    fn fail() -> Finding {
        Finding::new(
            &catalog::SITEMAP_INVALID_XML,
            Severity::Fail,
            Evidence::SitemapParse { invalid: Vec::new() },
        )
    }

    #[test]
    fn test_backed_fail_is_untouched() {
        let out = enforce_policy(vec![fail().observed()]);
        assert_eq!(out[0].severity, Severity::Fail);
        assert!(out[0].policy_actions.is_empty());
        assert!(out[0].policy_notes.is_empty());
    }

    #[test]
    fn test_low_confidence_fail_is_clamped() {
        let seeded = fail().with_proof(Confidence::Low, ProofCompleteness::Complete);
        let out = enforce_policy(vec![seeded]);

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].severity, Severity::Warning);
        assert_eq!(out[0].policy_notes.len(), 1);
        assert!(out[0].policy_notes[0].contains("confidence_level=low"));
        assert_eq!(
            out[0].policy_actions,
            vec![PolicyAction::SeverityClamp {
                from: Severity::Fail,
                to: Severity::Warning,
                reason: "confidence_proof_gate".to_string(),
                confidence_level: Confidence::Low,
                proof_completeness: ProofCompleteness::Complete,
            }]
        );
    }

    #[test]
    fn test_unset_proof_defaults_then_clamps() {
        let out = enforce_policy(vec![fail()]);
        assert_eq!(out[0].confidence_level, Some(Confidence::Medium));
        assert_eq!(out[0].proof_completeness, Some(ProofCompleteness::Partial));
        assert_eq!(out[0].severity, Severity::Warning);
    }

    #[test]
    fn test_policy_is_idempotent() {
        let once = enforce_policy(vec![fail(), fail().observed()]);
        let twice = enforce_policy(once.clone());
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(a.severity, b.severity);
            assert_eq!(a.policy_actions, b.policy_actions);
            assert_eq!(a.policy_notes, b.policy_notes);
        }
    }

    #[test]
    fn test_non_fail_keeps_severity() {
        let warning = Finding::new(
            &catalog::CANONICAL_MULTIPLE,
            Severity::Warning,
            Evidence::SitemapParse { invalid: Vec::new() },
        );
        let out = enforce_policy(vec![warning]);
        assert_eq!(out[0].severity, Severity::Warning);
        assert!(out[0].policy_actions.is_empty());
        assert_eq!(out[0].confidence_level, Some(Confidence::Medium));
    }
}
