//! Built-in sample services for running without a backend.
//!
//! The catalog is small and fixed. Translation is deliberately missing so the
//! Portuguese path exercises the untranslated fallback.

use std::sync::Arc;

use async_trait::async_trait;

use rovassist_core::types::{
    Answer, AnswerRequest, AnswerResponse, Candidate, Citation, Conversion, PinAssignment,
    PinLabel,
};
use rovassist_dialog::collaborator::AnswerCollaborator;
use rovassist_dialog::error::CollaboratorError;
use rovassist_dialog::mock::{MockSearch, MockTranslate};
use rovassist_dialog::orchestrator::Collaborators;

fn candidate(path: &str, title: &str, tags: &[&str], summary: Option<&str>) -> Candidate {
    Candidate {
        path: path.to_string(),
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        summary: summary.map(|s| s.to_string()),
        summary_available: summary.is_some(),
    }
}

/// Sample manual library.
pub fn sample_catalog() -> Vec<Candidate> {
    vec![
        candidate(
            "manuals/titan4/operations.pdf",
            "Titan 4 Operations Manual",
            &["titan 4", "manipulator"],
            Some("Seven-function manipulator: installation, operation, wrist and jaw maintenance."),
        ),
        candidate(
            "manuals/titan4/service.pdf",
            "Titan 4 Service Bulletin 12",
            &["titan 4", "torque"],
            None,
        ),
        candidate(
            "manuals/rigmaster2/manual.pdf",
            "RigMaster 2 Technical Manual",
            &["rigmaster 2"],
            None,
        ),
        candidate(
            "manuals/millennium/hydraulics.pdf",
            "Millennium Plus Hydraulic System",
            &["millennium plus", "hydraulics"],
            Some("HPU layout, pressure settings and filter service intervals."),
        ),
        candidate(
            "manuals/duplex/pump.pdf",
            "Duplex Pump Service Guide",
            &["duplex pump", "flow"],
            None,
        ),
    ]
}

/// Answers a handful of known questions by keyword.
#[derive(Debug, Default)]
pub struct OfflineAnswers;

impl OfflineAnswers {
    fn lookup(query: &str, model: &str) -> Option<Answer> {
        let q = query.to_lowercase();
        if q.contains("pinout") || q.contains("pin") {
            return Some(Answer {
                text: "9-pin camera connector.".into(),
                pinout: vec![
                    PinAssignment { pin: PinLabel::Number(1), signal: "Video positive".into() },
                    PinAssignment { pin: PinLabel::Number(2), signal: "Video ground".into() },
                    PinAssignment { pin: PinLabel::Number(3), signal: "24 V DC".into() },
                    PinAssignment { pin: PinLabel::Number(4), signal: "Power ground".into() },
                    PinAssignment { pin: PinLabel::Number(5), signal: "RS-485 A".into() },
                    PinAssignment { pin: PinLabel::Number(6), signal: "RS-485 B".into() },
                    PinAssignment { pin: PinLabel::Number(7), signal: "Focus".into() },
                    PinAssignment { pin: PinLabel::Number(8), signal: "Zoom".into() },
                    PinAssignment { pin: PinLabel::Number(9), signal: "Shield".into() },
                ],
                conversions: vec![],
                citations: vec![Citation { path: "manuals/titan4/operations.pdf".into(), page: Some(88) }],
            });
        }
        if q.contains("torque") {
            return Some(Answer {
                text: format!("{} wrist bolt torque is 45 Nm.", model),
                pinout: vec![],
                conversions: vec![Conversion {
                    kind: "torque".into(),
                    primary: "45 Nm".into(),
                    alt: "33 ft-lb".into(),
                }],
                citations: vec![
                    Citation { path: "manuals/titan4/service.pdf".into(), page: Some(4) },
                    Citation { path: "manuals/titan4/operations.pdf".into(), page: Some(132) },
                ],
            });
        }
        if q.contains("pressure") {
            return Some(Answer {
                text: "System relief pressure is 207 bar.".into(),
                pinout: vec![],
                conversions: vec![Conversion {
                    kind: "pressure".into(),
                    primary: "207 bar".into(),
                    alt: "3000 psi".into(),
                }],
                citations: vec![Citation { path: "manuals/millennium/hydraulics.pdf".into(), page: Some(21) }],
            });
        }
        if q.contains("flow") {
            return Some(Answer {
                text: "Rated flow is 38 L/min.".into(),
                pinout: vec![],
                conversions: vec![Conversion {
                    kind: "flow".into(),
                    primary: "38 L/min".into(),
                    alt: "10 gpm".into(),
                }],
                citations: vec![Citation { path: "manuals/duplex/pump.pdf".into(), page: None }],
            });
        }
        None
    }
}

#[async_trait]
impl AnswerCollaborator for OfflineAnswers {
    async fn answer(&self, request: &AnswerRequest) -> Result<AnswerResponse, CollaboratorError> {
        Ok(AnswerResponse {
            answer: Self::lookup(&request.query, &request.model),
        })
    }
}

/// Collaborators backed by the sample data.
pub fn collaborators() -> Collaborators {
    Collaborators {
        search: Arc::new(MockSearch::new(sample_catalog()).filter_by_model()),
        answer: Arc::new(OfflineAnswers),
        translate: Arc::new(MockTranslate::unavailable()),
    }
}
