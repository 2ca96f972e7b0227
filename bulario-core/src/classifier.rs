use crate::rules::split_lines;
use crate::types::DocumentFamily;
use tracing::debug;

/// Only the head of a leaflet is inspected; family markers sit in the title
/// block or the first few headings.
const HEAD_LINES: usize = 80;

const PROFESSIONAL_MARKERS: &[&str] = &[
    "profissional de saúde",
    "profissional de saude",
    "resultados de eficácia",
    "características farmacológicas",
];

const PATIENT_MARKERS: &[&str] = &[
    "paciente",
    "para que este medicamento",
    "como este medicamento funciona",
    "como devo usar este medicamento",
];

/// Picks the leaflet family from marker phrases.
#[derive(Debug, Clone, Copy, Default)]
pub struct FamilyClassifier;

impl FamilyClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> DocumentFamily {
        let head = split_lines(text)
            .take(HEAD_LINES)
            .collect::<Vec<_>>()
            .join("\n")
            .to_lowercase();

        // Professional leaflets also mention "paciente", so they go first.
        if let Some(marker) = find_marker(&head, PROFESSIONAL_MARKERS) {
            debug!(marker, "professional marker found");
            DocumentFamily::ProfessionalInsert
        } else if let Some(marker) = find_marker(&head, PATIENT_MARKERS) {
            debug!(marker, "patient marker found");
            DocumentFamily::PatientInsert
        } else {
            DocumentFamily::Generic
        }
    }
}

fn find_marker(head: &str, markers: &[&'static str]) -> Option<&'static str> {
    markers.iter().copied().find(|marker| head.contains(marker))
}
