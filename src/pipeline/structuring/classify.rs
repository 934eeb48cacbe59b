use crate::models::enums::DocumentType;

const PRESCRIPTION_KEYWORDS: &[&str] = &["prescription", "medication", "dosage"];
const BLOOD_TEST_KEYWORDS: &[&str] = &["blood", "glucose", "cholesterol", "hemoglobin", "platelet"];
const IMAGING_KEYWORDS: &[&str] = &["x-ray", "radiograph", "imaging"];

/// Categories in match priority. Prescriptions often quote lab values, so they
/// are checked before blood tests.
const PRIORITY: &[(DocumentType, &[&str])] = &[
    (DocumentType::Prescription, PRESCRIPTION_KEYWORDS),
    (DocumentType::BloodTest, BLOOD_TEST_KEYWORDS),
    (DocumentType::XRay, IMAGING_KEYWORDS),
];

/// Classify a document from its extracted text by keyword presence.
/// First matching category wins; `General` when nothing matches.
pub fn classify_document(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    PRIORITY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map(|(doc_type, _)| *doc_type)
        .unwrap_or(DocumentType::General)
}

/// Summarization context a document of this type is routed to.
pub fn summary_context(doc_type: DocumentType) -> &'static str {
    match doc_type {
        DocumentType::Prescription => {
            "prescription: list each medication with its dosage, frequency and duration"
        }
        DocumentType::BloodTest => {
            "blood test: report each measured value against its reference range"
        }
        DocumentType::XRay => "imaging report: summarize findings and the radiologist's impression",
        DocumentType::General => "general medical report: summarize key findings and follow-up",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_prescription() {
        assert_eq!(
            classify_document("Prescription: Amoxicillin 500mg"),
            DocumentType::Prescription
        );
        assert_eq!(classify_document("DOSAGE: twice daily"), DocumentType::Prescription);
    }

    #[test]
    fn prescription_takes_precedence_over_blood_terms() {
        assert_eq!(
            classify_document("prescription for blood glucose monitoring"),
            DocumentType::Prescription
        );
    }

    #[test]
    fn classify_blood_test_variants() {
        for text in [
            "Complete Blood Count",
            "Fasting glucose 5.4 mmol/L",
            "Total Cholesterol 190",
            "Hemoglobin 13.5 g/dL",
            "Platelet count normal",
        ] {
            assert_eq!(classify_document(text), DocumentType::BloodTest, "{text}");
        }
    }

    #[test]
    fn blood_terms_take_precedence_over_imaging() {
        assert_eq!(
            classify_document("Imaging ordered after blood panel"),
            DocumentType::BloodTest
        );
    }

    #[test]
    fn classify_imaging() {
        assert_eq!(classify_document("Chest X-Ray, PA view"), DocumentType::XRay);
        assert_eq!(classify_document("Radiograph of left wrist"), DocumentType::XRay);
        assert_eq!(classify_document("MRI imaging results"), DocumentType::XRay);
    }

    #[test]
    fn classify_defaults_to_general() {
        assert_eq!(classify_document("routine checkup notes"), DocumentType::General);
        assert_eq!(classify_document(""), DocumentType::General);
    }

    #[test]
    fn xray_without_hyphen_is_general() {
        assert_eq!(classify_document("xray"), DocumentType::General);
    }

    #[test]
    fn every_type_has_summary_context() {
        for doc_type in [
            DocumentType::Prescription,
            DocumentType::BloodTest,
            DocumentType::XRay,
            DocumentType::General,
        ] {
            assert!(summary_context(doc_type).starts_with(match doc_type {
                DocumentType::Prescription => "prescription",
                DocumentType::BloodTest => "blood test",
                DocumentType::XRay => "imaging",
                DocumentType::General => "general",
            }));
        }
    }
}
