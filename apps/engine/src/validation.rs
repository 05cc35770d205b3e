//! Constraint Validator — checks a typeset rendering against hard limits.
//!
//! Checks run in a fixed order (page count, line length, forbidden
//! phrases, compilation diagnostics); all checks always run, the order
//! only fixes how violations are reported. An empty result means the
//! document is acceptable. The validator never mutates content.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::RenderedDocument;

/// Hard layout/content constraints on the rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Constraints {
    pub max_pages: u32,
    pub max_line_chars: usize,
    /// Matched case-insensitively as substrings.
    pub forbidden_phrases: Vec<String>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            max_pages: 1,
            max_line_chars: 100,
            forbidden_phrases: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    PageCount,
    LineLength,
    ForbiddenPhrase,
    CompilationError,
}

/// A typed defect in the rendered document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub message: String,
    /// Zero-based line index, where the defect is line-local.
    pub line: Option<usize>,
    /// Owning plan bullet, where the renderer could attribute the line.
    pub bullet_id: Option<Uuid>,
}

/// Validates a rendered document. Returns one violation per defect.
pub fn validate(doc: &RenderedDocument, constraints: &Constraints) -> Vec<Violation> {
    let mut violations = Vec::new();

    // 1. Page count.
    if doc.page_count > constraints.max_pages {
        violations.push(Violation {
            kind: ViolationKind::PageCount,
            message: format!(
                "document spans {} pages (max {})",
                doc.page_count, constraints.max_pages
            ),
            line: None,
            bullet_id: None,
        });
    }

    // 2. Line length.
    for (index, line) in doc.lines.iter().enumerate() {
        let chars = line.text.chars().count();
        if chars > constraints.max_line_chars {
            violations.push(Violation {
                kind: ViolationKind::LineLength,
                message: format!(
                    "line {index} is {chars} chars (max {})",
                    constraints.max_line_chars
                ),
                line: Some(index),
                bullet_id: line.bullet_id,
            });
        }
    }

    // 3. Forbidden phrases.
    for phrase in &constraints.forbidden_phrases {
        let needle = phrase.to_lowercase();
        for (index, line) in doc.lines.iter().enumerate() {
            if line.text.to_lowercase().contains(&needle) {
                violations.push(Violation {
                    kind: ViolationKind::ForbiddenPhrase,
                    message: format!("forbidden phrase {phrase:?} on line {index}"),
                    line: Some(index),
                    bullet_id: line.bullet_id,
                });
            }
        }
    }

    // 4. Compilation diagnostics from the renderer.
    for diagnostic in &doc.diagnostics {
        violations.push(Violation {
            kind: ViolationKind::CompilationError,
            message: diagnostic.message.clone(),
            line: None,
            bullet_id: diagnostic.bullet_id,
        });
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{RenderDiagnostic, RenderedLine};

    fn make_doc(lines: Vec<(&str, Option<Uuid>)>) -> RenderedDocument {
        RenderedDocument {
            page_count: 1,
            lines: lines
                .into_iter()
                .map(|(text, bullet_id)| RenderedLine {
                    text: text.to_string(),
                    bullet_id,
                })
                .collect(),
            diagnostics: Vec::new(),
        }
    }

    fn strict() -> Constraints {
        Constraints {
            max_pages: 1,
            max_line_chars: 40,
            forbidden_phrases: vec!["synergy".to_string()],
        }
    }

    #[test]
    fn test_clean_document_has_no_violations() {
        let doc = make_doc(vec![("Shipped a caching layer", None)]);
        assert!(validate(&doc, &strict()).is_empty());
    }

    #[test]
    fn test_two_long_lines_and_one_phrase_yield_three_violations() {
        let bullet = Uuid::from_u128(7);
        let long = "x".repeat(55);
        let doc = make_doc(vec![
            (long.as_str(), Some(bullet)),
            (long.as_str(), None),
            ("Drove cross-team Synergy initiatives", Some(bullet)),
        ]);
        let violations = validate(&doc, &strict());
        assert_eq!(violations.len(), 3);
        assert_eq!(violations[0].kind, ViolationKind::LineLength);
        assert_eq!(violations[1].kind, ViolationKind::LineLength);
        assert_eq!(violations[2].kind, ViolationKind::ForbiddenPhrase);
        assert_eq!(violations[0].bullet_id, Some(bullet));
        assert_eq!(violations[2].line, Some(2));
    }

    #[test]
    fn test_page_overflow_reported_first() {
        let mut doc = make_doc(vec![("x".repeat(50).as_str(), None)]);
        doc.page_count = 2;
        let violations = validate(&doc, &strict());
        assert_eq!(violations[0].kind, ViolationKind::PageCount);
        assert_eq!(violations.len(), 2);
    }

    #[test]
    fn test_forbidden_phrase_match_is_case_insensitive() {
        let doc = make_doc(vec![("SYNERGY everywhere", None)]);
        let violations = validate(&doc, &strict());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ForbiddenPhrase);
    }

    #[test]
    fn test_compilation_diagnostics_become_violations() {
        let bullet = Uuid::from_u128(3);
        let mut doc = make_doc(vec![("fine line", None)]);
        doc.diagnostics.push(RenderDiagnostic {
            message: "undefined control sequence".to_string(),
            bullet_id: Some(bullet),
        });
        let violations = validate(&doc, &strict());
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::CompilationError);
        assert_eq!(violations[0].bullet_id, Some(bullet));
    }

    #[test]
    fn test_line_exactly_at_limit_passes() {
        let exact = "y".repeat(40);
        let doc = make_doc(vec![(exact.as_str(), None)]);
        assert!(validate(&doc, &strict()).is_empty());
    }
}
