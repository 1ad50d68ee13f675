//! Deterministic skill sidecars consulted by the technical and financial
//! specialists before they call the LLM. Failures are swallowed by callers:
//! a skill only ever augments the prompt, it never blocks the answer.

use std::collections::HashSet;

use crate::retrieval::Document;

/// Extracts a short technical-stack summary from context text.
pub trait TechStackExtractor: Send + Sync {
    /// Returns a summary of detected technologies, or `None` if nothing was
    /// found.
    fn extract_tech_stack(&self, texts: &[&str]) -> Option<String>;
}

/// Renders tabular financial data found on a given `(source, page)` into
/// Markdown.
pub trait FinancialTableExtractor: Send + Sync {
    /// Returns a Markdown table for the page, or `None` if no table-like
    /// structure was detected.
    fn extract_table(&self, content: &str) -> Option<String>;
}

/// Deterministic keyword-based stand-in for a real tech-stack classifier.
#[derive(Debug, Clone, Default)]
pub struct KeywordTechStackExtractor;

const KNOWN_TECHNOLOGIES: &[&str] = &[
    "kubernetes", "docker", "postgresql", "mysql", "redis", "kafka", "aws", "azure", "gcp",
    "react", "angular", "java", "python", "rust", "golang", ".net", "linux", "windows server",
];

impl TechStackExtractor for KeywordTechStackExtractor {
    fn extract_tech_stack(&self, texts: &[&str]) -> Option<String> {
        let combined = texts.join(" ").to_lowercase();
        let found: Vec<&str> = KNOWN_TECHNOLOGIES
            .iter()
            .copied()
            .filter(|tech| combined.contains(tech))
            .collect();

        if found.is_empty() {
            None
        } else {
            Some(format!("Stack tecnológico detectado: {}", found.join(", ")))
        }
    }
}

/// Deterministic stand-in for a real table-structure parser: recognizes
/// lines with multiple numeric columns separated by whitespace or `|`.
#[derive(Debug, Clone, Default)]
pub struct HeuristicFinancialTableExtractor;

impl FinancialTableExtractor for HeuristicFinancialTableExtractor {
    fn extract_table(&self, content: &str) -> Option<String> {
        let candidate_lines: Vec<&str> = content
            .lines()
            .filter(|line| {
                let numeric_tokens = line
                    .split(|c: char| c.is_whitespace() || c == '|')
                    .filter(|tok| !tok.is_empty() && tok.chars().any(|c| c.is_ascii_digit()))
                    .count();
                numeric_tokens >= 2
            })
            .collect();

        if candidate_lines.is_empty() {
            return None;
        }

        let mut table = String::from("| Fila |\n|---|\n");
        for line in &candidate_lines {
            table.push_str("| ");
            table.push_str(line.trim());
            table.push_str(" |\n");
        }
        Some(table)
    }
}

/// Groups documents by unique `(source, page)` pairs, capped at `max_pages`
/// distinct pages, preserving first-seen order.
#[must_use]
pub fn unique_pages(docs: &[Document], max_pages: usize) -> Vec<(String, u32, String)> {
    let mut seen = HashSet::new();
    let mut pages = Vec::new();
    for doc in docs {
        let key = (doc.source().to_string(), doc.page());
        if seen.insert(key.clone()) {
            pages.push((key.0, key.1, doc.content.clone()));
            if pages.len() >= max_pages {
                break;
            }
        }
    }
    pages
}
