//! Human-readable summary of a scan for the decision step.

use crate::identity::Identity;
use crate::metadata::MetadataStore;
use crate::scan::ScanClassification;
use std::fmt;

/// One titled group of lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSection {
    pub title: String,
    pub lines: Vec<String>,
}

/// The grouped lists shown to the user before they decide.
///
/// Sections appear in a fixed order (additions, evolutions, clones, removals)
/// and empty sections are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewSummary {
    pub sections: Vec<ReviewSection>,
}

impl ReviewSummary {
    pub fn build(classification: &ScanClassification, store: &MetadataStore) -> Self {
        let describe = |identity: &Identity| match classification.record(identity) {
            Some(record) => format!(
                "{} (Save: {}) (ID: {})",
                record.describe(),
                if record.container.is_empty() { "?" } else { record.container.as_str() },
                identity
            ),
            None => format!("ID: {}", identity),
        };

        let mut sections = Vec::new();

        if !classification.added.is_empty() {
            sections.push(ReviewSection {
                title: "Additions".to_string(),
                lines: classification
                    .added
                    .iter()
                    .map(|id| format!("[Added] {}", describe(id)))
                    .collect(),
            });
        }

        if !classification.evolutions.is_empty() {
            sections.push(ReviewSection {
                title: "Candidate evolutions".to_string(),
                lines: classification
                    .evolutions
                    .iter()
                    .map(|c| format!("[Evolution] {} -> {}", c.from, describe(&c.to)))
                    .collect(),
            });
        }

        if !classification.clone_groups.is_empty() {
            let mut lines = Vec::new();
            for group in &classification.clone_groups {
                lines.push(format!("[Clone] {} ({} copies)", group.identity, group.len()));
                for (index, member) in group.members.iter().enumerate() {
                    lines.push(format!(
                        "    #{} {} (Save: {})",
                        index,
                        member.describe(),
                        member.container
                    ));
                }
            }
            sections.push(ReviewSection {
                title: "Clone groups".to_string(),
                lines,
            });
        }

        if !classification.removed.is_empty() {
            sections.push(ReviewSection {
                title: "Removals".to_string(),
                lines: classification
                    .removed
                    .iter()
                    .map(|id| {
                        let comment = store
                            .get(id.as_str())
                            .map(|m| m.comment.as_str())
                            .unwrap_or("");
                        format!("[Removed] {} (ID: {})", comment, id)
                    })
                    .collect(),
            });
        }

        Self { sections }
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

impl fmt::Display for ReviewSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sections.is_empty() {
            return writeln!(f, "No changes detected.");
        }
        for section in &self.sections {
            writeln!(f, "{}:", section.title)?;
            for line in &section.lines {
                writeln!(f, "{}", line)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
