use serde::{Deserialize, Serialize};

use crate::substitute::SubstitutionMap;

/// A stored report: the record whose fields conventionally fill a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Assigned by whatever stores the record; `None` until then.
    pub id: Option<i32>,
    pub title: String,
    pub content: String,
}

impl Report {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            content: content.into(),
        }
    }

    pub fn with_id(mut self, id: i32) -> Self {
        self.id = Some(id);
        self
    }

    /// `{title, content}`, ready for substitution.
    pub fn to_substitution_map(&self) -> SubstitutionMap {
        SubstitutionMap::from([
            ("title".to_string(), self.title.clone()),
            ("content".to_string(), self.content.clone()),
        ])
    }

    /// File name used when serving a generated presentation for this report.
    pub fn attachment_name(&self) -> String {
        match self.id {
            Some(id) => format!("report_{id}.pptx"),
            None => "report.pptx".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_map() {
        let report = Report::new("Q1 Report", "Summary text");
        let map = report.to_substitution_map();
        assert_eq!(map.len(), 2);
        assert_eq!(map["title"], "Q1 Report");
        assert_eq!(map["content"], "Summary text");
    }

    #[test]
    fn test_attachment_name() {
        assert_eq!(Report::new("a", "b").attachment_name(), "report.pptx");
        assert_eq!(Report::new("a", "b").with_id(7).attachment_name(), "report_7.pptx");
    }
}
