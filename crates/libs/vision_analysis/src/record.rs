use crate::AnalysisResult;
use std::borrow::Cow;
use std::fmt;

/// Records are newline delimited, so line breaks inside a field become spaces.
fn single_line(text: &str) -> Cow<'_, str> {
    if text.contains(['\n', '\r']) {
        Cow::Owned(text.replace("\r\n", " ").replace(['\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

/// Textual projection of one successfully analyzed image, as persisted.
///
/// ```text
/// imageURL: <reference>
/// suggestedDescription: <description>
/// hasHumanFaceOnImage: <true|false>
/// numberOfFacesDetected: <faceCount>
/// suggestedKeywords: [<tag1>, <tag2>, ...]
///
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ResultRecord<'a> {
    pub reference: &'a str,
    pub result: &'a AnalysisResult,
}

impl<'a> ResultRecord<'a> {
    #[must_use]
    pub const fn new(reference: &'a str, result: &'a AnalysisResult) -> Self {
        Self { reference, result }
    }
}

impl fmt::Display for ResultRecord<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "imageURL: {}", self.reference)?;
        writeln!(
            f,
            "suggestedDescription: {}",
            single_line(&self.result.description)
        )?;
        writeln!(f, "hasHumanFaceOnImage: {}", self.result.has_human_face())?;
        writeln!(f, "numberOfFacesDetected: {}", self.result.face_count)?;
        let tags: Vec<Cow<'_, str>> = self.result.tags.iter().map(|t| single_line(t)).collect();
        writeln!(f, "suggestedKeywords: [{}]", tags.join(", "))?;
        writeln!(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_record_with_blank_line() {
        let result = AnalysisResult {
            description: "a dog".to_string(),
            face_count: 1,
            tags: vec!["dog".to_string(), "outdoor".to_string()],
        };

        assert_eq!(
            ResultRecord::new("https://x/a.jpg", &result).to_string(),
            "imageURL: https://x/a.jpg\n\
             suggestedDescription: a dog\n\
             hasHumanFaceOnImage: true\n\
             numberOfFacesDetected: 1\n\
             suggestedKeywords: [dog, outdoor]\n\
             \n"
        );
    }

    #[test]
    fn no_faces_and_no_tags() {
        let result = AnalysisResult {
            description: "a wall".to_string(),
            face_count: 0,
            tags: vec![],
        };
        let record = ResultRecord::new("https://x/wall.jpg", &result).to_string();

        assert!(record.contains("hasHumanFaceOnImage: false\n"));
        assert!(record.contains("numberOfFacesDetected: 0\n"));
        assert!(record.ends_with("suggestedKeywords: []\n\n"));
    }

    #[test]
    fn line_breaks_in_fields_keep_record_intact() {
        let result = AnalysisResult {
            description: "a dog\nrunning on\r\nthe beach".to_string(),
            face_count: 0,
            tags: vec!["dog".to_string(), "sea\nside".to_string()],
        };
        let record = ResultRecord::new("https://x/dog.jpg", &result).to_string();

        assert_eq!(record.lines().count(), 6);
        assert!(record.contains("suggestedDescription: a dog running on the beach\n"));
        assert!(record.contains("suggestedKeywords: [dog, sea side]\n"));
    }
}
