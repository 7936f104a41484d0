use async_trait::async_trait;

use webinfer_protocols::{Classification, ClassificationError, ClassificationRequest, Classifier};

/// Fields pulled out of normalized section content.
#[derive(Debug, Default)]
struct Features<'a> {
    tag: &'a str,
    role: &'a str,
    classes: &'a str,
    id: &'a str,
    text: &'a str,
    links: usize,
    inputs: usize,
}

impl<'a> Features<'a> {
    fn parse(content: &'a str) -> Self {
        let mut features = Features::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "tag" => features.tag = value,
                "role" => features.role = value,
                "classes" => features.classes = value,
                "id" => features.id = value,
                "text" => features.text = value,
                "links" => features.links = value.parse().unwrap_or(0),
                "inputs" => features.inputs = value.parse().unwrap_or(0),
                _ => {}
            }
        }
        features
    }

    fn marked(&self, needle: &str) -> bool {
        self.classes.contains(needle) || self.id.contains(needle)
    }
}

/// Keyword rules applied in order; the first match wins.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }

    fn judge(content: &str) -> Classification {
        let f = Features::parse(content);

        if f.tag == "nav" || f.role == "navigation" || f.marked("nav") {
            return classification(
                "navigation",
                0.85,
                format!("Navigation markers on <{}> with {} links.", f.tag, f.links),
            );
        }
        if f.tag == "header" || f.role == "banner" {
            return classification(
                "header",
                0.9,
                "Page header carrying branding and top-level navigation.".to_string(),
            );
        }
        if f.tag == "footer" || f.role == "contentinfo" || f.marked("footer") {
            return classification(
                "footer",
                0.8,
                "Footer with supplementary links and legal information.".to_string(),
            );
        }
        if f.role == "search" || f.marked("search") || f.text.to_lowercase().contains("search") {
            return classification(
                "search",
                0.75,
                format!("Search markers with {} input field(s).", f.inputs),
            );
        }

        let tag = if f.tag.is_empty() { "unknown" } else { f.tag };
        if f.text.is_empty() {
            classification(
                "layout",
                0.4,
                format!("<{}> element without text or semantic markers.", tag),
            )
        } else {
            classification(
                "content",
                0.4,
                format!("<{}> element containing text but no semantic markers.", tag),
            )
        }
    }
}

fn classification(label: &str, confidence: f64, rationale: String) -> Classification {
    Classification {
        label: label.to_string(),
        confidence,
        rationale,
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn id(&self) -> &str {
        "heuristic"
    }

    fn model(&self) -> &str {
        "keyword-rules"
    }

    async fn classify(
        &self,
        request: &ClassificationRequest,
    ) -> Result<Classification, ClassificationError> {
        Ok(Self::judge(&request.content))
    }
}
