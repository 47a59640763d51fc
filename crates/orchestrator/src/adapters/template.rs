use async_trait::async_trait;
use autoblog_core::{Draft, Topic};

use crate::collaborators::{CollaboratorResult, ContentGenerator};
use crate::error::CollaboratorError;
use crate::files::escape_html;

const EXCERPT_CHARS: usize = 160;
const MAX_KEYWORD_LABELS: usize = 3;

/// Offline generator that fills a fixed article template.
///
/// Output depends only on its inputs, which makes it useful for dry runs and
/// for exercising the pipeline without a provider.
#[derive(Debug, Clone, Default)]
pub struct TemplateContentGenerator {
    byline: Option<String>,
}

impl TemplateContentGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_byline(mut self, byline: impl Into<String>) -> Self {
        self.byline = Some(byline.into());
        self
    }

    fn render_body(&self, topic: &Topic, niche: Option<&str>) -> String {
        let subject = escape_html(&topic.text);
        let audience = niche.map(escape_html).unwrap_or_else(|| "everyone".to_string());

        let mut body = String::new();
        body.push_str(&format!("<p>{}</p>\n", escape_html(&topic.hook)));
        body.push_str("<h2>Why it matters</h2>\n");
        body.push_str(&format!(
            "<p>{} is drawing attention across the {} community. Here is what changed and why it is worth your time.</p>\n",
            subject, audience
        ));
        body.push_str("<h2>Key takeaways</h2>\n<ul>\n");
        body.push_str(&format!("<li>What {} is and where it came from</li>\n", subject));
        body.push_str("<li>Who is affected and how</li>\n");
        body.push_str("<li>What to watch for next</li>\n</ul>\n");
        body.push_str("<h2>Conclusion</h2>\n");
        body.push_str(&format!(
            "<p>Keep an eye on {}: the conversation is only getting started.</p>",
            subject
        ));
        if let Some(ref byline) = self.byline {
            body.push_str(&format!("\n<p><em>By {}</em></p>", escape_html(byline)));
        }
        body
    }
}

fn excerpt(text: &str) -> String {
    if text.chars().count() <= EXCERPT_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(EXCERPT_CHARS - 3).collect();
    cut.push_str("...");
    cut
}

fn labels(topic: &Topic, niche: Option<&str>) -> Vec<String> {
    let mut labels: Vec<String> = niche.map(|n| vec![n.to_lowercase()]).unwrap_or_default();
    let keywords = topic
        .text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > 3)
        .map(str::to_lowercase);

    for keyword in keywords {
        if labels.len() >= MAX_KEYWORD_LABELS + usize::from(niche.is_some()) {
            break;
        }
        if !labels.contains(&keyword) {
            labels.push(keyword);
        }
    }
    labels
}

#[async_trait]
impl ContentGenerator for TemplateContentGenerator {
    async fn generate(
        &self,
        topic: &Topic,
        niche: Option<&str>,
        _account: Option<&str>,
    ) -> CollaboratorResult<Draft> {
        topic
            .validate()
            .map_err(|e| CollaboratorError::invalid_input(e.to_string()))?;

        let source = if topic.hook.trim().is_empty() {
            &topic.text
        } else {
            &topic.hook
        };

        Ok(Draft::new(
            format!("{}: What You Need to Know", topic.text.trim()),
            self.render_body(topic, niche),
        )
        .with_excerpt(excerpt(source))
        .with_labels(labels(topic, niche)))
    }
}
