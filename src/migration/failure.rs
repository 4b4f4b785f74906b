use std::fmt;

/// Diagnostic kept by the engine when a run stops on a failed update.
///
/// The parts are stored unformatted; callers pick the rendering that suits
/// their output: [`UpdateFailure::to_text`] for a console,
/// [`UpdateFailure::to_html`] for a web page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateFailure {
    revision: Option<u32>,
    message: String,
    statement: Option<String>,
}

impl UpdateFailure {
    pub fn new(revision: Option<u32>, message: impl Into<String>, statement: Option<String>) -> Self {
        Self {
            revision,
            message: message.into(),
            statement,
        }
    }

    /// The failing revision, or `None` if the run failed before a step was chosen
    /// (for example when the revision counter could not be read).
    pub fn revision(&self) -> Option<u32> {
        self.revision
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn statement(&self) -> Option<&str> {
        self.statement.as_deref()
    }

    fn headline(&self) -> String {
        match self.revision {
            Some(revision) => format!("Database update {} failed.", revision),
            None => "Database update failed.".to_string(),
        }
    }

    pub fn to_text(&self) -> String {
        let mut text = format!(
            "{}\n\nException message was:\n{}",
            self.headline(),
            self.message
        );

        if let Some(statement) = &self.statement {
            text.push_str("\nQuery was:\n");
            text.push_str(statement);
        }

        text
    }

    pub fn to_html(&self) -> String {
        let mut html = format!(
            "{}<br /><br /><strong>Exception message was:</strong><br />{}",
            html_escape(&self.headline()),
            html_escape(&self.message)
        );

        if let Some(statement) = &self.statement {
            html.push_str("<br /><strong>Query was:</strong><br />");
            html.push_str(&html_escape(statement));
        }

        html
    }
}

impl fmt::Display for UpdateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl std::error::Error for UpdateFailure {}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
