//! HTML rendering of the prediction form

use std::collections::HashMap;
use std::fmt::Write;

use shared::{feature_specs, FeatureKind, RainPrediction};

use crate::services::PredictionService;

/// What to show under the form
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Prediction(RainPrediction),
    Error(String),
}

impl Outcome {
    fn headline(&self) -> &str {
        match self {
            Outcome::Prediction(p) => p.label.as_str(),
            Outcome::Error(_) => "Error",
        }
    }

    fn detail(&self) -> String {
        match self {
            Outcome::Prediction(p) => p.probability_display(),
            Outcome::Error(message) => message.clone(),
        }
    }

    fn css_class(&self) -> &'static str {
        match self {
            Outcome::Prediction(p) => p.confidence.css_class(),
            Outcome::Error(_) => "low-confidence",
        }
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

const STYLE: &str = r#"
body { font-family: sans-serif; margin: 2em; background: #f5f5f5; }
form { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 0.8em; }
.field { background: white; border-radius: 6px; padding: 0.6em; box-shadow: 0 1px 3px rgba(0,0,0,0.1); }
.field label { display: block; font-weight: bold; margin-bottom: 0.3em; }
.field.categorical label::after { content: " (category)"; font-weight: normal; color: #777; }
.result { margin-top: 1.5em; padding: 1em; border-radius: 8px; background: white; }
.high-confidence { border-left: 8px solid #16a34a; }
.medium-confidence { border-left: 8px solid #f59e0b; }
.low-confidence { border-left: 8px solid #dc2626; }
"#;

fn render_field(out: &mut String, service: &PredictionService, feature: &str, kind: FeatureKind, value: &str) {
    let name = escape_html(feature);
    match kind {
        FeatureKind::Categorical => {
            let _ = write!(
                out,
                r#"<div class="field categorical"><label for="{name}">{name}</label><select id="{name}" name="{name}" required><option value="">--</option>"#
            );
            for class in service.categories(feature).unwrap_or_default() {
                let selected = if class == value { " selected" } else { "" };
                let class = escape_html(class);
                let _ = write!(out, r#"<option value="{class}"{selected}>{class}</option>"#);
            }
            out.push_str("</select></div>\n");
        }
        FeatureKind::Numeric => {
            let _ = writeln!(
                out,
                r#"<div class="field numeric"><label for="{name}">{name}</label><input type="number" step="any" id="{name}" name="{name}" value="{}" required></div>"#,
                escape_html(value)
            );
        }
    }
}

/// Full page: the 24-field form, plus the outcome of a submission if any
pub fn render(
    service: &PredictionService,
    submitted: &HashMap<String, String>,
    outcome: Option<&Outcome>,
) -> String {
    let mut fields = String::new();
    for spec in feature_specs() {
        let value = submitted.get(spec.name).map(String::as_str).unwrap_or("");
        render_field(&mut fields, service, spec.name, spec.kind, value);
    }

    let result = match outcome {
        Some(outcome) => format!(
            r#"<div class="result {}"><h2>{}</h2><p>{}</p></div>"#,
            outcome.css_class(),
            escape_html(outcome.headline()),
            escape_html(&outcome.detail())
        ),
        None => String::new(),
    };

    format!(
        r#"<!DOCTYPE html>
<html><head><meta charset="utf-8"><title>RainFlux - Rain Tomorrow</title>
<style>{STYLE}</style></head><body>
<h1>Will it rain tomorrow?</h1>
<form method="post" action="/">
{fields}<div class="field"><button type="submit">Predict</button></div>
</form>
{result}
</body></html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<b>"rain" & 'wind'</b>"#),
            "&lt;b&gt;&quot;rain&quot; &amp; &#x27;wind&#x27;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_error_outcome_is_low_confidence() {
        let outcome = Outcome::Error("Missing value for Rainfall".into());
        assert_eq!(outcome.headline(), "Error");
        assert_eq!(outcome.css_class(), "low-confidence");
        assert_eq!(outcome.detail(), "Missing value for Rainfall");
    }

    #[test]
    fn test_prediction_outcome() {
        let outcome = Outcome::Prediction(RainPrediction::new(0, 0.65).unwrap());
        assert_eq!(outcome.headline(), "NO");
        assert_eq!(outcome.detail(), "65.0%");
        assert_eq!(outcome.css_class(), "medium-confidence");
    }
}
