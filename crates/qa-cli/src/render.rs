//! Terminal output for answers.

use anyhow::Result;
use serde_json::json;

use qa_core::{Answer, Fragment};

/// Plain-text rendering: the message, or one block per fragment.
pub fn render_text(answer: &Answer) -> String {
    match answer {
        Answer::Message(message) => message.clone(),
        Answer::Fragments(fragments) => {
            let mut output = String::new();
            for fragment in fragments {
                render_fragment(&mut output, fragment);
            }
            if let Some(first) = fragments.first() {
                output.push_str(&format!("More: {}\n", first.title_link));
            }
            output.trim_end().to_string()
        }
        Answer::NoAnswer => "No answer.".to_string(),
    }
}

fn render_fragment(output: &mut String, fragment: &Fragment) {
    let marker = if fragment.color.is_some() { "*" } else { "-" };
    output.push_str(&format!("{} {}\n", marker, fragment.title));
    if !fragment.fallback.is_empty() {
        for line in fragment.fallback.lines() {
            output.push_str(&format!("    {}\n", line));
        }
    }
    if let Some(url) = &fragment.image_url {
        match (fragment.image_width, fragment.image_height) {
            (Some(w), Some(h)) => output.push_str(&format!("    [image {}x{}] {}\n", w, h, url)),
            _ => output.push_str(&format!("    [image] {}\n", url)),
        }
    }
    output.push('\n');
}

/// JSON rendering of the `(message, attachments, error)` triple.
pub fn render_json(answer: &Answer) -> Result<String> {
    let (message, fragments, error) = answer.clone().into_parts();
    let value = json!({
        "message": message,
        "attachments": fragments,
        "error": error,
    });
    Ok(serde_json::to_string_pretty(&value)?)
}
