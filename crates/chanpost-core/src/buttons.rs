//! Inline link buttons embedded in captions as `[label](url)`.

use std::sync::OnceLock;

use regex::Regex;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonSpec {
    pub label: String,
    pub url: String,
}

/// Caption text with its link markers lifted out.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedButtons {
    pub buttons: Vec<ButtonSpec>,
    pub text: String,
}

fn link_marker() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[(.*?)\]\((.*?)\)").expect("valid regex"))
}

/// Pull every `[label](url)` marker out of `raw`, in order of appearance.
///
/// The remaining text is trimmed. Unbalanced brackets don't match and stay in
/// the text as written.
pub fn extract_buttons(raw: &str) -> ExtractedButtons {
    let re = link_marker();

    let buttons = re
        .captures_iter(raw)
        .map(|c| ButtonSpec {
            label: c[1].to_string(),
            url: c[2].to_string(),
        })
        .collect::<Vec<_>>();

    let text = if buttons.is_empty() {
        raw.trim().to_string()
    } else {
        re.replace_all(raw, "").trim().to_string()
    };

    ExtractedButtons { buttons, text }
}
