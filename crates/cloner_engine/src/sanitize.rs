use std::sync::OnceLock;

use regex::Regex;

const VIEWPORT_META: &str =
    r#"<meta name="viewport" content="width=device-width, initial-scale=1.0">"#;

fn script_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("script pattern"))
}

fn tracker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)google-analytics|googletagmanager|facebook|twitter\.com/widgets")
            .expect("tracker pattern")
    })
}

fn viewport_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)viewport").expect("viewport pattern"))
}

fn head_open_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<head[^>]*>").expect("head pattern"))
}

/// Best-effort cleanup of untrusted scraped markup.
///
/// Removes script elements and known tracking identifiers and guarantees a
/// responsive viewport meta tag. Total over malformed input and idempotent:
/// `sanitize(sanitize(h)) == sanitize(h)`.
pub fn sanitize(html: &str) -> String {
    let cleaned = strip_to_fixpoint(script_re(), html);
    let cleaned = strip_to_fixpoint(tracker_re(), &cleaned);
    ensure_viewport(cleaned)
}

// Removals can splice new matches together (`<scr` + stripped span + `ipt>`),
// so repeat until the pattern no longer fires.
fn strip_to_fixpoint(re: &Regex, input: &str) -> String {
    let mut current = input.to_string();
    loop {
        let next = re.replace_all(&current, "").into_owned();
        if next == current {
            return current;
        }
        current = next;
    }
}

fn ensure_viewport(html: String) -> String {
    if viewport_re().is_match(&html) {
        return html;
    }
    match head_open_re().find(&html) {
        Some(head) => {
            let mut out = String::with_capacity(html.len() + VIEWPORT_META.len() + 5);
            out.push_str(&html[..head.end()]);
            out.push_str("\n    ");
            out.push_str(VIEWPORT_META);
            out.push_str(&html[head.end()..]);
            out
        }
        None => html,
    }
}
