//! Inline SVG shown when no screenshot could be produced

use url::Url;

pub const CONTENT_TYPE: &str = "image/svg+xml";

/// Render a neutral card labelled with the target's host name
pub fn render(target: &str, width: u32, height: u32) -> String {
    let label = Url::parse(target)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| "Preview unavailable".to_string());
    let font_size = (width.min(height) / 12).max(12);

    format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}"><rect width="100%" height="100%" fill="#1f2937"/><text x="50%" y="50%" fill="#9ca3af" font-family="system-ui, sans-serif" font-size="{fs}" text-anchor="middle" dominant-baseline="middle">{label}</text></svg>"##,
        w = width,
        h = height,
        fs = font_size,
        label = escape_xml(&label),
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
