//! Markup rendering
//!
//! Channel fragments hold the small HTML subset producers send and the
//! formatter emits: `<span style>`, `<pre style>`, `<b>`/`<strong>`,
//! `<i>`/`<em>`, `<u>`, `<br />` and character entities. Any tag may carry
//! a `style` attribute. Unknown tags are dropped and their text kept.
//!
//! Outside `<pre>` a raw newline is ordinary whitespace; inside it lines are
//! kept as sent.

use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

/// Render one fragment to styled lines
pub fn render(fragment: &str, base: Style) -> Vec<Line<'static>> {
    let mut renderer = Renderer::new(base);
    for token in Tokenizer::new(fragment) {
        renderer.apply(token);
    }
    renderer.finish()
}

/// Plain text of one fragment, `<br />` as newline
pub fn to_plain(fragment: &str) -> String {
    render(fragment, Style::default())
        .iter()
        .map(|line| {
            line.spans
                .iter()
                .map(|span| span.content.as_ref())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────────────────────────────────────
// Tokenizer
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Text(&'a str),
    Open {
        name: String,
        style: Option<String>,
        self_closing: bool,
    },
    Close(String),
}

struct Tokenizer<'a> {
    rest: &'a str,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { rest: input }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Token<'a>> {
        if self.rest.is_empty() {
            return None;
        }

        if !self.rest.starts_with('<') {
            let end = self.rest.find('<').unwrap_or(self.rest.len());
            let (text, rest) = self.rest.split_at(end);
            self.rest = rest;
            return Some(Token::Text(text));
        }

        // A '<' that never closes is literal text
        let Some(end) = self.rest.find('>') else {
            let text = self.rest;
            self.rest = "";
            return Some(Token::Text(text));
        };

        let inner = &self.rest[1..end];
        self.rest = &self.rest[end + 1..];
        Some(parse_tag(inner))
    }
}

fn parse_tag(inner: &str) -> Token<'_> {
    let inner = inner.trim();

    if let Some(name) = inner.strip_prefix('/') {
        return Token::Close(name.trim().to_lowercase());
    }

    let self_closing = inner.ends_with('/');
    let inner = inner.trim_end_matches('/').trim_end();
    let (name, attrs) = match inner.find(char::is_whitespace) {
        Some(i) => (&inner[..i], &inner[i..]),
        None => (inner, ""),
    };

    Token::Open {
        name: name.to_lowercase(),
        style: attribute(attrs, "style"),
        self_closing,
    }
}

/// Value of `name="..."` or `name='...'` in an attribute list
fn attribute(attrs: &str, name: &str) -> Option<String> {
    let lower = attrs.to_ascii_lowercase();
    let mut search = 0;
    while let Some(found) = lower[search..].find(name) {
        let start = search + found;
        search = start + name.len();

        let boundary = lower[..start]
            .chars()
            .next_back()
            .map_or(true, char::is_whitespace);
        let after = attrs[search..].trim_start();
        if !boundary || !after.starts_with('=') {
            continue;
        }

        let value = after[1..].trim_start();
        let mut chars = value.chars();
        return match chars.next() {
            Some(quote @ ('"' | '\'')) => {
                let body = &value[1..];
                Some(body[..body.find(quote).unwrap_or(body.len())].to_string())
            }
            Some(_) => Some(
                value
                    .split(char::is_whitespace)
                    .next()
                    .unwrap_or_default()
                    .to_string(),
            ),
            None => None,
        };
    }
    None
}

// ─────────────────────────────────────────────────────────────────────────────
// Renderer
// ─────────────────────────────────────────────────────────────────────────────

struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    /// Open elements with the style in effect inside them
    stack: Vec<(String, Style)>,
    base: Style,
    pre_depth: usize,
}

impl Renderer {
    fn new(base: Style) -> Self {
        Self {
            lines: Vec::new(),
            current: Vec::new(),
            stack: Vec::new(),
            base,
            pre_depth: 0,
        }
    }

    fn style(&self) -> Style {
        self.stack.last().map_or(self.base, |(_, style)| *style)
    }

    fn apply(&mut self, token: Token<'_>) {
        match token {
            Token::Text(text) => self.text(&decode_entities(text)),
            Token::Open {
                name,
                style,
                self_closing,
            } => {
                if name == "br" {
                    self.break_line();
                    return;
                }
                if self_closing || is_void(&name) {
                    return;
                }
                if name == "pre" {
                    if !self.current.is_empty() {
                        self.break_line();
                    }
                    self.pre_depth += 1;
                }

                let mut inner = self.style().patch(tag_style(&name));
                if let Some(css) = style {
                    inner = inner.patch(parse_css(&css));
                }
                self.stack.push((name, inner));
            }
            Token::Close(name) => {
                // Unmatched closing tags are ignored
                let Some(pos) = self.stack.iter().rposition(|(open, _)| *open == name) else {
                    return;
                };
                for (open, _) in self.stack.drain(pos..) {
                    if open == "pre" {
                        self.pre_depth = self.pre_depth.saturating_sub(1);
                    }
                }
                if name == "pre" {
                    self.break_line();
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        let style = self.style();
        if self.pre_depth > 0 {
            let mut parts = text.split('\n');
            if let Some(first) = parts.next() {
                self.push(first.trim_end_matches('\r'), style);
            }
            for part in parts {
                self.break_line();
                self.push(part.trim_end_matches('\r'), style);
            }
        } else {
            let flat: String = text
                .chars()
                .filter(|&c| c != '\r')
                .map(|c| if c == '\n' { ' ' } else { c })
                .collect();
            self.push(&flat, style);
        }
    }

    fn push(&mut self, text: &str, style: Style) {
        if !text.is_empty() {
            self.current.push(Span::styled(text.to_string(), style));
        }
    }

    fn break_line(&mut self) {
        self.lines
            .push(Line::from(std::mem::take(&mut self.current)));
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        if !self.current.is_empty() || self.lines.is_empty() {
            self.break_line();
        }
        self.lines
    }
}

fn is_void(name: &str) -> bool {
    matches!(name, "hr" | "img" | "wbr" | "meta" | "link" | "input")
}

/// Built-in presentation of plain HTML tags
fn tag_style(name: &str) -> Style {
    match name {
        "b" | "strong" => Style::default().add_modifier(Modifier::BOLD),
        "i" | "em" | "cite" => Style::default().add_modifier(Modifier::ITALIC),
        "u" | "ins" => Style::default().add_modifier(Modifier::UNDERLINED),
        "s" | "del" | "strike" => Style::default().add_modifier(Modifier::CROSSED_OUT),
        _ => Style::default(),
    }
}

/// Map the inline CSS properties a terminal can show
pub fn parse_css(css: &str) -> Style {
    let mut style = Style::default();

    for declaration in css.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let property = property.trim().to_lowercase();
        let value = value.trim().to_lowercase();

        match property.as_str() {
            "color" => {
                if let Some(color) = parse_color(&value) {
                    style = style.fg(color);
                }
            }
            "background" | "background-color" => {
                if let Some(color) = parse_color(&value) {
                    style = style.bg(color);
                }
            }
            "font-weight" => {
                let bold = value == "bold"
                    || value == "bolder"
                    || value.parse::<u16>().is_ok_and(|w| w >= 600);
                if bold {
                    style = style.add_modifier(Modifier::BOLD);
                }
            }
            "font-style" if value == "italic" || value == "oblique" => {
                style = style.add_modifier(Modifier::ITALIC);
            }
            "text-decoration" | "text-decoration-line" => {
                if value.contains("underline") {
                    style = style.add_modifier(Modifier::UNDERLINED);
                }
                if value.contains("line-through") {
                    style = style.add_modifier(Modifier::CROSSED_OUT);
                }
            }
            _ => {}
        }
    }

    style
}

fn parse_color(value: &str) -> Option<Color> {
    if let Some(hex) = value.strip_prefix('#') {
        let digits = hex
            .chars()
            .map(|c| c.to_digit(16).map(|d| d as u8))
            .collect::<Option<Vec<u8>>>()?;
        return match digits[..] {
            [r1, r2, g1, g2, b1, b2] => Some(Color::Rgb(r1 * 16 + r2, g1 * 16 + g2, b1 * 16 + b2)),
            [r, g, b] => Some(Color::Rgb(r * 17, g * 17, b * 17)),
            _ => None,
        };
    }

    let color = match value {
        "black" => Color::Black,
        "red" | "maroon" => Color::Red,
        "green" | "lime" => Color::Green,
        "yellow" | "olive" => Color::Yellow,
        "blue" | "navy" => Color::Blue,
        "magenta" | "fuchsia" | "purple" => Color::Magenta,
        "cyan" | "aqua" | "teal" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "silver" => Color::Gray,
        "orange" => Color::Rgb(255, 165, 0),
        _ => return None,
    };
    Some(color)
}

/// Decode named and numeric character references
pub fn decode_entities(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];

        let decoded = rest
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| entity(&rest[1..semi]).map(|c| (c, semi)));

        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn entity(name: &str) -> Option<char> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "copy" => '©',
        "reg" => '®',
        "hellip" => '…',
        "mdash" => '—',
        "ndash" => '–',
        _ => return None,
    };
    Some(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(lines: &[Line<'_>]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_plain_text_is_one_line() {
        let lines = render("hello world", Style::default());
        assert_eq!(texts(&lines), ["hello world"]);
    }

    #[test]
    fn test_empty_fragment_is_one_blank_line() {
        assert_eq!(render("", Style::default()).len(), 1);
    }

    #[test]
    fn test_styled_span() {
        let lines = render(
            "a <span style=\"color:#ff0000;font-weight:bold\">b</span> c",
            Style::default(),
        );
        let spans = &lines[0].spans;
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[1].content, "b");
        assert_eq!(spans[1].style.fg, Some(Color::Rgb(255, 0, 0)));
        assert!(spans[1].style.add_modifier.contains(Modifier::BOLD));
        assert_eq!(spans[2].style, Style::default());
    }

    #[test]
    fn test_single_quoted_style_and_nesting() {
        let lines = render(
            "<b><span style='color:#0f0; font-style: italic'>x</span></b>",
            Style::default(),
        );
        let span = &lines[0].spans[0];
        assert_eq!(span.style.fg, Some(Color::Rgb(0, 255, 0)));
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
        assert!(span.style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_br_breaks_lines_and_newlines_are_spaces() {
        let lines = render("one<br />two<BR>three\nfour", Style::default());
        assert_eq!(texts(&lines), ["one", "two", "three four"]);
    }

    #[test]
    fn test_pre_keeps_lines() {
        let lines = render(
            "before<pre style=\"color:#c8e1ff\">a\n  b</pre>after",
            Style::default(),
        );
        assert_eq!(texts(&lines), ["before", "a", "  b", "after"]);
        assert_eq!(lines[2].spans[0].style.fg, Some(Color::Rgb(0xc8, 0xe1, 0xff)));
    }

    #[test]
    fn test_unknown_tags_keep_text_and_stray_closers_are_ignored() {
        assert_eq!(to_plain("<time>[12:00]</time> <h1>x</h1></div>"), "[12:00] x");
        assert_eq!(to_plain("1 < 2"), "1 < 2");
    }

    #[test]
    fn test_entities() {
        assert_eq!(
            decode_entities("&lt;a&gt; &amp;&amp; &quot;q&quot; &#39;s&#39; &#x41;&nbsp;"),
            "<a> && \"q\" 's' A\u{a0}"
        );
        assert_eq!(decode_entities("AT&T & co;"), "AT&T & co;");
        assert_eq!(decode_entities("&bogus;"), "&bogus;");
    }

    #[test]
    fn test_to_plain_joins_lines() {
        assert_eq!(
            to_plain("<b style=\"color:#9ee7ff\">user</b> :&nbsp;ana<br /><br />x"),
            "user :\u{a0}ana\n\nx"
        );
    }

    #[test]
    fn test_parse_css() {
        let style = parse_css("background-color: navy; text-decoration: underline; font-weight: 700");
        assert_eq!(style.bg, Some(Color::Blue));
        assert!(style.add_modifier.contains(Modifier::UNDERLINED));
        assert!(style.add_modifier.contains(Modifier::BOLD));

        assert_eq!(parse_css("color:#12345").fg, None);
        assert_eq!(parse_css("font-family:monospace"), Style::default());
    }

    #[test]
    fn test_non_ascii_hex_colors_are_ignored() {
        // 3 and 6 bytes long, but not 3 or 6 hex digits
        for css in ["color:#éa", "color:#ééé", "background:#ff€", "color:#+ff"] {
            assert_eq!(parse_css(css), Style::default(), "{css}");
        }

        let lines = render("<span style=\"color:#éa\">x</span><span style='color:#日本'>y</span>", Style::default());
        assert_eq!(texts(&lines), ["xy"]);
        assert_eq!(lines[0].spans[0].style.fg, None);
    }

    #[test]
    fn test_malformed_attributes() {
        assert_eq!(to_plain("<span style=\"\">a</span>"), "a");
        assert_eq!(to_plain("<span style=>b</span>"), "b");

        // Unterminated quote runs to the end of the tag
        let lines = render("<span style=\"color:#0f0>c</span>", Style::default());
        assert_eq!(texts(&lines), ["c"]);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Rgb(0, 255, 0)));

        assert_eq!(to_plain("<span style='é>d</span>"), "d");
    }

    #[test]
    fn test_invalid_numeric_entities_stay_literal() {
        assert_eq!(decode_entities("&#99999999999;"), "&#99999999999;");
        assert_eq!(decode_entities("&#xD800;"), "&#xD800;");
        assert_eq!(decode_entities("&#x110000;"), "&#x110000;");
        assert_eq!(decode_entities("&#;&#x;"), "&#;&#x;");
        assert_eq!(decode_entities("&#é;"), "&#é;");
        assert_eq!(decode_entities("&#x1F600;"), "😀");
    }

    #[test]
    fn test_base_style_applies_to_plain_text() {
        let base = Style::default().fg(Color::White);
        let lines = render("x<u>y</u>", base);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::White));
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::White));
        assert!(lines[0].spans[1].style.add_modifier.contains(Modifier::UNDERLINED));
    }
}
