//! Minimal editor for CP2K-style section input.
//!
//! The input is kept as raw lines so that everything not touched by the sweep survives
//! verbatim. Sections open with `&NAME [parameter]` and close with `&END [NAME]`; names
//! compare case-insensitively.

use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cp2kInput {
    lines: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SectionSpan {
    open: usize,
    end: usize,
    depth: usize,
}

impl SectionSpan {
    fn body(&self) -> Range<usize> {
        self.open + 1..self.end
    }
}

enum LineKind<'a> {
    Open(&'a str),
    Close,
    Other,
}

fn classify(line: &str) -> LineKind<'_> {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') || trimmed.starts_with('!') {
        return LineKind::Other;
    }
    let Some(rest) = trimmed.strip_prefix('&') else {
        return LineKind::Other;
    };
    let name = rest.split_whitespace().next().unwrap_or("");
    if name.eq_ignore_ascii_case("END") {
        LineKind::Close
    } else {
        LineKind::Open(name)
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

impl Cp2kInput {
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.lines().map(str::to_owned).collect(),
        }
    }

    pub fn render(&self) -> String {
        let mut out = self.lines.join("\n");
        out.push('\n');
        out
    }

    fn find(&self, path: &[&str]) -> Option<SectionSpan> {
        let mut stack: Vec<(&str, usize)> = Vec::new();
        for (idx, line) in self.lines.iter().enumerate() {
            match classify(line) {
                LineKind::Open(name) => stack.push((name, idx)),
                LineKind::Close => {
                    let matches = stack.len() == path.len()
                        && stack
                            .iter()
                            .zip(path)
                            .all(|((name, _), want)| name.eq_ignore_ascii_case(want));
                    let popped = stack.pop();
                    if matches {
                        if let Some((_, open)) = popped {
                            return Some(SectionSpan {
                                open,
                                end: idx,
                                depth: path.len(),
                            });
                        }
                    }
                }
                LineKind::Other => {}
            }
        }
        None
    }

    /// Returns the span of `path`, creating it (and any missing parents) if needed.
    fn ensure(&mut self, path: &[&str]) -> SectionSpan {
        if let Some(span) = self.find(path) {
            return span;
        }
        let (name, parents) = match path.split_last() {
            Some(split) => split,
            None => {
                return SectionSpan {
                    open: 0,
                    end: self.lines.len(),
                    depth: 0,
                };
            }
        };
        let insert_at = if parents.is_empty() {
            self.lines.len()
        } else {
            self.ensure(parents).end
        };
        let pad = indent(path.len() - 1);
        self.lines
            .insert(insert_at, format!("{}&END {}", pad, name.to_uppercase()));
        self.lines
            .insert(insert_at, format!("{}&{}", pad, name.to_uppercase()));
        SectionSpan {
            open: insert_at,
            end: insert_at + 1,
            depth: path.len(),
        }
    }

    /// Sets `KEYWORD value` directly inside the section at `path`.
    pub fn set_keyword(&mut self, path: &[&str], keyword: &str, value: &str) {
        let span = self.ensure(path);
        let replacement = format!("{}{} {}", indent(span.depth), keyword, value);

        let mut nested = 0usize;
        for idx in span.body() {
            match classify(&self.lines[idx]) {
                LineKind::Open(_) => nested += 1,
                LineKind::Close => nested = nested.saturating_sub(1),
                LineKind::Other if nested == 0 => {
                    let first = self.lines[idx].split_whitespace().next().unwrap_or("");
                    if first.eq_ignore_ascii_case(keyword) {
                        self.lines[idx] = replacement;
                        return;
                    }
                }
                LineKind::Other => {}
            }
        }
        self.lines.insert(span.end, replacement);
    }

    /// Rewrites the opening line of a section to carry `parameter`, e.g. `&FORCES ON`.
    pub fn set_section_parameter(&mut self, path: &[&str], parameter: &str) {
        let span = self.ensure(path);
        let name = path.last().copied().unwrap_or_default().to_uppercase();
        let pad = indent(span.depth.saturating_sub(1));
        self.lines[span.open] = format!("{}&{} {}", pad, name, parameter);
    }

    /// Replaces everything between the section's open and close lines.
    pub fn replace_body(&mut self, path: &[&str], body: &[String]) {
        let span = self.ensure(path);
        let pad = indent(span.depth);
        self.lines.splice(
            span.body(),
            body.iter().map(|line| format!("{}{}", pad, line)),
        );
    }

    pub fn keyword_value(&self, path: &[&str], keyword: &str) -> Option<String> {
        let span = self.find(path)?;
        let mut nested = 0usize;
        for idx in span.body() {
            match classify(&self.lines[idx]) {
                LineKind::Open(_) => nested += 1,
                LineKind::Close => nested = nested.saturating_sub(1),
                LineKind::Other if nested == 0 => {
                    let mut tokens = self.lines[idx].split_whitespace();
                    if tokens
                        .next()
                        .is_some_and(|first| first.eq_ignore_ascii_case(keyword))
                    {
                        return Some(tokens.collect::<Vec<_>>().join(" "));
                    }
                }
                LineKind::Other => {}
            }
        }
        None
    }

    pub fn has_section(&self, path: &[&str]) -> bool {
        self.find(path).is_some()
    }
}
