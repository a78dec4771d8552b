//! Product catalog extraction from page markup.
//!
//! The catalog is a JavaScript object literal opened by a fixed marker
//! (`const SD = {` by default): category keys mapping to arrays of records
//! shaped like `{ b: "Brand", n: "Name", p: 500, t: "tag", i: "icon", img: "path" }`.
//!
//! Two strategies, tried in order:
//!   1. strict: a small grammar over the whole literal. Every record must carry
//!      `b, n, p, t, i` in that order (plus an optional trailing `img`).
//!   2. lenient: a line scan that pulls fields out by key and tolerates missing
//!      `t`/`i`. Fragments without brand, name and price are skipped and counted.
//!
//! Strict output is preferred; the lenient scan only runs when strict fails.
//! When the literal's closing brace was found, the scan never reads past it.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

static CATEGORY_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^\s*['"]?([A-Za-z_$][\w$]*)['"]?\s*:\s*\["#).unwrap());
static BRAND_KEY_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bb\s*:").unwrap());
static BRAND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bb\s*:\s*"([^"]*)""#).unwrap());
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bn\s*:\s*"([^"]*)""#).unwrap());
static PRICE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\bp\s*:\s*(\d+)").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bt\s*:\s*"([^"]*)""#).unwrap());
static ICON_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bi\s*:\s*"([^"]*)""#).unwrap());
static IMG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"\bimg\s*:\s*"([^"]*)""#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub category: Option<String>,
    pub brand: String,
    pub name: String,
    pub price: u64,
    pub tag: String,
    pub icon: String,
    pub existing_image: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    pub marker: String,
    /// Category keys to keep. Empty keeps every key.
    pub categories: Vec<String>,
}

impl ExtractOptions {
    fn accepts(&self, category: &str) -> bool {
        self.categories.is_empty() || self.categories.iter().any(|c| c == category)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Strict,
    Lenient,
    NotFound,
}

#[derive(Debug, Clone)]
pub struct Extraction {
    pub products: Vec<ProductRecord>,
    /// Record fragments the lenient scan could not read.
    pub skipped: usize,
    pub strategy: Strategy,
    /// Byte span of the literal's body, between its outer braces.
    pub span: Option<Range<usize>>,
}

impl Extraction {
    fn not_found() -> Self {
        Extraction {
            products: Vec::new(),
            skipped: 0,
            strategy: Strategy::NotFound,
            span: None,
        }
    }

    pub fn found(&self) -> bool {
        self.strategy != Strategy::NotFound
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StrictError {
    #[error("expected {expected} at offset {offset}")]
    Syntax { offset: usize, expected: &'static str },
    #[error("record at offset {offset} does not have the b/n/p/t/i shape")]
    Shape { offset: usize },
    #[error("catalog literal holds no records")]
    Empty,
}

/// Run strict, then lenient. A missing marker is an empty result, not an error.
pub fn extract(markup: &str, opts: &ExtractOptions) -> Extraction {
    if opts.marker.is_empty() || !markup.contains(&opts.marker) {
        warn!(marker = %opts.marker, "catalog marker not found");
        return Extraction::not_found();
    }

    let span = locate(markup, &opts.marker);
    match &span {
        Some(span) => match parse_strict(&markup[span.clone()], opts) {
            Ok(products) => {
                info!(count = products.len(), "catalog parsed (strict)");
                return Extraction {
                    products,
                    skipped: 0,
                    strategy: Strategy::Strict,
                    span: Some(span.clone()),
                };
            }
            Err(e) => debug!(error = %e, "strict parse failed, scanning lines"),
        },
        None => debug!("catalog literal is not closed, scanning lines"),
    }

    let scanned = match &span {
        Some(span) => catalog_window(markup, &opts.marker, span),
        None => markup,
    };
    let (products, skipped) = scan_lenient(scanned, opts);
    info!(count = products.len(), skipped, "catalog scanned (lenient)");
    Extraction {
        products,
        skipped,
        strategy: Strategy::Lenient,
        span,
    }
}

/// Lines holding the literal, cut at its closing brace.
fn catalog_window<'a>(markup: &'a str, marker: &str, span: &Range<usize>) -> &'a str {
    let at = markup.find(marker).unwrap_or(0);
    let line_start = markup[..at].rfind('\n').map_or(0, |n| n + 1);
    &markup[line_start..span.end]
}

/// Byte range between the literal's opening brace (the one ending `marker`,
/// or the first after it) and its matching closing brace. Braces inside
/// strings and `//` or `/* */` comments do not count.
pub fn locate(markup: &str, marker: &str) -> Option<Range<usize>> {
    let at = markup.find(marker)?;
    let after_marker = at + marker.len();
    let open = if marker.ends_with('{') {
        after_marker - 1
    } else {
        after_marker + markup[after_marker..].find('{')?
    };

    let bytes = markup.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = open;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'/' if bytes.get(i + 1) == Some(&b'/') => {
                    i = markup[i..].find('\n').map_or(bytes.len(), |n| i + n);
                    continue;
                }
                b'/' if bytes.get(i + 1) == Some(&b'*') => {
                    i = markup[i + 2..].find("*/").map_or(bytes.len(), |n| i + n + 4);
                    continue;
                }
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(open + 1..i);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    None
}

// ── Strict grammar ──

enum Value<'a> {
    Str(&'a str),
    Int(Option<u64>),
}

struct Field<'a> {
    key: &'a str,
    value: Value<'a>,
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

/// Parse the literal body (the text between its outer braces).
pub fn parse_strict(literal: &str, opts: &ExtractOptions) -> Result<Vec<ProductRecord>, StrictError> {
    let mut p = Parser { src: literal, pos: 0 };
    let mut products = Vec::new();

    p.skip_ws();
    while !p.at_end() {
        let category = p.key()?;
        p.skip_ws();
        p.expect(b':', "':' after category key")?;
        p.skip_ws();
        p.expect(b'[', "'[' opening category array")?;

        let keep = opts.accepts(category);
        loop {
            p.skip_ws();
            if p.eat(b']') {
                break;
            }
            let offset = p.pos;
            let fields = p.record()?;
            if keep {
                let record = conform(category, &fields).ok_or(StrictError::Shape { offset })?;
                products.push(record);
            }
            p.skip_ws();
            if !p.eat(b',') {
                p.skip_ws();
                p.expect(b']', "',' or ']' after record")?;
                break;
            }
        }

        p.skip_ws();
        if !p.eat(b',') {
            break;
        }
        p.skip_ws();
    }

    p.skip_ws();
    if !p.at_end() {
        return Err(p.error("end of catalog literal"));
    }
    if products.is_empty() {
        return Err(StrictError::Empty);
    }
    Ok(products)
}

fn conform(category: &str, fields: &[Field<'_>]) -> Option<ProductRecord> {
    let keys: Vec<&str> = fields.iter().map(|f| f.key).collect();
    let has_img = match keys.as_slice() {
        ["b", "n", "p", "t", "i"] => false,
        ["b", "n", "p", "t", "i", "img"] => true,
        _ => return None,
    };
    let text = |idx: usize| match fields[idx].value {
        Value::Str(s) => Some(s.to_string()),
        Value::Int(_) => None,
    };
    let price = match fields[2].value {
        Value::Int(Some(n)) => n,
        _ => return None,
    };
    Some(ProductRecord {
        category: Some(category.to_string()),
        brand: text(0)?,
        name: text(1)?,
        price,
        tag: text(3)?,
        icon: text(4)?,
        existing_image: if has_img { Some(text(5)?) } else { None },
    })
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn error(&self, expected: &'static str) -> StrictError {
        StrictError::Syntax {
            offset: self.pos,
            expected,
        }
    }

    fn eat(&mut self, b: u8) -> bool {
        if self.peek() == Some(b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, b: u8, expected: &'static str) -> Result<(), StrictError> {
        if self.eat(b) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    /// Whitespace plus `//` and `/* */` comments.
    fn skip_ws(&mut self) {
        loop {
            let rest = self.rest();
            let trimmed = rest.trim_start();
            self.pos += rest.len() - trimmed.len();
            if trimmed.starts_with("//") {
                self.pos += trimmed.find('\n').unwrap_or(trimmed.len());
            } else if let Some(body) = trimmed.strip_prefix("/*") {
                self.pos += body.find("*/").map(|end| end + 4).unwrap_or(trimmed.len());
            } else {
                return;
            }
        }
    }

    fn ident(&mut self) -> Result<&'a str, StrictError> {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            let ok = b.is_ascii_alphabetic()
                || b == b'_'
                || b == b'$'
                || (self.pos > start && b.is_ascii_digit());
            if !ok {
                break;
            }
            self.pos += 1;
        }
        if self.pos == start {
            Err(self.error("identifier"))
        } else {
            Ok(&self.src[start..self.pos])
        }
    }

    fn key(&mut self) -> Result<&'a str, StrictError> {
        match self.peek() {
            Some(q @ (b'\'' | b'"')) => {
                self.pos += 1;
                let key = self.ident()?;
                self.expect(q, "closing quote on category key")?;
                Ok(key)
            }
            _ => self.ident(),
        }
    }

    fn string(&mut self) -> Result<&'a str, StrictError> {
        self.expect(b'"', "string")?;
        let len = self.rest().find('"').ok_or_else(|| self.error("closing '\"'"))?;
        let s = &self.src[self.pos..self.pos + len];
        self.pos += len + 1;
        Ok(s)
    }

    fn integer(&mut self) -> Result<Option<u64>, StrictError> {
        let digits = self.rest().bytes().take_while(u8::is_ascii_digit).count();
        if digits == 0 {
            return Err(self.error("string or integer value"));
        }
        let n = self.src[self.pos..self.pos + digits].parse().ok();
        self.pos += digits;
        Ok(n)
    }

    fn record(&mut self) -> Result<Vec<Field<'a>>, StrictError> {
        self.expect(b'{', "'{' opening record")?;
        let mut fields = Vec::new();
        loop {
            self.skip_ws();
            if self.eat(b'}') {
                return Ok(fields);
            }
            let key = self.ident()?;
            self.skip_ws();
            self.expect(b':', "':' after field name")?;
            self.skip_ws();
            let value = if self.peek() == Some(b'"') {
                Value::Str(self.string()?)
            } else {
                Value::Int(self.integer()?)
            };
            fields.push(Field { key, value });
            self.skip_ws();
            if !self.eat(b',') {
                self.skip_ws();
                self.expect(b'}', "',' or '}' in record")?;
                return Ok(fields);
            }
        }
    }
}

// ── Lenient line scan ──

/// Returns the records found plus the number of unreadable fragments.
pub fn scan_lenient(markup: &str, opts: &ExtractOptions) -> (Vec<ProductRecord>, usize) {
    let mut products = Vec::new();
    let mut skipped = 0;
    let mut in_block = false;
    let mut category: Option<String> = None;

    for line in markup.lines() {
        let mut rest = line;
        if !in_block {
            match line.find(&opts.marker) {
                Some(at) if !opts.marker.is_empty() => {
                    in_block = true;
                    rest = &line[at + opts.marker.len()..];
                }
                _ => continue,
            }
        } else if line.trim_start().starts_with("};") {
            break;
        }

        if let Some(caps) = CATEGORY_LINE_RE.captures(rest) {
            category = Some(caps[1].to_string());
            rest = &rest[caps.get(0).map(|m| m.end()).unwrap_or(0)..];
        }

        if !rest.contains('{') || !BRAND_KEY_RE.is_match(rest) {
            continue;
        }
        if let Some(cat) = &category {
            if !opts.accepts(cat) {
                continue;
            }
        }

        let mut fragments: Vec<&str> = record_fragments(rest)
            .into_iter()
            .filter(|f| BRAND_KEY_RE.is_match(f))
            .collect();
        if fragments.is_empty() {
            // record split across lines: read what this line has
            fragments.push(rest);
        }

        for fragment in fragments {
            match read_fragment(fragment, category.as_deref()) {
                Some(record) => products.push(record),
                None => {
                    debug!(fragment, "skipping unreadable record");
                    skipped += 1;
                }
            }
        }
    }

    (products, skipped)
}

/// Balanced `{...}` segments of `line`. Braces inside quoted strings are text.
fn record_fragments(line: &str) -> Vec<&str> {
    let bytes = line.as_bytes();
    let mut fragments = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut quote: Option<u8> = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => match b {
                b'"' | b'\'' | b'`' => quote = Some(b),
                b'{' => {
                    if depth == 0 {
                        start = i;
                    }
                    depth += 1;
                }
                b'}' if depth > 0 => {
                    depth -= 1;
                    if depth == 0 {
                        fragments.push(&line[start..=i]);
                    }
                }
                _ => {}
            },
        }
        i += 1;
    }
    fragments
}

fn read_fragment(fragment: &str, category: Option<&str>) -> Option<ProductRecord> {
    let capture = |re: &Regex| re.captures(fragment).map(|c| c[1].to_string());
    let brand = capture(&BRAND_RE)?;
    let name = capture(&NAME_RE)?;
    let price = capture(&PRICE_RE)?.parse().ok()?;
    Some(ProductRecord {
        category: category.map(str::to_string),
        brand,
        name,
        price,
        tag: capture(&TAG_RE).unwrap_or_default(),
        icon: capture(&ICON_RE).unwrap_or_default(),
        existing_image: capture(&IMG_RE),
    })
}

// ── Tests ──
