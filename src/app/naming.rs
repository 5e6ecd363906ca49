//! Line item name templates.
//!
//! Templates use `{field}` or `{field:format}` placeholders, with `{{` / `}}` for
//! literal braces. Fields: `bidder_code`, `price`. The optional format is
//! `[[fill]align][width]` with `<`, `>` or `^` alignment, so
//! `{price:0>5}` renders `0.10` as `00.10`.

pub const DEFAULT_LINE_ITEM_NAME_FORMAT: &str = "{bidder_code}: HB ${price}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    BidderCode,
    Price,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pad {
    fill: char,
    align: Align,
    width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field, Option<Pad>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl Default for NameTemplate {
    fn default() -> Self {
        Self {
            source: DEFAULT_LINE_ITEM_NAME_FORMAT.to_string(),
            segments: vec![
                Segment::Field(Field::BidderCode, None),
                Segment::Literal(": HB $".to_string()),
                Segment::Field(Field::Price, None),
            ],
        }
    }
}

impl NameTemplate {
    pub fn parse(source: &str) -> Result<Self, String> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut inner = String::new();
                    let mut closed = false;
                    for c in chars.by_ref() {
                        if c == '}' {
                            closed = true;
                            break;
                        }
                        inner.push(c);
                    }
                    if !closed {
                        return Err(format!("unclosed '{{' in name format '{source}'"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(parse_placeholder(&inner)?);
                }
                '}' => return Err(format!("single '}}' in name format '{source}'")),
                _ => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn render(&self, bidder_code: &str, price: &str) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field, pad) => {
                    let value = match field {
                        Field::BidderCode => bidder_code,
                        Field::Price => price,
                    };
                    match pad {
                        Some(pad) => push_padded(&mut out, value, *pad),
                        None => out.push_str(value),
                    }
                }
            }
        }
        out
    }
}

fn parse_placeholder(inner: &str) -> Result<Segment, String> {
    let (name, spec) = match inner.split_once(':') {
        Some((name, spec)) => (name.trim(), Some(spec)),
        None => (inner.trim(), None),
    };
    let field = match name {
        "bidder_code" => Field::BidderCode,
        "price" => Field::Price,
        other => {
            return Err(format!(
                "unknown placeholder '{{{other}}}' (expected {{bidder_code}} or {{price}})"
            ));
        }
    };
    let pad = match spec {
        Some(spec) if !spec.is_empty() => Some(parse_pad(spec)?),
        _ => None,
    };
    Ok(Segment::Field(field, pad))
}

fn parse_pad(spec: &str) -> Result<Pad, String> {
    let chars: Vec<char> = spec.chars().collect();
    let align_of = |c: char| match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        _ => None,
    };

    let (fill, align, rest) = match (chars.first(), chars.get(1)) {
        (Some(&fill), Some(&a)) if align_of(a).is_some() => (fill, align_of(a), &chars[2..]),
        (Some(&a), _) if align_of(a).is_some() => (' ', align_of(a), &chars[1..]),
        _ => (' ', None, &chars[..]),
    };

    let digits: String = rest.iter().collect();
    let width = if digits.is_empty() {
        0
    } else {
        digits
            .parse::<usize>()
            .map_err(|_| format!("invalid format spec ':{spec}' (expected [[fill]align][width])"))?
    };

    Ok(Pad {
        fill,
        align: align.unwrap_or(Align::Left),
        width,
    })
}

fn push_padded(out: &mut String, value: &str, pad: Pad) {
    let len = value.chars().count();
    let missing = pad.width.saturating_sub(len);
    let (left, right) = match pad.align {
        Align::Left => (0, missing),
        Align::Right => (missing, 0),
        Align::Center => (missing / 2, missing - missing / 2),
    };
    out.extend(std::iter::repeat_n(pad.fill, left));
    out.push_str(value);
    out.extend(std::iter::repeat_n(pad.fill, right));
}
