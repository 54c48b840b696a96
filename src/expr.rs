//! Filter expression grammar.
//!
//! Each column type reads its filter input differently:
//! - `string`: `john` (case-insensitive substring), `!john` (does not contain)
//! - `number` / `date`: whitespace separated range terms such as `>=10`,
//!   `<5`, `=3`, `10..20`, `-7..0`. For dates the operands are day offsets
//!   from the start of today.
//! - `bool` / `unique`: a tri-state flag, where the empty expression turns
//!   the filter off.
//!
//! Parsing never fails. Input that does not fit the grammar falls back to a
//! defined behaviour, see [`RangeFilter::matches`].

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// A filter expression as entered by the user.
///
/// Text inputs produce `Text`; checkbox inputs produce `Flag`. The empty
/// text is the "don't filter" sentinel for every column type. Numbers read
/// as their text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFilterValue {
    Flag(bool),
    Text(String),
    Number(serde_json::Number),
}

impl<'de> Deserialize<'de> for FilterValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawFilterValue::deserialize(deserializer)? {
            RawFilterValue::Flag(flag) => FilterValue::Flag(flag),
            RawFilterValue::Text(text) => FilterValue::Text(text),
            RawFilterValue::Number(n) => FilterValue::Text(n.to_string()),
        })
    }
}

impl FilterValue {
    pub fn text(expression: impl Into<String>) -> Self {
        FilterValue::Text(expression.into())
    }

    /// The empty-text sentinel that removes a column's constraint.
    pub fn is_blank(&self) -> bool {
        matches!(self, FilterValue::Text(text) if text.is_empty())
    }

    /// Text form of the expression, as the string filters read it.
    pub fn as_text(&self) -> String {
        match self {
            FilterValue::Text(text) => text.clone(),
            FilterValue::Flag(flag) => flag.to_string(),
        }
    }

    /// Tri-state reading used by `bool` and `unique` filters.
    ///
    /// `None` means the filter is off. Text is coerced explicitly:
    /// `"false"` and `"0"` read as false, any other non-empty text as true.
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FilterValue::Flag(flag) => Some(*flag),
            FilterValue::Text(text) if text.is_empty() => None,
            FilterValue::Text(text) => {
                let text = text.trim();
                Some(!(text.eq_ignore_ascii_case("false") || text == "0"))
            }
        }
    }
}

impl Default for FilterValue {
    fn default() -> Self {
        FilterValue::Text(String::new())
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Text(v.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Text(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Flag(v)
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_text())
    }
}

// ============================================================================
// String filters
// ============================================================================

/// The matched part of a cell, split for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Highlight {
    pub pre: String,
    pub matched: String,
    pub post: String,
}

/// Result of testing a string filter against a cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StringMatch {
    Rejected,
    Accepted,
    /// Accepted by a positive match; carries where the needle was found.
    Found(Highlight),
}

impl StringMatch {
    pub fn accepted(&self) -> bool {
        !matches!(self, StringMatch::Rejected)
    }
}

/// Parsed `string` column filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringFilter {
    needle: String,
    negated: bool,
    blank: bool,
}

impl StringFilter {
    pub fn parse(expression: &str) -> Self {
        let negated = expression.starts_with('!');
        let needle = if negated { &expression[1..] } else { expression };
        StringFilter {
            needle: needle.to_string(),
            negated,
            blank: expression.is_empty(),
        }
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Test a cell. `cell` is the stringified value, `None` when absent.
    ///
    /// Absent cells read as the empty string: they never satisfy a positive
    /// match and always satisfy a negated one with a non-empty needle.
    pub fn matches(&self, cell: Option<&str>) -> StringMatch {
        if self.blank {
            return StringMatch::Accepted;
        }
        let haystack = cell.unwrap_or("");
        let found = find_ignore_case(haystack, &self.needle);

        match (found, self.negated) {
            (None, true) => StringMatch::Accepted,
            (Some((start, end)), false) if cell.is_some() => StringMatch::Found(Highlight {
                pre: haystack[..start].to_string(),
                matched: haystack[start..end].to_string(),
                post: haystack[end..].to_string(),
            }),
            _ => StringMatch::Rejected,
        }
    }
}

/// Case-insensitive substring search. Returns the byte range in `haystack`
/// of the first match. The empty needle matches at 0.
///
/// Both sides are lowercased char by char; a match that starts or ends inside
/// a multi-char expansion (`İ` lowers to `i̇`) covers the whole source char.
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<(usize, usize)> {
    if needle.is_empty() {
        return Some((0, 0));
    }
    let needle: String = needle.chars().flat_map(char::to_lowercase).collect();

    let mut lowered = String::with_capacity(haystack.len());
    // source span in `haystack` for every byte of `lowered`
    let mut spans = Vec::with_capacity(haystack.len());
    for (start, c) in haystack.char_indices() {
        let span = (start, start + c.len_utf8());
        for lower in c.to_lowercase() {
            lowered.push(lower);
            spans.extend(std::iter::repeat(span).take(lower.len_utf8()));
        }
    }

    let at = lowered.find(&needle)?;
    let (start, _) = spans[at];
    let (_, end) = spans[at + needle.len() - 1];
    Some((start, end))
}

// ============================================================================
// Range filters (number / date)
// ============================================================================

/// Range operators, in the order they are looked for in a term.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    Ge,      // >=
    Le,      // <=
    Between, // ..
    Gt,      // >
    Lt,      // <
    Eq,      // =
}

impl RangeOp {
    pub const PRIORITY: [RangeOp; 6] = [
        RangeOp::Ge,
        RangeOp::Le,
        RangeOp::Between,
        RangeOp::Gt,
        RangeOp::Lt,
        RangeOp::Eq,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            RangeOp::Ge => ">=",
            RangeOp::Le => "<=",
            RangeOp::Between => "..",
            RangeOp::Gt => ">",
            RangeOp::Lt => "<",
            RangeOp::Eq => "=",
        }
    }

    /// Compare `value` against the bounds. Only `Between` uses `lower`.
    /// `half_open` makes the upper bound of `Between` exclusive.
    fn holds(&self, value: f64, lower: f64, upper: f64, half_open: bool) -> bool {
        match self {
            RangeOp::Ge => value >= upper,
            RangeOp::Le => value <= upper,
            RangeOp::Gt => value > upper,
            RangeOp::Lt => value < upper,
            RangeOp::Eq => value == upper,
            RangeOp::Between if half_open => value >= lower && value < upper,
            RangeOp::Between => value >= lower && value <= upper,
        }
    }
}

/// One whitespace separated term of a range expression.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeTerm {
    /// `None` when the term contains no operator.
    pub op: Option<RangeOp>,
    /// Left operand; −∞ when missing or not a number.
    pub lower: f64,
    /// Right operand; +∞ when missing or not a number.
    pub upper: f64,
    /// Both operand strings were empty, e.g. a lone `=`.
    pub bare: bool,
}

impl RangeTerm {
    pub fn parse(term: &str) -> Self {
        for op in RangeOp::PRIORITY {
            let Some(pos) = term.find(op.symbol()) else {
                continue;
            };
            let left = &term[..pos];
            let right = &term[pos + op.symbol().len()..];
            return RangeTerm {
                op: Some(op),
                lower: parse_float_prefix(left).unwrap_or(f64::NEG_INFINITY),
                upper: parse_float_prefix(right).unwrap_or(f64::INFINITY),
                bare: left.is_empty() && right.is_empty(),
            };
        }

        RangeTerm {
            op: None,
            lower: f64::NEG_INFINITY,
            upper: f64::INFINITY,
            bare: false,
        }
    }
}

/// Parsed `number` / `date` column filter.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeFilter {
    terms: Vec<RangeTerm>,
    blank: bool,
}

impl RangeFilter {
    pub fn parse(expression: &str) -> Self {
        RangeFilter {
            terms: expression.split_whitespace().map(RangeTerm::parse).collect(),
            blank: expression.is_empty(),
        }
    }

    pub fn terms(&self) -> &[RangeTerm] {
        &self.terms
    }

    /// Test a numeric cell value (`None` when absent or not numeric).
    ///
    /// With `day_start` set (epoch ms of the start of today) the operands are
    /// day offsets and `..` excludes its upper bound; otherwise operands are
    /// plain numbers and `..` is inclusive on both ends.
    ///
    /// A row passes when every term holds. Expressions that do not fit the
    /// grammar pass permissively: a single term without an operator or
    /// without operands (`abc`, `=`) accepts every row, as does any
    /// expression whose last operator-bearing term was bare once at least one
    /// term matched. A whitespace-only expression has no terms and accepts
    /// every row.
    pub fn matches(&self, value: Option<f64>, day_start: Option<f64>) -> bool {
        if self.blank {
            return true;
        }

        let mut matched = 0;
        let mut malformed = true;

        for term in &self.terms {
            let Some(op) = term.op else {
                continue;
            };
            malformed = term.bare;

            let (lower, upper) = match day_start {
                Some(start) => (
                    start + term.lower * crate::clock::DAY_MS,
                    start + term.upper * crate::clock::DAY_MS,
                ),
                None => (term.lower, term.upper),
            };

            if let Some(v) = value {
                if op.holds(v, lower, upper, day_start.is_some()) {
                    matched += 1;
                }
            }
        }

        (self.terms.len() == 1 && malformed)
            || (matched > 0 && malformed)
            || matched == self.terms.len()
    }
}

/// Scanner for the numeric prefix of an operand, the way `parseFloat` reads it:
/// leading whitespace, optional sign, digits with an optional fraction and
/// exponent, or `Infinity`. Trailing garbage is ignored.
struct OperandScanner {
    input: Vec<char>,
    pos: usize,
}

impl OperandScanner {
    fn new(input: &str) -> Self {
        OperandScanner {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        self.pos += 1;
        c
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_digits(&mut self, out: &mut String) -> usize {
        let mut count = 0;
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                out.push(c);
                self.advance();
                count += 1;
            } else {
                break;
            }
        }
        count
    }

    fn read_number(&mut self) -> Option<f64> {
        self.skip_whitespace();
        let mut num_str = String::new();

        if let Some(sign @ ('+' | '-')) = self.peek() {
            num_str.push(sign);
            self.advance();
        }

        let rest: String = self.input[self.pos.min(self.input.len())..].iter().collect();
        if rest.starts_with("Infinity") {
            return if num_str == "-" { Some(f64::NEG_INFINITY) } else { Some(f64::INFINITY) };
        }

        let mut digits = self.read_digits(&mut num_str);
        if self.peek() == Some('.') {
            let save = self.pos;
            let mut fraction = String::from(".");
            self.advance();
            let fraction_digits = self.read_digits(&mut fraction);
            if fraction_digits > 0 || digits > 0 {
                num_str.push_str(&fraction);
                digits += fraction_digits;
            } else {
                self.pos = save;
            }
        }
        if digits == 0 {
            return None;
        }

        if let Some('e' | 'E') = self.peek() {
            let save = self.pos;
            let mut exponent = String::from("e");
            self.advance();
            if let Some(sign @ ('+' | '-')) = self.peek() {
                exponent.push(sign);
                self.advance();
            }
            if self.read_digits(&mut exponent) > 0 {
                num_str.push_str(&exponent);
            } else {
                self.pos = save;
            }
        }

        // "5." is a valid prefix but not a valid Rust float literal
        num_str.trim_end_matches('.').parse().ok()
    }
}

/// Parse the longest numeric prefix of `s`, `None` when there is none.
pub fn parse_float_prefix(s: &str) -> Option<f64> {
    OperandScanner::new(s).read_number()
}
