//! Schema engine shared by the parameter-file codecs.
//!
//! A document type lists its on-disk layout once, as a slice of
//! [`SchemaEntry`] descriptors. [`read_document`] and [`render_document`]
//! both walk that slice, so line order cannot drift between load and save.

use super::aberration::{Aberration, AberrationTable};
use super::line::{Token, parse_float_token, parse_int_token, split_prm_line};
use crate::domain::{DocumentResult, DrProbeError};
use crate::serialization::format_fixed;

/// Decimal digits written for aberration coefficients.
pub(crate) const ABERRATION_PRECISION: usize = 4;

/// Placeholder for values that cannot be written back losslessly.
pub(crate) const RENDER_PLACEHOLDER: &str = "SAVE.PRM_VALUE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScalarKind {
    Int,
    Float,
    Text,
}

impl ScalarKind {
    const fn describe(self) -> &'static str {
        match self {
            Self::Int => "an integer",
            Self::Float => "a number",
            Self::Text => "a string",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    Scalar(ScalarKind),
    Tuple(&'static [ScalarKind]),
    /// One float, or three floats. Any other arity decodes to `0.0`.
    FloatOrTriple,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    fn encode(&self) -> Result<String, String> {
        match self {
            Self::Int(value) => Ok(value.to_string()),
            Self::Float(value) => Ok(format_float(*value)),
            Self::Text(value) => quote_text(value),
        }
    }
}

/// Single quotes unless the text holds one, then double quotes. Text holding
/// both, or a line break, has no on-disk form.
fn quote_text(value: &str) -> Result<String, String> {
    if value.contains(['\n', '\r']) {
        return Err(format!("text {:?} contains a line break", value));
    }
    match (value.contains('\''), value.contains('"')) {
        (false, _) => Ok(format!("'{}'", value)),
        (true, false) => Ok(format!("\"{}\"", value)),
        (true, true) => Err(format!("text {:?} contains both quote characters", value)),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Value {
    Scalar(Scalar),
    Tuple(Vec<Scalar>),
}

impl Value {
    pub(crate) fn int(value: impl Into<i64>) -> Self {
        Self::Scalar(Scalar::Int(value.into()))
    }

    pub(crate) fn count(value: usize) -> Self {
        Self::Scalar(Scalar::Int(value as i64))
    }

    pub(crate) fn float(value: f64) -> Self {
        Self::Scalar(Scalar::Float(value))
    }

    pub(crate) fn text(value: &str) -> Self {
        Self::Scalar(Scalar::Text(value.to_string()))
    }

    fn encode(&self) -> Result<String, String> {
        match self {
            Self::Scalar(scalar) => scalar.encode(),
            Self::Tuple(items) => Ok(items
                .iter()
                .map(Scalar::encode)
                .collect::<Result<Vec<_>, _>>()?
                .join(", ")),
        }
    }

    pub(crate) fn into_scalar(self) -> Result<Scalar, String> {
        match self {
            Self::Scalar(scalar) => Ok(scalar),
            Self::Tuple(items) => Err(format!("expected one value, got {}", items.len())),
        }
    }

    pub(crate) fn into_tuple<const N: usize>(self) -> Result<[Scalar; N], String> {
        match self {
            Self::Tuple(items) => {
                let arity = items.len();
                items
                    .try_into()
                    .map_err(|_| format!("expected {} values, got {}", N, arity))
            }
            Self::Scalar(_) => Err(format!("expected {} values, got 1", N)),
        }
    }

    pub(crate) fn into_f64(self) -> Result<f64, String> {
        self.into_scalar()?.as_f64()
    }

    pub(crate) fn into_i32(self) -> Result<i32, String> {
        self.into_scalar()?.as_i32()
    }

    pub(crate) fn into_usize(self) -> Result<usize, String> {
        self.into_scalar()?.as_usize()
    }

    pub(crate) fn into_string(self) -> Result<String, String> {
        self.into_scalar()?.into_text()
    }

    pub(crate) fn pair(first: Scalar, second: Scalar) -> Self {
        Self::Tuple(vec![first, second])
    }

    pub(crate) fn floats(values: &[f64]) -> Self {
        Self::Tuple(values.iter().copied().map(Scalar::Float).collect())
    }
}

impl Scalar {
    pub(crate) fn as_f64(&self) -> Result<f64, String> {
        match self {
            Self::Float(value) => Ok(*value),
            Self::Int(value) => Ok(*value as f64),
            Self::Text(value) => Err(format!("expected a number, got '{}'", value)),
        }
    }

    pub(crate) fn as_i32(&self) -> Result<i32, String> {
        match self {
            Self::Int(value) => {
                i32::try_from(*value).map_err(|_| format!("integer {} is out of range", value))
            }
            other => Err(format!("expected an integer, got {:?}", other)),
        }
    }

    pub(crate) fn as_usize(&self) -> Result<usize, String> {
        match self {
            Self::Int(value) => usize::try_from(*value)
                .map_err(|_| format!("expected a non-negative integer, got {}", value)),
            other => Err(format!("expected an integer, got {:?}", other)),
        }
    }

    pub(crate) fn into_text(self) -> Result<String, String> {
        match self {
            Self::Text(value) => Ok(value),
            other => Err(format!("expected a string, got {:?}", other)),
        }
    }
}

/// Shortest representation that reads back to the same `f64`, always with a
/// decimal point or exponent so the value is visibly real-valued.
pub(crate) fn format_float(value: f64) -> String {
    format!("{:?}", value)
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct FieldSpec<K> {
    pub(crate) key: K,
    pub(crate) name: &'static str,
    pub(crate) shape: Shape,
    pub(crate) comment: &'static str,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum SchemaEntry<K: 'static> {
    /// Written verbatim. On load the line must carry the same words, in any case.
    Literal(&'static str),
    Field(FieldSpec<K>),
    /// Count line followed by one line per table entry.
    Aberrations { comment: &'static str },
    /// One slice id per line; length and bound come from the document.
    SliceSequence,
}

pub(crate) const SLICE_ID_COMMENT: &str = "Slice ID";

pub(crate) trait SchemaDocument: Default {
    type Key: Copy + 'static;

    /// Error placeholder used for every load failure of this document type.
    const PARSE_PLACEHOLDER: &'static str;

    fn schema() -> &'static [SchemaEntry<Self::Key>];

    fn value(&self, key: Self::Key) -> Value;

    fn assign(&mut self, key: Self::Key, value: Value) -> Result<(), String>;

    fn aberrations(&self) -> &AberrationTable;

    fn aberrations_mut(&mut self) -> &mut AberrationTable;

    /// `(total, available)` slice bookkeeping for documents carrying a slice sequence.
    fn slice_bounds(&self) -> Option<(usize, usize)> {
        None
    }

    fn store_slice_ids(&mut self, _ids: Vec<usize>) {}

    /// Whether non-blank lines may follow the last schema entry.
    fn allows_trailing_lines(&self) -> bool {
        false
    }
}

struct LineCursor<'a> {
    lines: Vec<&'a str>,
    position: usize,
    placeholder: &'static str,
}

impl<'a> LineCursor<'a> {
    fn new(source: &'a str, placeholder: &'static str) -> Self {
        Self {
            lines: source.lines().collect(),
            position: 0,
            placeholder,
        }
    }

    /// Returns the 1-based line number and the line text.
    fn next(&mut self, expected: &str) -> DocumentResult<(usize, &'a str)> {
        let line = self.lines.get(self.position).copied().ok_or_else(|| {
            DrProbeError::malformed_document(
                self.placeholder,
                format!(
                    "line {}: missing line for {} (document has {} lines)",
                    self.position + 1,
                    expected,
                    self.lines.len()
                ),
            )
        })?;
        self.position += 1;
        Ok((self.position, line))
    }

    /// Unread lines with their 1-based line numbers.
    fn remaining(&self) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        let start = self.position;
        self.lines[start..]
            .iter()
            .enumerate()
            .map(move |(offset, line)| (start + offset + 1, *line))
    }

    fn error(&self, line_number: usize, message: impl AsRef<str>) -> DrProbeError {
        DrProbeError::malformed_document(
            self.placeholder,
            format!("line {}: {}", line_number, message.as_ref()),
        )
    }
}

pub(crate) fn read_document<D: SchemaDocument>(source: &str) -> DocumentResult<D> {
    let mut document = D::default();
    let mut cursor = LineCursor::new(source, D::PARSE_PLACEHOLDER);

    for entry in D::schema() {
        match entry {
            SchemaEntry::Literal(text) => {
                let (line_number, line) = cursor.next(text)?;
                if !literal_matches(line, text) {
                    return Err(cursor.error(
                        line_number,
                        format!("expected {}, found '{}'", text, line.trim()),
                    ));
                }
            }
            SchemaEntry::Field(spec) => {
                let (line_number, line) = cursor.next(&format!("'{}'", spec.name))?;
                let field_error = |message: String| {
                    cursor.error(line_number, format!("'{}': {}", spec.name, message))
                };
                let tokens = split_prm_line(line).tokens;
                let value = decode_value(spec.shape, &tokens).map_err(field_error)?;
                document.assign(spec.key, value).map_err(field_error)?;
            }
            SchemaEntry::Aberrations { .. } => read_aberrations(&mut cursor, &mut document)?,
            SchemaEntry::SliceSequence => read_slice_sequence(&mut cursor, &mut document)?,
        }
    }

    if !document.allows_trailing_lines() {
        let trailing = cursor.remaining().find(|(_, line)| !line.trim().is_empty());
        if let Some((line_number, line)) = trailing {
            return Err(cursor.error(
                line_number,
                format!("unexpected content after the last field: '{}'", line.trim()),
            ));
        }
    }

    Ok(document)
}

/// Section headers and the terminator compare by their words, ignoring case,
/// quoting and any comment.
fn literal_matches(line: &str, literal: &str) -> bool {
    let words = |text: &str| {
        split_prm_line(text)
            .tokens
            .into_iter()
            .map(|token| token.text)
            .collect::<Vec<_>>()
            .join(" ")
    };
    words(line).eq_ignore_ascii_case(&words(literal))
}

fn read_aberrations<D: SchemaDocument>(
    cursor: &mut LineCursor<'_>,
    document: &mut D,
) -> DocumentResult<()> {
    let (line_number, line) = cursor.next("the aberration count")?;
    let tokens = split_prm_line(line).tokens;
    let count = decode_scalar(ScalarKind::Int, tokens.first())
        .and_then(|scalar| scalar.as_usize())
        .map_err(|message| cursor.error(line_number, format!("aberration count: {}", message)))?;

    let mut table = AberrationTable::new();
    for ordinal in 0..count {
        let (line_number, line) =
            cursor.next(&format!("aberration {} of {}", ordinal + 1, count))?;
        let tokens = split_prm_line(line).tokens;
        let [index, first, second] = decode_value(
            Shape::Tuple(&[ScalarKind::Int, ScalarKind::Float, ScalarKind::Float]),
            &tokens,
        )
        .and_then(Value::into_tuple::<3>)
        .map_err(|message| cursor.error(line_number, format!("aberration: {}", message)))?;

        let index = index
            .as_usize()
            .map_err(|message| cursor.error(line_number, format!("aberration index: {}", message)))?;
        let aberration = Aberration::from_index(index).ok_or_else(|| {
            cursor.error(
                line_number,
                format!("aberration index {} is outside 0..=11", index),
            )
        })?;
        let coefficients = (
            first.as_f64().map_err(|message| cursor.error(line_number, message))?,
            second.as_f64().map_err(|message| cursor.error(line_number, message))?,
        );
        if table.set(aberration, coefficients).is_some() {
            return Err(cursor.error(
                line_number,
                format!("aberration '{}' is defined twice", aberration),
            ));
        }
    }

    *document.aberrations_mut() = table;
    Ok(())
}

fn read_slice_sequence<D: SchemaDocument>(
    cursor: &mut LineCursor<'_>,
    document: &mut D,
) -> DocumentResult<()> {
    let Some((total, available)) = document.slice_bounds() else {
        return Ok(());
    };

    // `total` comes from the file; the lines have to exist before anything is reserved.
    let mut ids = Vec::new();
    for ordinal in 0..total {
        let (line_number, line) =
            cursor.next(&format!("slice id {} of {}", ordinal + 1, total))?;
        let tokens = split_prm_line(line).tokens;
        let id = decode_scalar(ScalarKind::Int, tokens.first())
            .and_then(|scalar| scalar.as_usize())
            .map_err(|message| cursor.error(line_number, format!("slice id: {}", message)))?;
        if id >= available {
            return Err(cursor.error(
                line_number,
                format!(
                    "slice id {} is out of range for {} slice files",
                    id, available
                ),
            ));
        }
        ids.push(id);
    }

    document.store_slice_ids(ids);
    Ok(())
}

fn decode_value(shape: Shape, tokens: &[Token]) -> Result<Value, String> {
    match shape {
        Shape::Scalar(kind) => {
            if tokens.len() > 1 {
                return Err(format!("expected one value, found {}", tokens.len()));
            }
            decode_scalar(kind, tokens.first()).map(Value::Scalar)
        }
        Shape::Tuple(kinds) => {
            if tokens.len() != kinds.len() {
                return Err(format!(
                    "expected {} values, found {}",
                    kinds.len(),
                    tokens.len()
                ));
            }
            kinds
                .iter()
                .zip(tokens)
                .map(|(kind, token)| decode_scalar(*kind, Some(token)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple)
        }
        Shape::FloatOrTriple => match tokens.len() {
            1 => decode_scalar(ScalarKind::Float, tokens.first()).map(Value::Scalar),
            3 => tokens
                .iter()
                .map(|token| decode_scalar(ScalarKind::Float, Some(token)))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Tuple),
            _ => Ok(Value::float(0.0)),
        },
    }
}

fn decode_scalar(kind: ScalarKind, token: Option<&Token>) -> Result<Scalar, String> {
    let token = token.ok_or_else(|| format!("expected {}, found nothing", kind.describe()))?;
    let parsed = match kind {
        ScalarKind::Text => Some(Scalar::Text(token.text.clone())),
        ScalarKind::Int if !token.quoted => parse_int_token(&token.text).map(Scalar::Int),
        ScalarKind::Float if !token.quoted => parse_float_token(&token.text).map(Scalar::Float),
        _ => None,
    };
    parsed.ok_or_else(|| format!("expected {}, found '{}'", kind.describe(), token.text))
}

struct RenderedLine {
    values: String,
    comment: Option<String>,
}

impl RenderedLine {
    fn commented(values: String, comment: impl Into<String>) -> Self {
        Self {
            values,
            comment: Some(comment.into()),
        }
    }

    fn bare(values: impl Into<String>) -> Self {
        Self {
            values: values.into(),
            comment: None,
        }
    }
}

/// Renders the full document. `slice_ids` fills the slice-sequence block, if the schema has one.
pub(crate) fn render_document<D: SchemaDocument>(
    document: &D,
    slice_ids: &[usize],
) -> DocumentResult<String> {
    let mut lines = Vec::new();

    for entry in D::schema() {
        match entry {
            SchemaEntry::Literal(text) => lines.push(RenderedLine::bare(*text)),
            SchemaEntry::Field(spec) => {
                let values = document.value(spec.key).encode().map_err(|message| {
                    DrProbeError::malformed_document(
                        RENDER_PLACEHOLDER,
                        format!("'{}': {}", spec.name, message),
                    )
                })?;
                lines.push(RenderedLine::commented(values, spec.comment));
            }
            SchemaEntry::Aberrations { comment } => {
                let table = document.aberrations();
                lines.push(RenderedLine::commented(table.len().to_string(), *comment));
                for (aberration, (first, second)) in table.iter() {
                    lines.push(RenderedLine::commented(
                        format!(
                            "{} {} {}",
                            aberration.index(),
                            format_fixed(first, ABERRATION_PRECISION),
                            format_fixed(second, ABERRATION_PRECISION)
                        ),
                        aberration.label(),
                    ));
                }
            }
            SchemaEntry::SliceSequence => {
                for id in slice_ids {
                    lines.push(RenderedLine::commented(id.to_string(), SLICE_ID_COMMENT));
                }
            }
        }
    }

    Ok(align_comments(&lines))
}

/// Pads the value part of every commented line to the widest one so the `!` column lines up.
fn align_comments(lines: &[RenderedLine]) -> String {
    let width = lines
        .iter()
        .filter(|line| line.comment.is_some())
        .map(|line| line.values.chars().count())
        .max()
        .unwrap_or(0);

    let mut rendered = String::new();
    for line in lines {
        match &line.comment {
            Some(comment) => {
                rendered.push_str(&format!("{:<width$} ! {}", line.values, comment, width = width));
            }
            None => rendered.push_str(&line.values),
        }
        rendered.push('\n');
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::{
        RenderedLine, ScalarKind, Shape, Value, align_comments, decode_value, format_float,
        literal_matches, quote_text,
    };
    use crate::prm::line::split_prm_line;

    fn decode(shape: Shape, line: &str) -> Result<Value, String> {
        decode_value(shape, &split_prm_line(line).tokens)
    }

    #[test]
    fn float_formatting_keeps_value_and_marks_reals() {
        assert_eq!(format_float(30.0), "30.0");
        assert_eq!(format_float(0.00417571), "0.00417571");
        let tricky = 0.1 + 0.2;
        assert_eq!(format_float(tricky).parse::<f64>().expect("float"), tricky);
    }

    #[test]
    fn float_or_triple_distinguishes_by_token_count() {
        assert_eq!(
            decode(Shape::FloatOrTriple, "30.0 ! Semi angle of convergence [mrad]"),
            Ok(Value::float(30.0))
        );
        assert_eq!(
            decode(Shape::FloatOrTriple, "10.0, 20.0, 30.0 ! Semi angle"),
            Ok(Value::Tuple(vec![
                super::Scalar::Float(10.0),
                super::Scalar::Float(20.0),
                super::Scalar::Float(30.0)
            ]))
        );
        assert_eq!(
            decode(Shape::FloatOrTriple, "10.0, 20.0 ! two values"),
            Ok(Value::float(0.0))
        );
    }

    #[test]
    fn tuples_require_enough_tokens_of_the_right_kind() {
        let shape = Shape::Tuple(&[ScalarKind::Int, ScalarKind::Text]);
        assert!(decode(shape, "0, 'prm/msa_det.prm' ! Detector").is_ok());
        assert!(decode(shape, "0 ! Detector").is_err());
        assert!(decode(shape, "x, 'det.prm' ! Detector").is_err());
    }

    #[test]
    fn quoted_tokens_are_not_numbers() {
        assert!(decode(Shape::Scalar(ScalarKind::Int), "'5' ! number").is_err());
        assert_eq!(
            decode(Shape::Scalar(ScalarKind::Text), "slc/slices ! unquoted name"),
            Ok(Value::text("slc/slices"))
        );
    }

    #[test]
    fn comment_column_is_aligned_to_the_widest_value() {
        let rendered = align_comments(&[
            RenderedLine::bare("'[Header]'"),
            RenderedLine::commented("1".to_string(), "short"),
            RenderedLine::commented("10.0, 20.0".to_string(), "long"),
        ]);

        assert_eq!(
            rendered,
            "'[Header]'\n1          ! short\n10.0, 20.0 ! long\n"
        );
    }

    #[test]
    fn field_lines_reject_extra_values() {
        let error = decode(Shape::Scalar(ScalarKind::Float), "5 1000.0000 0.0000")
            .expect_err("extra values should be rejected");
        assert_eq!(error, "expected one value, found 3");

        let error = decode(
            Shape::Tuple(&[ScalarKind::Int, ScalarKind::Int]),
            "5, 1000.0000, 0.0000 ! position",
        )
        .expect_err("extra values should be rejected");
        assert_eq!(error, "expected 2 values, found 3");
    }

    #[test]
    fn literal_lines_compare_words_only() {
        assert!(literal_matches("'[Microscope Parameters]'", "'[Microscope Parameters]'"));
        assert!(literal_matches(
            "  \"[microscope parameters]\" ! header",
            "'[Microscope Parameters]'"
        ));
        assert!(literal_matches("End of parameter file.", "End of parameter file."));
        assert!(!literal_matches("3", "End of parameter file."));
        assert!(!literal_matches("'[Multislice Parameters]'", "'[Microscope Parameters]'"));
    }

    #[test]
    fn text_quoting_picks_the_quote_the_value_lacks() {
        assert_eq!(quote_text("img/xxx.dat"), Ok("'img/xxx.dat'".to_string()));
        assert_eq!(quote_text("img/o'brien.dat"), Ok("\"img/o'brien.dat\"".to_string()));
        assert_eq!(quote_text("say \"hi\""), Ok("'say \"hi\"'".to_string()));
        assert!(quote_text("it's \"both\"").is_err());
        assert!(quote_text("two\nlines").is_err());

        let line = format!("{} ! Output", quote_text("img/o'brien.dat").expect("quotable"));
        let tokens = split_prm_line(&line).tokens;
        assert_eq!(
            decode_value(Shape::Scalar(ScalarKind::Text), &tokens),
            Ok(Value::text("img/o'brien.dat"))
        );
    }
}
