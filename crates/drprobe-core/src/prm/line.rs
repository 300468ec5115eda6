//! Tokenizer for the `!`-annotated parameter-file lines.
//!
//! Values are separated by commas and/or whitespace. Everything after the
//! first `!` outside a quoted string is the comment. Strings may be single
//! or double quoted and keep embedded spaces, commas and `!`.

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Token {
    pub(crate) text: String,
    pub(crate) quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SplitLine<'a> {
    pub(crate) tokens: Vec<Token>,
    pub(crate) comment: Option<&'a str>,
}

pub(crate) fn split_prm_line(line: &str) -> SplitLine<'_> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut comment = None;

    for (offset, character) in line.char_indices() {
        if let Some(open) = quote {
            if character == open {
                tokens.push(Token {
                    text: std::mem::take(&mut current),
                    quoted: true,
                });
                quote = None;
            } else {
                current.push(character);
            }
            continue;
        }

        match character {
            '!' => {
                comment = Some(&line[offset + 1..]);
                break;
            }
            '\'' | '"' => {
                flush_bare(&mut tokens, &mut current);
                quote = Some(character);
            }
            ',' => flush_bare(&mut tokens, &mut current),
            other if other.is_whitespace() => flush_bare(&mut tokens, &mut current),
            other => current.push(other),
        }
    }

    if quote.is_some() {
        // unterminated quote: keep what was read as a plain string
        tokens.push(Token {
            text: current,
            quoted: true,
        });
    } else {
        flush_bare(&mut tokens, &mut current);
    }

    SplitLine { tokens, comment }
}

fn flush_bare(tokens: &mut Vec<Token>, current: &mut String) {
    if !current.is_empty() {
        tokens.push(Token {
            text: std::mem::take(current),
            quoted: false,
        });
    }
}

pub(crate) fn parse_float_token(token: &str) -> Option<f64> {
    let normalized = token.trim().replace(['D', 'd'], "E");
    normalized.parse::<f64>().ok()
}

/// Integers written as `3.0` are accepted as long as they are integral.
pub(crate) fn parse_int_token(token: &str) -> Option<i64> {
    let trimmed = token.trim();
    if let Ok(value) = trimmed.parse::<i64>() {
        return Some(value);
    }

    let value = parse_float_token(trimmed)?;
    if value.is_finite() && value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_float_token, parse_int_token, split_prm_line};

    fn texts(line: &str) -> Vec<String> {
        split_prm_line(line)
            .tokens
            .into_iter()
            .map(|token| token.text)
            .collect()
    }

    #[test]
    fn splits_on_commas_and_whitespace_before_the_comment() {
        let split = split_prm_line("10.0, 20.0,30.0   40 ! Semi angle of convergence [mrad]");
        assert_eq!(
            split.tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            ["10.0", "20.0", "30.0", "40"]
        );
        assert_eq!(split.comment, Some(" Semi angle of convergence [mrad]"));
    }

    #[test]
    fn quoted_strings_keep_spaces_and_separators() {
        let split = split_prm_line("0, 'my dir/det, v2.prm'! Detector definition file");
        assert_eq!(split.tokens.len(), 2);
        assert_eq!(split.tokens[1].text, "my dir/det, v2.prm");
        assert!(split.tokens[1].quoted);
        assert!(!split.tokens[0].quoted);
        assert_eq!(split.comment, Some(" Detector definition file"));
    }

    #[test]
    fn bang_inside_quotes_is_not_a_comment() {
        assert_eq!(texts("'wow!.wav' ! name"), ["wow!.wav"]);
    }

    #[test]
    fn lines_without_comment_report_none() {
        let split = split_prm_line("'[Microscope Parameters]'");
        assert_eq!(split.comment, None);
        assert_eq!(split.tokens[0].text, "[Microscope Parameters]");
        assert!(split_prm_line("").tokens.is_empty());
    }

    #[test]
    fn numeric_tokens_accept_fortran_exponents_and_integral_floats() {
        assert_eq!(parse_float_token("1.5D-3"), Some(1.5e-3));
        assert_eq!(parse_float_token("abc"), None);
        assert_eq!(parse_int_token("12"), Some(12));
        assert_eq!(parse_int_token("-3"), Some(-3));
        assert_eq!(parse_int_token("4.0"), Some(4));
        assert_eq!(parse_int_token("4.5"), None);
        assert_eq!(parse_int_token("x"), None);
    }
}
