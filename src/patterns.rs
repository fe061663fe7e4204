//! Shape matchers for callsign text.
//!
//! These define exactly which strings count as a callsign, so their
//! boundaries are deliberately narrow:
//!
//! - a run of at least three significant characters (`A-Z`, `0-9`, `/`, `-`)
//! - leading-alpha calls: 1-2 letters, 1-4 digits, one or more letters
//! - leading-numeric calls: a digit, 1-2 letters, a digit, one or more letters
//! - SSID suffixes: `-` followed by 1-4 of `0-9`, `#`, `-` at the very end

use nom::{
    IResult, Parser,
    bytes::complete::{take_while_m_n, take_while1},
    character::complete::satisfy,
    combinator::all_consuming,
    sequence::{delimited, preceded, terminated},
};

/// Minimum length of the significant-character run.
const MIN_SIGNIFICANT_RUN: usize = 3;

/// Maximum number of characters after the dash of an SSID suffix.
const MAX_SSID_LEN: usize = 4;

/// Result of matching a candidate against the callsign shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallShape {
    /// Call area digit, if the shape pins one down.
    pub call_area: Option<char>,
}

fn is_letter(c: char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}

fn is_significant(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '/' || c == '-'
}

fn is_ssid_char(c: char) -> bool {
    c.is_ascii_digit() || c == '#' || c == '-'
}

/// `[A-Z]{1,2}[0-9]{1,4}[A-Z]+`, yielding the digit run.
fn leading_alpha(input: &str) -> IResult<&str, &str> {
    all_consuming(delimited(
        take_while_m_n(1, 2, is_letter),
        take_while_m_n(1, 4, is_digit),
        take_while1(is_letter),
    ))
    .parse(input)
}

/// `[0-9][A-Z]{1,2}[0-9][A-Z]+`, yielding the second digit.
fn leading_numeric(input: &str) -> IResult<&str, char> {
    all_consuming(preceded(
        (satisfy(is_digit), take_while_m_n(1, 2, is_letter)),
        terminated(satisfy(is_digit), take_while1(is_letter)),
    ))
    .parse(input)
}

/// Check whether the text contains a run of at least three significant
/// characters. Anything shorter cannot be a callsign.
pub fn has_significant_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if is_significant(c) {
            run += 1;
            if run >= MIN_SIGNIFICANT_RUN {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

/// Remove a trailing SSID-style suffix such as `-10`, `-#` or `-2-#`.
///
/// The leftmost dash whose tail consists of 1-4 suffix characters wins, so
/// `KM3T-2-#` becomes `KM3T`.
pub fn strip_ssid_suffix(text: &str) -> &str {
    for (i, c) in text.char_indices() {
        if c != '-' {
            continue;
        }
        let tail = &text[i + 1..];
        let len = tail.chars().count();
        if (1..=MAX_SSID_LEN).contains(&len) && tail.chars().all(is_ssid_char) {
            return &text[..i];
        }
    }
    text
}

/// Match the whole candidate against the two callsign shapes.
///
/// For leading-alpha calls the call area is the last digit, but only when
/// the digit run is at most two long (`DL2000ALMK` has none). For
/// leading-numeric calls it is the second digit (`3DA0TM` has `0`).
pub fn match_call_shape(candidate: &str) -> Option<CallShape> {
    if let Ok((_, digits)) = leading_alpha(candidate) {
        let call_area = if digits.len() <= 2 {
            digits.chars().last()
        } else {
            None
        };
        return Some(CallShape { call_area });
    }

    if let Ok((_, digit)) = leading_numeric(candidate) {
        return Some(CallShape {
            call_area: Some(digit),
        });
    }

    None
}
