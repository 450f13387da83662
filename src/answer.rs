use std::fmt;

/// What the player gave for a question
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserAnswer {
    Parsed(f64),
    Missing,
    Skipped,
}

impl UserAnswer {
    /// Parse typed input leniently: surrounding whitespace and anything after a
    /// leading number are ignored. No number, or a non-finite one, is `Missing`.
    pub fn parse(raw: &str) -> Self {
        match numeric_prefix(raw.trim()).parse::<f64>() {
            Ok(v) if v.is_finite() => UserAnswer::Parsed(v),
            _ => UserAnswer::Missing,
        }
    }

    pub fn value(&self) -> Option<f64> {
        match self {
            UserAnswer::Parsed(v) => Some(*v),
            UserAnswer::Missing | UserAnswer::Skipped => None,
        }
    }
}

impl fmt::Display for UserAnswer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserAnswer::Parsed(v) => f.write_str(&format_number(*v)),
            UserAnswer::Missing => f.write_str("No answer"),
            UserAnswer::Skipped => f.write_str("Skipped"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum Outcome {
    Correct,
    Wrong,
    Skipped,
}

/// Immutable record of one answered or skipped question
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub question_text: String,
    pub user_answer: UserAnswer,
    pub correct_answer: f64,
    pub elapsed_secs: f64,
    pub outcome: Outcome,
}

/// Render a number without a trailing `.0` for whole values
pub fn format_number(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

/// Longest leading slice of `s` that reads as a decimal number
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let digits_from = |mut i: usize| {
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = if matches!(bytes.first(), Some(b'+' | b'-')) {
        1
    } else {
        0
    };
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if bytes.get(end) == Some(&b'.') {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        end = frac_end;
    }
    if mantissa_digits == 0 {
        return "";
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_end = digits_from(exp);
        if exp_end > exp {
            end = exp_end;
        }
    }

    &s[..end]
}
