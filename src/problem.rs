use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::source::NumberSource;

/// Answers within this distance of a percent problem's tabulated value are accepted.
pub const PERCENT_TOLERANCE: f64 = 0.1;

/// Arithmetic operation a question drills
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    #[strum(to_string = "Addition")]
    Add,
    #[strum(to_string = "Subtraction")]
    Subtract,
    #[strum(to_string = "Multiplication")]
    Multiply,
    #[strum(to_string = "Division")]
    Divide,
    #[strum(to_string = "Squares")]
    Square,
    #[strum(to_string = "Cubes")]
    Cube,
    #[strum(to_string = "Square roots")]
    SquareRoot,
    #[strum(to_string = "Cube roots")]
    CubeRoot,
    #[strum(to_string = "Percentages")]
    Percent,
    #[strum(to_string = "Remainders")]
    Remainder,
}

impl Topic {
    pub const ALL: [Topic; 10] = [
        Topic::Add,
        Topic::Subtract,
        Topic::Multiply,
        Topic::Divide,
        Topic::Square,
        Topic::Cube,
        Topic::SquareRoot,
        Topic::CubeRoot,
        Topic::Percent,
        Topic::Remainder,
    ];

    /// Short stable identifier used in storage keys
    pub fn key(self) -> &'static str {
        match self {
            Topic::Add => "add",
            Topic::Subtract => "sub",
            Topic::Multiply => "mul",
            Topic::Divide => "div",
            Topic::Square => "sq",
            Topic::Cube => "cube",
            Topic::SquareRoot => "sqrt",
            Topic::CubeRoot => "cbrt",
            Topic::Percent => "perc",
            Topic::Remainder => "rem",
        }
    }

    pub fn from_key(key: &str) -> Option<Topic> {
        Topic::ALL.into_iter().find(|t| t.key() == key)
    }
}

/// Tier controlling operand magnitude
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum, strum_macros::Display,
)]
#[serde(rename_all = "kebab-case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Expert,
    ];

    /// Default operand bound for the tier
    pub fn magnitude(self) -> u32 {
        match self {
            Difficulty::Easy => 25,
            Difficulty::Medium => 100,
            Difficulty::Hard => 500,
            Difficulty::Expert => 1000,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Expert => "expert",
        }
    }

    pub fn from_key(key: &str) -> Option<Difficulty> {
        Difficulty::ALL.into_iter().find(|d| d.key() == key)
    }

    /// Pick the entry for this tier out of an easy..expert table
    fn tiered(self, table: [u32; 4]) -> u32 {
        match self {
            Difficulty::Easy => table[0],
            Difficulty::Medium => table[1],
            Difficulty::Hard => table[2],
            Difficulty::Expert => table[3],
        }
    }
}

/// One row of the unit-fraction percent table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentFraction {
    pub numerator: u32,
    pub denominator: u32,
    pub percent: f64,
}

const fn frac(denominator: u32, percent: f64) -> PercentFraction {
    PercentFraction {
        numerator: 1,
        denominator,
        percent,
    }
}

/// Common unit fractions and their percent values, rounded to two places.
pub const PERCENT_TABLE: [PercentFraction; 22] = [
    frac(2, 50.0),
    frac(3, 33.33),
    frac(4, 25.0),
    frac(5, 20.0),
    frac(6, 16.67),
    frac(7, 14.29),
    frac(8, 12.5),
    frac(9, 11.11),
    frac(10, 10.0),
    frac(11, 9.09),
    frac(12, 8.33),
    frac(13, 7.69),
    frac(14, 7.14),
    frac(15, 6.67),
    frac(16, 6.25),
    frac(17, 5.88),
    frac(18, 5.56),
    frac(19, 5.26),
    frac(20, 5.0),
    frac(25, 4.0),
    frac(50, 2.0),
    frac(75, 1.33),
];

/// Percent rows eligible at a difficulty
pub fn percent_candidates(difficulty: Difficulty) -> Vec<PercentFraction> {
    let max_denominator = match difficulty {
        Difficulty::Easy => Some(10),
        Difficulty::Medium => Some(20),
        Difficulty::Hard | Difficulty::Expert => None,
    };
    PERCENT_TABLE
        .iter()
        .filter(|f| max_denominator.map_or(true, |max| f.denominator <= max))
        .copied()
        .collect()
}

/// A generated question with its hidden answer
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    pub topic: Topic,
    pub display_text: String,
    pub expected_answer: f64,
}

impl Problem {
    fn new(topic: Topic, display_text: String, expected_answer: u32) -> Self {
        Self {
            topic,
            display_text,
            expected_answer: expected_answer as f64,
        }
    }

    /// Percent answers get a tolerance for repeating decimals; everything else is exact.
    pub fn accepts(&self, answer: f64) -> bool {
        match self.topic {
            Topic::Percent => (answer - self.expected_answer).abs() < PERCENT_TOLERANCE,
            _ => answer == self.expected_answer,
        }
    }
}

/// Produce a question for `topic` at `difficulty`, consuming draws from `src`.
pub fn generate<S: NumberSource + ?Sized>(
    topic: Topic,
    difficulty: Difficulty,
    src: &mut S,
) -> Problem {
    let m = difficulty.magnitude();
    match topic {
        Topic::Add => {
            let a = src.draw(1, m);
            let b = src.draw(1, m);
            Problem::new(topic, format!("{a} + {b} = ?"), a + b)
        }
        Topic::Subtract => {
            let a = src.draw(1, m);
            let b = src.draw(1, a);
            Problem::new(topic, format!("{a} - {b} = ?"), a - b)
        }
        Topic::Multiply => {
            let bound = (2.0 * m as f64).sqrt().min(50.0).floor() as u32;
            let a = src.draw(2, bound);
            let b = src.draw(2, bound);
            Problem::new(topic, format!("{a} × {b} = ?"), a * b)
        }
        Topic::Divide => {
            let bound = (m as f64 / 10.0).min(25.0).floor() as u32;
            let divisor = src.draw(2, bound);
            let quotient = src.draw(1, bound);
            let dividend = quotient * divisor;
            Problem::new(topic, format!("{dividend} ÷ {divisor} = ?"), quotient)
        }
        Topic::Square => {
            let n = src.draw(1, difficulty.tiered([15, 20, 25, 30]).min(30));
            Problem::new(topic, format!("{n}² = ?"), n * n)
        }
        Topic::Cube => {
            let n = src.draw(1, difficulty.tiered([10, 12, 15, 20]).min(20));
            Problem::new(topic, format!("{n}³ = ?"), n * n * n)
        }
        Topic::SquareRoot => {
            let n = src.draw(1, difficulty.tiered([15, 20, 25, 30]));
            Problem::new(topic, format!("√{} = ?", n * n), n)
        }
        Topic::CubeRoot => {
            let n = src.draw(1, difficulty.tiered([8, 10, 12, 15]));
            Problem::new(topic, format!("∛{} = ?", n * n * n), n)
        }
        Topic::Percent => {
            let candidates = percent_candidates(difficulty);
            let idx = src.draw(0, candidates.len() as u32 - 1) as usize;
            let f = candidates[idx.min(candidates.len() - 1)];
            Problem {
                topic,
                display_text: format!("{}/{} = ?%", f.numerator, f.denominator),
                expected_answer: f.percent,
            }
        }
        Topic::Remainder => {
            let divisor = src.draw(2, 15);
            let quotient = src.draw(1, 20);
            let remainder = src.draw(0, divisor - 1);
            let dividend = quotient * divisor + remainder;
            Problem::new(
                topic,
                format!("Remainder: {dividend} ÷ {divisor} = ?"),
                remainder,
            )
        }
    }
}
