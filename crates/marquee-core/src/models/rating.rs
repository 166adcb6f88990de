use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A value that can be turned into a canonical rating score.
///
/// Listing pages and film services report scores as numbers, strings with a
/// comma decimal separator (`"7,4"`), or loosely typed JSON. Every input maps
/// to a finite, non-negative score rounded to one decimal place; anything that
/// cannot be read becomes `0.0`.
pub trait ScoreInput {
    fn to_score(&self) -> f64;
}

/// Normalize a raw score into the canonical rating representation.
pub fn normalize(value: impl ScoreInput) -> f64 {
    value.to_score()
}

fn canonical(raw: f64) -> f64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0.0;
    }
    let rounded = (raw * 10.0).round() / 10.0;
    if rounded.is_finite() { rounded } else { 0.0 }
}

fn parse_localized(raw: &str) -> f64 {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .map(canonical)
        .unwrap_or(0.0)
}

impl ScoreInput for &str {
    fn to_score(&self) -> f64 {
        parse_localized(self)
    }
}

impl ScoreInput for String {
    fn to_score(&self) -> f64 {
        parse_localized(self)
    }
}

impl ScoreInput for &String {
    fn to_score(&self) -> f64 {
        parse_localized(self)
    }
}

impl ScoreInput for f64 {
    fn to_score(&self) -> f64 {
        canonical(*self)
    }
}

impl ScoreInput for f32 {
    fn to_score(&self) -> f64 {
        canonical(f64::from(*self))
    }
}

impl ScoreInput for i32 {
    fn to_score(&self) -> f64 {
        canonical(f64::from(*self))
    }
}

impl ScoreInput for i64 {
    fn to_score(&self) -> f64 {
        canonical(*self as f64)
    }
}

impl ScoreInput for u32 {
    fn to_score(&self) -> f64 {
        canonical(f64::from(*self))
    }
}

impl ScoreInput for &Value {
    fn to_score(&self) -> f64 {
        match self {
            Value::Number(n) => n.as_f64().map(canonical).unwrap_or(0.0),
            Value::String(s) => parse_localized(s),
            _ => 0.0,
        }
    }
}

impl ScoreInput for Value {
    fn to_score(&self) -> f64 {
        <&Value as ScoreInput>::to_score(&self)
    }
}

impl<T: ScoreInput> ScoreInput for Option<T> {
    fn to_score(&self) -> f64 {
        self.as_ref().map(ScoreInput::to_score).unwrap_or(0.0)
    }
}

/// Three independent scores for one movie.
///
/// `mul` comes from the cinema listing itself, `fweb` from Filmweb and
/// `imdb` from the movie database lookup. Fields are private so that every
/// stored value passes through [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default, deserialize_with = "deserialize_score")]
    mul: f64,
    #[serde(default, deserialize_with = "deserialize_score")]
    fweb: f64,
    #[serde(default, deserialize_with = "deserialize_score")]
    imdb: f64,
}

fn deserialize_score<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(normalize(&raw))
}

impl Rating {
    pub fn new(mul: impl ScoreInput, fweb: impl ScoreInput, imdb: impl ScoreInput) -> Self {
        Self {
            mul: normalize(mul),
            fweb: normalize(fweb),
            imdb: normalize(imdb),
        }
    }

    pub fn mul(&self) -> f64 {
        self.mul
    }

    pub fn fweb(&self) -> f64 {
        self.fweb
    }

    pub fn imdb(&self) -> f64 {
        self.imdb
    }

    pub fn set_mul(&mut self, value: impl ScoreInput) {
        self.mul = normalize(value);
    }

    pub fn set_fweb(&mut self, value: impl ScoreInput) {
        self.fweb = normalize(value);
    }

    pub fn set_imdb(&mut self, value: impl ScoreInput) {
        self.imdb = normalize(value);
    }
}
