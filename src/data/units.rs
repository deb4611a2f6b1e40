//! Minimal CF unit-string algebra, enough to decide whether two strings name the same unit.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    terms: BTreeMap<String, i32>,
}

impl ParsedUnit {
    /// Parses `kg m-2 s-1`, `kg m^-2 s^-1`, `kg.m-2.s-1` or `kg/m2/s`.
    /// `1` and the empty string are dimensionless. Scale factors are not supported.
    pub fn parse(s: &str) -> Option<Self> {
        let mut terms = BTreeMap::new();
        let mut parts = s.split('/');
        if let Some(num) = parts.next() {
            Self::parse_product(num, 1, &mut terms)?;
        }
        for den in parts {
            if den.trim().is_empty() {
                return None;
            }
            Self::parse_product(den, -1, &mut terms)?;
        }
        terms.retain(|_, v| *v != 0);
        Some(Self { terms })
    }

    fn parse_product(s: &str, sign: i32, terms: &mut BTreeMap<String, i32>) -> Option<()> {
        for factor in s.split(|c: char| c.is_whitespace() || c == '.' || c == '*') {
            if factor.is_empty() || factor == "1" {
                continue;
            }
            let split = factor
                .find(|c: char| !(c.is_alphabetic() || c == '_'))
                .unwrap_or(factor.len());
            let (base, exp) = factor.split_at(split);
            if base.is_empty() {
                return None;
            }
            let exp = exp.strip_prefix('^').unwrap_or(exp);
            let exp = if exp.is_empty() { 1 } else { exp.parse::<i32>().ok()? };
            *terms.entry(base.to_string()).or_insert(0) += exp * sign;
        }
        Some(())
    }

    pub fn is_dimensionless(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn multiply(&mut self, other: &Self) {
        for (k, v) in &other.terms {
            *self.terms.entry(k.clone()).or_insert(0) += v;
        }
        self.terms.retain(|_, v| *v != 0);
    }
}

/// Canonical CF form: positive powers first, then negative, each alphabetical.
impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.is_empty() {
            return f.write_str("1");
        }
        let (pos, neg): (Vec<_>, Vec<_>) = self.terms.iter().partition(|&(_, &v)| v > 0);
        let rendered: Vec<String> = pos
            .into_iter()
            .chain(neg)
            .map(|(k, &v)| if v == 1 { k.clone() } else { format!("{}{}", k, v) })
            .collect();
        f.write_str(&rendered.join(" "))
    }
}

/// True if both strings parse to the same unit. Unparseable strings only match verbatim.
pub fn equivalent(a: &str, b: &str) -> bool {
    match (ParsedUnit::parse(a), ParsedUnit::parse(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.trim() == b.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("kg m-2 s-1", "kg m-2 s-1")]
    #[case("kg/m2/s", "kg m-2 s-1")]
    #[case("kg m^-2 s^-1", "kg m-2 s-1")]
    #[case("s-1 kg.m-2", "kg m-2 s-1")]
    #[case("m m", "m2")]
    #[case("m2/m", "m")]
    #[case("1", "1")]
    #[case("", "1")]
    #[case("degrees_north", "degrees_north")]
    fn test_canonical_form(#[case] input: &str, #[case] expected: &str) {
        let u = ParsedUnit::parse(input).expect("Failed to parse");
        assert_eq!(u.to_string(), expected, "Input: {}", input);
    }

    #[rstest]
    #[case("kg//m2")]
    #[case("kg m^x")]
    #[case("10 m")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(ParsedUnit::parse(input).is_none(), "Should fail: '{}'", input);
    }

    #[test]
    fn test_equivalence() {
        assert!(equivalent("kg m-2 s-1", "kg/m2/s"));
        assert!(!equivalent("kg m-2 s-1", "kg m-2"));
        assert!(equivalent("1", ""));
    }

    #[test]
    fn test_multiply_cancels() {
        let mut flux = ParsedUnit::parse("kg m-2 s-1").unwrap();
        flux.multiply(&ParsedUnit::parse("s").unwrap());
        assert_eq!(flux.to_string(), "kg m-2");
    }
}
