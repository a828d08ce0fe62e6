// Variant - type-erased value container for action parameters and state

use std::fmt;

/// Errors produced when converting a [`Variant`] between types
#[derive(Debug, Clone, thiserror::Error)]
pub enum VariantError {
    #[error("Cannot convert {from} to {to}: '{value}'")]
    Conversion {
        from: &'static str,
        to: &'static str,
        value: String,
    },
}

/// The type a [`Variant`] currently holds, or that a state variable accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantKind {
    Bool,
    Int,
    Real,
    Text,
}

impl VariantKind {
    pub fn name(&self) -> &'static str {
        match self {
            VariantKind::Bool => "bool",
            VariantKind::Int => "int",
            VariantKind::Real => "real",
            VariantKind::Text => "text",
        }
    }
}

/// Type-erased value used to marshal action arguments and state values
/// across the string/typed boundary.
///
/// Every variant has a canonical string form, and every typed getter falls
/// back to parsing that form when the stored payload is `Text`. This is what
/// lets the command-string interface hand untyped tokens to actions that
/// then read them as the type they expect, and what keeps the round trip
/// `Variant -> canonical string -> Variant` lossless.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

impl Variant {
    pub fn kind(&self) -> VariantKind {
        match self {
            Variant::Bool(_) => VariantKind::Bool,
            Variant::Int(_) => VariantKind::Int,
            Variant::Real(_) => VariantKind::Real,
            Variant::Text(_) => VariantKind::Text,
        }
    }

    /// The canonical string form. Parsing it back with the same expected
    /// kind yields an equal value.
    pub fn to_canonical(&self) -> String {
        match self {
            Variant::Bool(value) => value.to_string(),
            Variant::Int(value) => value.to_string(),
            Variant::Real(value) => value.to_string(),
            Variant::Text(value) => value.clone(),
        }
    }

    /// Parse a canonical string as a given kind.
    pub fn parse_as(kind: VariantKind, text: &str) -> Result<Variant, VariantError> {
        let conversion = |to: &'static str| VariantError::Conversion {
            from: "text",
            to,
            value: text.to_string(),
        };
        match kind {
            VariantKind::Bool => match text.trim() {
                "true" | "1" => Ok(Variant::Bool(true)),
                "false" | "0" => Ok(Variant::Bool(false)),
                _ => Err(conversion("bool")),
            },
            VariantKind::Int => text
                .trim()
                .parse::<i64>()
                .map(Variant::Int)
                .map_err(|_| conversion("int")),
            VariantKind::Real => text
                .trim()
                .parse::<f64>()
                .map(Variant::Real)
                .map_err(|_| conversion("real")),
            VariantKind::Text => Ok(Variant::Text(text.to_string())),
        }
    }

    /// Convert into `kind`, going through the canonical string form when the
    /// payload type does not match directly.
    pub fn coerce_to(&self, kind: VariantKind) -> Result<Variant, VariantError> {
        if self.kind() == kind {
            return Ok(self.clone());
        }
        Variant::parse_as(kind, &self.to_canonical())
    }

    pub fn get_bool(&self) -> Result<bool, VariantError> {
        match self.coerce_to(VariantKind::Bool)? {
            Variant::Bool(value) => Ok(value),
            _ => unreachable!(),
        }
    }

    pub fn get_int(&self) -> Result<i64, VariantError> {
        match self {
            Variant::Int(value) => Ok(*value),
            other => match other.coerce_to(VariantKind::Int)? {
                Variant::Int(value) => Ok(value),
                _ => unreachable!(),
            },
        }
    }

    pub fn get_real(&self) -> Result<f64, VariantError> {
        match self {
            Variant::Real(value) => Ok(*value),
            Variant::Int(value) => Ok(*value as f64),
            other => match other.coerce_to(VariantKind::Real)? {
                Variant::Real(value) => Ok(value),
                _ => unreachable!(),
            },
        }
    }

    pub fn get_text(&self) -> String {
        self.to_canonical()
    }

    /// Heap footprint estimate, used for undo-history accounting.
    pub fn byte_size(&self) -> usize {
        let payload = match self {
            Variant::Text(value) => value.capacity(),
            _ => 0,
        };
        std::mem::size_of::<Variant>() + payload
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical())
    }
}

impl From<bool> for Variant {
    fn from(value: bool) -> Self {
        Variant::Bool(value)
    }
}

impl From<i64> for Variant {
    fn from(value: i64) -> Self {
        Variant::Int(value)
    }
}

impl From<f64> for Variant {
    fn from(value: f64) -> Self {
        Variant::Real(value)
    }
}

impl From<&str> for Variant {
    fn from(value: &str) -> Self {
        Variant::Text(value.to_string())
    }
}

impl From<String> for Variant {
    fn from(value: String) -> Self {
        Variant::Text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_round_trip() {
        let values = [
            Variant::Bool(true),
            Variant::Int(-42),
            Variant::Real(0.5),
            Variant::Text("layer_1:selected".to_string()),
        ];

        for value in values {
            let parsed = Variant::parse_as(value.kind(), &value.to_canonical()).unwrap();
            assert_eq!(parsed, value);
        }
    }

    #[test]
    fn test_text_fallback_to_typed() {
        assert!(Variant::Text("true".to_string()).get_bool().unwrap());
        assert_eq!(Variant::Text("17".to_string()).get_int().unwrap(), 17);
        assert_eq!(Variant::Text("2.5".to_string()).get_real().unwrap(), 2.5);
    }

    #[test]
    fn test_int_widens_to_real() {
        assert_eq!(Variant::Int(3).get_real().unwrap(), 3.0);
    }

    #[test]
    fn test_failed_conversion_reports_value() {
        let err = Variant::Text("not a number".to_string())
            .get_int()
            .unwrap_err();
        assert!(err.to_string().contains("not a number"));
    }

    #[test]
    fn test_coerce_keeps_matching_kind() {
        let value = Variant::Real(1.25);
        assert_eq!(value.coerce_to(VariantKind::Real).unwrap(), value);
    }

    #[test]
    fn test_byte_size_counts_text_payload() {
        let short = Variant::Int(1).byte_size();
        let long = Variant::Text("x".repeat(1024)).byte_size();
        assert!(long > short + 1000);
    }
}
