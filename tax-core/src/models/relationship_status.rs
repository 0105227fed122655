use serde::{Deserialize, Serialize};

/// Whether levies are tested against individual or household income.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipStatus {
    #[default]
    Single,
    Couple,
}

impl RelationshipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Couple => "couple",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "single" | "s" => Some(Self::Single),
            "couple" | "c" | "married" | "partnered" => Some(Self::Couple),
            _ => None,
        }
    }

    pub fn is_couple(&self) -> bool {
        matches!(self, Self::Couple)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_short_and_long_codes() {
        assert_eq!(RelationshipStatus::parse("S"), Some(RelationshipStatus::Single));
        assert_eq!(RelationshipStatus::parse(" couple "), Some(RelationshipStatus::Couple));
        assert_eq!(RelationshipStatus::parse("married"), Some(RelationshipStatus::Couple));
        assert_eq!(RelationshipStatus::parse("widowed"), None);
    }

    #[test]
    fn as_str_round_trips_through_parse() {
        for status in [RelationshipStatus::Single, RelationshipStatus::Couple] {
            assert_eq!(RelationshipStatus::parse(status.as_str()), Some(status));
        }
    }
}
