use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ValidationError;

/// Menu section a product is listed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Category {
    Meals,
    #[serde(alias = "Foods")]
    Food,
    Snacks,
    Beverages,
    Others,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Meals,
        Category::Food,
        Category::Snacks,
        Category::Beverages,
        Category::Others,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Meals => "Meals",
            Category::Food => "Food",
            Category::Snacks => "Snacks",
            Category::Beverages => "Beverages",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("foods") {
            return Ok(Category::Food);
        }
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValidationError::UnknownCategory(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foods_is_an_alias_of_food() {
        assert_eq!("Foods".parse::<Category>(), Ok(Category::Food));
        let parsed: Category = serde_json::from_str("\"Foods\"").unwrap();
        assert_eq!(parsed, Category::Food);
    }

    #[test]
    fn rejects_unknown_sections() {
        assert!("Desserts".parse::<Category>().is_err());
    }
}
