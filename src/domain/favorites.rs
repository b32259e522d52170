use serde::Serialize;
use utoipa::ToSchema;

/// Outcome of flipping a favorite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    Added,
    Removed,
}

impl Toggle {
    /// What a toggle does given whether the pair is currently present.
    pub fn from_presence(present: bool) -> Self {
        if present { Toggle::Removed } else { Toggle::Added }
    }

    pub fn is_favorite(self) -> bool {
        matches!(self, Toggle::Added)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_presence() {
        assert_eq!(Toggle::from_presence(false), Toggle::Added);
        assert_eq!(Toggle::from_presence(true), Toggle::Removed);
        assert!(Toggle::from_presence(false).is_favorite());
        assert!(!Toggle::from_presence(true).is_favorite());
    }

    #[test]
    fn toggling_twice_returns_to_the_start() {
        for present in [false, true] {
            let after_first = Toggle::from_presence(present).is_favorite();
            let after_second = Toggle::from_presence(after_first).is_favorite();
            assert_eq!(after_second, present);
        }
    }
}
