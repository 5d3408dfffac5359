//! Bundled arcade games
//!
//! Each game is only a [`GameRules`](crate::sim::GameRules) implementation;
//! the loop, clock, input and lifecycle all come from the engine.

pub mod breakout;
pub mod bullet_dodge;
pub mod slice_dash;

pub use breakout::Breakout;
pub use bullet_dodge::BulletDodge;
pub use slice_dash::SliceDash;

/// Key codes (`KeyboardEvent.code`) shared by the games
pub const LEFT_KEYS: &[&str] = &["ArrowLeft", "KeyA"];
pub const RIGHT_KEYS: &[&str] = &["ArrowRight", "KeyD"];
pub const UP_KEYS: &[&str] = &["ArrowUp", "KeyW"];
pub const DOWN_KEYS: &[&str] = &["ArrowDown", "KeyS"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GameKind {
    #[default]
    Breakout,
    BulletDodge,
    SliceDash,
}

impl GameKind {
    pub const ALL: [GameKind; 3] = [GameKind::Breakout, GameKind::BulletDodge, GameKind::SliceDash];

    /// Also the best-score key
    pub fn name(&self) -> &'static str {
        match self {
            GameKind::Breakout => "breakout",
            GameKind::BulletDodge => "bullet_dodge",
            GameKind::SliceDash => "slice_dash",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "breakout" => Some(GameKind::Breakout),
            "bullet_dodge" | "dodge" => Some(GameKind::BulletDodge),
            "slice_dash" | "slice" => Some(GameKind::SliceDash),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::GameRules;

    #[test]
    fn test_kind_names_round_trip() {
        for kind in GameKind::ALL {
            assert_eq!(GameKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(GameKind::from_name("Bullet-Dodge"), Some(GameKind::BulletDodge));
        assert_eq!(GameKind::from_name("tetris"), None);
    }

    #[test]
    fn test_kind_names_match_rules() {
        assert_eq!(Breakout::new().name(), GameKind::Breakout.name());
        assert_eq!(BulletDodge::new().name(), GameKind::BulletDodge.name());
        assert_eq!(SliceDash::new().name(), GameKind::SliceDash.name());
    }
}
