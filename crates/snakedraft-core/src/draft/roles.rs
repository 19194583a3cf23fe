// Role definitions: the fixed set of roster slots every player fills.

use serde::Serialize;
use std::fmt;

/// Number of roles each player fills over the course of a draft.
pub const TOTAL_ROLES: usize = 16;

/// A draftable role. Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Role {
    #[serde(rename = "Captain")]
    Captain,
    #[serde(rename = "Vice Captain")]
    ViceCaptain,
    #[serde(rename = "Ace")]
    Ace,
    #[serde(rename = "Flex 1/Tactician")]
    Tactician,
    #[serde(rename = "Tank")]
    Tank,
    #[serde(rename = "Wildcard")]
    Wildcard,
    #[serde(rename = "Mascot")]
    Mascot,
    #[serde(rename = "Flex 2/Support")]
    Support,
    #[serde(rename = "Wife/Husband")]
    Spouse,
    #[serde(rename = "Crazy Ex")]
    CrazyEx,
    #[serde(rename = "Mommy/Daddy")]
    Parent,
    #[serde(rename = "Baby Mommy/Baby Daddy")]
    CoParent,
    #[serde(rename = "Side Piece")]
    SidePiece,
    #[serde(rename = "Other Side Piece")]
    OtherSidePiece,
    #[serde(rename = "Best Friend")]
    BestFriend,
    #[serde(rename = "Brother/Sister")]
    Sibling,
}

/// Every role: eight battle roles, then eight relationship roles.
pub const ALL_ROLES: [Role; TOTAL_ROLES] = [
    Role::Captain,
    Role::ViceCaptain,
    Role::Ace,
    Role::Tactician,
    Role::Tank,
    Role::Wildcard,
    Role::Mascot,
    Role::Support,
    Role::Spouse,
    Role::CrazyEx,
    Role::Parent,
    Role::CoParent,
    Role::SidePiece,
    Role::OtherSidePiece,
    Role::BestFriend,
    Role::Sibling,
];

impl Role {
    /// Parse a role from its display name as sent by clients.
    ///
    /// Matching is exact apart from surrounding whitespace; role names contain
    /// slashes and spaces, so no further normalisation is attempted.
    pub fn from_name(s: &str) -> Option<Self> {
        let s = s.trim();
        ALL_ROLES.iter().copied().find(|r| r.display_str() == s)
    }

    /// Return the display string for this role.
    pub fn display_str(&self) -> &'static str {
        match self {
            Role::Captain => "Captain",
            Role::ViceCaptain => "Vice Captain",
            Role::Ace => "Ace",
            Role::Tactician => "Flex 1/Tactician",
            Role::Tank => "Tank",
            Role::Wildcard => "Wildcard",
            Role::Mascot => "Mascot",
            Role::Support => "Flex 2/Support",
            Role::Spouse => "Wife/Husband",
            Role::CrazyEx => "Crazy Ex",
            Role::Parent => "Mommy/Daddy",
            Role::CoParent => "Baby Mommy/Baby Daddy",
            Role::SidePiece => "Side Piece",
            Role::OtherSidePiece => "Other Side Piece",
            Role::BestFriend => "Best Friend",
            Role::Sibling => "Brother/Sister",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}
