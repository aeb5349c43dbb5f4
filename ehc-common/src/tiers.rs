//! Membership tier normalization
//!
//! Legacy booking-system plan names are mapped onto the five normalized
//! tiers plus descriptive tags. Matching is exact after trimming; anything
//! else falls back to `Social` with no tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Normalized membership category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Core,
    Premium,
    #[serde(rename = "VIP")]
    Vip,
    Corporate,
    Social,
}

impl Tier {
    pub const ALL: [Tier; 5] = [
        Tier::Core,
        Tier::Premium,
        Tier::Vip,
        Tier::Corporate,
        Tier::Social,
    ];

    /// Name as stored in the `users.tier` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Core => "Core",
            Tier::Premium => "Premium",
            Tier::Vip => "VIP",
            Tier::Corporate => "Corporate",
            Tier::Social => "Social",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| crate::Error::InvalidInput(format!("Unknown tier: {}", s)))
    }
}

/// Result of normalizing a legacy plan label
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierMapping {
    pub tier: Tier,
    pub tags: Vec<String>,
}

impl TierMapping {
    fn new(tier: Tier, tags: &[&str]) -> Self {
        Self {
            tier,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// Legacy plan label → (tier, tags)
const TIER_TABLE: &[(&str, Tier, &[&str])] = &[
    ("Core Membership", Tier::Core, &[]),
    ("Core Membership Founding Members", Tier::Core, &["Founding Member"]),
    ("Premium Membership", Tier::Premium, &[]),
    ("Premium Membership Founding Members", Tier::Premium, &["Founding Member"]),
    ("VIP Membership", Tier::Vip, &[]),
    ("Corporate Membership", Tier::Corporate, &[]),
    ("Approved Pre Sale Clients", Tier::Social, &["Pre-Sale"]),
    ("Social Membership", Tier::Social, &[]),
    ("Social Membership Founding Members", Tier::Social, &["Founding Member"]),
    ("Junior Group Lessons Membership", Tier::Social, &["Junior Lessons"]),
    ("Group Lessons Membership", Tier::Social, &["Group Lessons"]),
];

/// Look up a legacy label without the unknown-label fallback
pub fn lookup_tier(label: &str) -> Option<TierMapping> {
    let key = label.trim();
    TIER_TABLE
        .iter()
        .find(|(name, _, _)| *name == key)
        .map(|(_, tier, tags)| TierMapping::new(*tier, tags))
}

/// Normalize a legacy plan label
///
/// Unknown labels log a warning and map to `Social` with no tags.
pub fn parse_tier(label: &str) -> TierMapping {
    match lookup_tier(label) {
        Some(mapping) => mapping,
        None => {
            warn!(label = label.trim(), "Unknown tier - defaulting to Social");
            TierMapping::new(Tier::Social, &[])
        }
    }
}

const BOOKING_TIER_KEYWORDS: [&str; 4] = ["core", "vip", "premium", "corporate"];
const BOOKING_TAG_KEYWORDS: [&str; 1] = ["founding"];

/// Whether a member may book simulator time under their own membership
///
/// Tier names match by case-insensitive substring; founding-member tags
/// grant access regardless of tier.
pub fn is_authorized_for_member_booking(tier: Option<&str>, tags: &[String]) -> bool {
    let tier = tier.unwrap_or("").to_lowercase();
    if tier.is_empty() && tags.is_empty() {
        return false;
    }

    if BOOKING_TIER_KEYWORDS.iter().any(|k| tier.contains(k)) {
        return true;
    }

    tags.iter().any(|tag| {
        let tag = tag.to_lowercase();
        BOOKING_TAG_KEYWORDS.iter().any(|k| tag.contains(k))
    })
}
