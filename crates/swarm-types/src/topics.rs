//! Canonical topic table and the free-text normalizer.
//!
//! Thought `suggested_actions` arrive as free text from the reasoning
//! backend; the decision engine maps them onto the five canonical data-source
//! topics before generating candidates. Unmatched text normalizes to `None`
//! and is ignored.

/// The five canonical topics the data source serves.
pub const CANONICAL_TOPICS: [&str; 5] = [
    "near_earth_objects",
    "mars_weather",
    "solar_activity",
    "exoplanets",
    "earth_imagery",
];

/// Keyword table: any hit maps the whole text to the paired topic.
const KEYWORDS: [(&str, &str); 18] = [
    ("asteroid", "near_earth_objects"),
    ("neo", "near_earth_objects"),
    ("near earth", "near_earth_objects"),
    ("near-earth", "near_earth_objects"),
    ("impact", "near_earth_objects"),
    ("mars", "mars_weather"),
    ("insight", "mars_weather"),
    ("sol ", "mars_weather"),
    ("flare", "solar_activity"),
    ("solar", "solar_activity"),
    ("geomagnetic", "solar_activity"),
    ("cme", "solar_activity"),
    ("exoplanet", "exoplanets"),
    ("transit", "exoplanets"),
    ("kepler", "exoplanets"),
    ("earth imagery", "earth_imagery"),
    ("landsat", "earth_imagery"),
    ("epic", "earth_imagery"),
];

/// Map free text onto a canonical topic, if any keyword matches.
///
/// Exact canonical names (case-insensitive, with `-`/space treated as `_`)
/// match first; otherwise the keyword table is scanned in order and the
/// first hit wins.
pub fn normalize_topic(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    let squashed = lowered.replace(['-', ' '], "_");

    for topic in CANONICAL_TOPICS {
        if squashed.contains(topic) {
            return Some(topic);
        }
    }

    for (keyword, topic) in KEYWORDS {
        if lowered.contains(keyword) {
            return Some(topic);
        }
    }

    None
}

/// Whether the given string is exactly one of the canonical topics.
pub fn is_canonical(topic: &str) -> bool {
    CANONICAL_TOPICS.contains(&topic)
}
