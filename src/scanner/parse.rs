// Season / episode inference from folder and file names

use regex::Regex;
use std::sync::LazyLock;

/// A parsing rule: a pattern plus the capture group holding the number
struct NumberRule {
    name: &'static str,
    pattern: Regex,
    group: usize,
}

impl NumberRule {
    fn new(name: &'static str, pattern: &str) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).unwrap(),
            group: 1,
        }
    }

    /// Digit runs that do not fit in a u32 count as no match
    fn extract(&self, input: &str) -> Option<u32> {
        let caps = self.pattern.captures(input)?;
        caps.get(self.group)?.as_str().parse().ok()
    }
}

/// Season folder rules, in priority order
static SEASON_RULES: LazyLock<Vec<NumberRule>> = LazyLock::new(|| {
    vec![
        NumberRule::new("temporada", r"(?i)temporada[\s.]*(\d+)"),
        NumberRule::new("temp", r"(?i)temp[\s.]*(\d+)"),
        NumberRule::new("season", r"(?i)season[\s.]*(\d+)"),
        NumberRule::new("s", r"(?i)s[\s.]*(\d+)"),
        NumberRule::new("t", r"(?i)t[\s.]*(\d+)"),
        NumberRule::new("digits", r"(\d+)"),
    ]
});

static EPISODE_RULES: LazyLock<Vec<NumberRule>> =
    LazyLock::new(|| vec![NumberRule::new("digits", r"(\d+)")]);

fn first_match(rules: &[NumberRule], input: &str) -> Option<u32> {
    rules.iter().find_map(|rule| {
        let value = rule.extract(input)?;
        tracing::trace!("'{}' matched rule '{}' -> {}", input, rule.name, value);
        Some(value)
    })
}

/// Parse a season number from a season folder name
/// - "Temporada 2" -> 2
/// - "Season.03" -> 3
/// - "S4" -> 4
/// - "2" -> 2 (digits anywhere)
/// - "Extras" -> 1 (default)
pub fn parse_season_number(folder_name: &str) -> u32 {
    first_match(&SEASON_RULES, folder_name).unwrap_or(1)
}

/// Parse an episode number from a filename: the first run of digits wins,
/// even when it belongs to a season tag, year or resolution.
/// - "Show.S02E01.mkv" -> 2
/// - "Episode 7.mp4" -> 7
/// - "Pilot.mkv" -> 1 (default)
pub fn parse_episode_number(filename: &str) -> u32 {
    first_match(&EPISODE_RULES, filename).unwrap_or(1)
}
