/// Wildcard league code meaning "search every configured league"
pub const ALL_LEAGUES: &str = "all";

/// Scoreboard feed coordinates for one competition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct League {
    pub code: &'static str,
    pub sport: &'static str,
    pub slug: &'static str,
    pub name: &'static str,
}

const fn league(
    code: &'static str,
    sport: &'static str,
    slug: &'static str,
    name: &'static str,
) -> League {
    League {
        code,
        sport,
        slug,
        name,
    }
}

/// Supported competitions, in the order they are searched when a
/// prediction has no league recorded
pub const LEAGUES: &[League] = &[
    league("epl", "soccer", "eng.1", "Premier League"),
    league("laliga", "soccer", "esp.1", "La Liga"),
    league("bundesliga", "soccer", "ger.1", "Bundesliga"),
    league("seriea", "soccer", "ita.1", "Serie A"),
    league("ucl", "soccer", "uefa.champions", "Champions League"),
    league("ligue1", "soccer", "fra.1", "Ligue 1"),
    league("eredivisie", "soccer", "ned.1", "Eredivisie"),
    league("primeira", "soccer", "por.1", "Primeira Liga"),
    league("championship", "soccer", "eng.2", "Championship"),
    league("nba", "basketball", "nba", "NBA"),
];

pub fn find_league(code: &str) -> Option<&'static League> {
    let code = code.trim();
    LEAGUES.iter().find(|l| l.code.eq_ignore_ascii_case(code))
}

/// True when a stored league value gives no usable competition
pub fn is_wildcard(code: Option<&str>) -> bool {
    match code.map(str::trim) {
        None | Some("") => true,
        Some(c) => c.eq_ignore_ascii_case(ALL_LEAGUES),
    }
}

pub fn league_codes() -> Vec<String> {
    LEAGUES.iter().map(|l| l.code.to_string()).collect()
}
