//! Team abbreviation → front-end logo file key.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum League {
    Nba,
    PremierLeague,
}

const NBA_LOGOS: &[(&str, &str)] = &[
    ("ATL", "hawks"),
    ("BOS", "celtics"),
    ("BKN", "nets"),
    ("CHA", "hornets"),
    ("CHI", "bulls"),
    ("CLE", "cavaliers"),
    ("DAL", "mavericks"),
    ("DEN", "nuggets"),
    ("DET", "pistons"),
    ("GSW", "warriors"),
    ("HOU", "rockets"),
    ("IND", "pacers"),
    ("LAC", "clippers"),
    ("LAL", "lakers"),
    ("MEM", "grizzlies"),
    ("MIA", "heat"),
    ("MIL", "bucks"),
    ("MIN", "timberwolves"),
    ("NOP", "pelicans"),
    ("NYK", "knicks"),
    ("OKC", "thunder"),
    ("ORL", "magic"),
    ("PHI", "76ers"),
    ("PHX", "suns"),
    ("POR", "trailblazers"),
    ("SAC", "kings"),
    ("SAS", "spurs"),
    ("TOR", "raptors"),
    ("UTA", "jazz"),
    ("WAS", "wizards"),
];

const PREMIER_LEAGUE_LOGOS: &[(&str, &str)] = &[
    ("ARS", "arsenal"),
    ("AVL", "villa"),
    ("BOU", "bournemouth"),
    ("BRE", "brentford"),
    ("BHA", "brighton"),
    ("BUR", "burnley"),
    ("CHE", "chelsea"),
    ("CRY", "palace"),
    ("EVE", "everton"),
    ("FUL", "fulham"),
    ("LEE", "leeds"),
    ("LEI", "leicester"),
    ("LIV", "liverpool"),
    ("MCI", "mancity"),
    ("MNC", "mancity"),
    ("MUN", "manutd"),
    ("NEW", "newcastle"),
    ("NFO", "forest"),
    ("SOU", "southampton"),
    ("SUN", "sunderland"),
    ("TOT", "tottenham"),
    ("WHU", "westham"),
    ("WOL", "wolves"),
];

/// Resolve a logo key; unknown abbreviations fall back to their lowercase
/// form.
pub fn logo_key(abbr: &str, league: League) -> String {
    let table = match league {
        League::Nba => NBA_LOGOS,
        League::PremierLeague => PREMIER_LEAGUE_LOGOS,
    };
    let upper = abbr.to_uppercase();
    table
        .iter()
        .find(|(code, _)| *code == upper)
        .map(|(_, key)| key.to_string())
        .unwrap_or_else(|| abbr.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mapped_abbreviations() {
        assert_eq!(logo_key("HOU", League::Nba), "rockets");
        assert_eq!(logo_key("PHI", League::Nba), "76ers");
        assert_eq!(logo_key("MNC", League::PremierLeague), "mancity");
        assert_eq!(logo_key("ars", League::PremierLeague), "arsenal");
    }

    #[test]
    fn test_unmapped_abbreviation_is_lowercased() {
        assert_eq!(logo_key("IPS", League::PremierLeague), "ips");
        assert_eq!(logo_key("OPP", League::Nba), "opp");
    }

    #[test]
    fn test_tables_are_league_specific() {
        // ARS is not an NBA code, HOU is not a Premier League code.
        assert_eq!(logo_key("ARS", League::Nba), "ars");
        assert_eq!(logo_key("HOU", League::PremierLeague), "hou");
    }
}
