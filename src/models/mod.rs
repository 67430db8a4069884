pub mod entity;
pub mod fixture;
pub mod league;
pub mod response;
pub mod schema;
pub mod team;

#[cfg(test)]
mod tests {
    use super::fixture::Event;
    use super::league::League;
    use super::team::{Player, PlayerTeamSeason, Team, Transfer};
    use serde::de::DeserializeOwned;
    use serde_json::{json, Value};
    use validator::Validate;

    const SCHEMA: &str = include_str!("../../migrations/2023-06-20-120000_football_schema/up.sql");
    const SEASON: &str = "00000000-0000-0000-0000-000000000001";

    /// Declared width of a `VARCHAR(n)` column.
    fn width(column: &str) -> usize {
        let marker = format!("{column} VARCHAR(");
        let start = SCHEMA
            .find(&marker)
            .unwrap_or_else(|| panic!("no VARCHAR column {column}"))
            + marker.len();
        let end = start + SCHEMA[start..].find(')').unwrap();
        SCHEMA[start..end].parse().unwrap()
    }

    fn accepts<E: DeserializeOwned + Validate>(value: Value) -> bool {
        serde_json::from_value::<E>(value).unwrap().validate().is_ok()
    }

    fn text(len: usize) -> String {
        "x".repeat(len)
    }

    #[test]
    fn longest_valid_values_fit_their_columns() {
        let league = |len| json!({"id": 39, "name": "Premier League", "league_type": text(len)});
        assert!(accepts::<League>(league(50)));
        assert!(!accepts::<League>(league(51)));
        assert!(width("league_type") >= 50);

        let team = |len| json!({"id": 33, "name": "Manchester United", "national": false, "short_code": text(len)});
        assert!(accepts::<Team>(team(16)));
        assert!(!accepts::<Team>(team(17)));
        assert!(width("short_code") >= 16);

        let player = |len| json!({"id": 1100, "height": text(len), "weight": text(len)});
        assert!(accepts::<Player>(player(16)));
        assert!(!accepts::<Player>(player(17)));
        assert!(width("height") >= 16 && width("weight") >= 16);

        let registration = |len| {
            json!({"player_id": 1100, "team_id": 50, "season_id": SEASON, "position": text(len)})
        };
        assert!(accepts::<PlayerTeamSeason>(registration(32)));
        assert!(!accepts::<PlayerTeamSeason>(registration(33)));
        assert!(width("position") >= 32);

        let transfer = |len| json!({"player_id": 1100, "transfer_type": text(len)});
        assert!(accepts::<Transfer>(transfer(32)));
        assert!(!accepts::<Transfer>(transfer(33)));
        assert!(width("transfer_type") >= 32);

        let event = |len| json!({"fixture_id": 1035037, "event_type": text(len)});
        assert!(accepts::<Event>(event(64)));
        assert!(!accepts::<Event>(event(65)));
        assert!(width("event_type") >= 64);
    }
}
