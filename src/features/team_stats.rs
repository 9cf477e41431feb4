//! Team statistics computation
//!
//! Per-team performance summary over a window of match records.

use crate::{MatchRecord, ResultLabel};

/// Six-component performance summary for one team
///
/// When `games_played` is zero every component is zero (cold start). The
/// zero vector is a valid feature value, not an error signal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TeamStatVector {
    /// Average goals scored per match
    pub avg_goals_scored: f64,
    /// Average goals conceded per match
    pub avg_goals_conceded: f64,
    /// Win ratio (0-1)
    pub win_rate: f64,
    /// Draw ratio (0-1)
    pub draw_rate: f64,
    /// Loss ratio, always `1 - win_rate - draw_rate`
    pub loss_rate: f64,
    /// Total matches played
    pub games_played: f64,
}

impl TeamStatVector {
    /// Number of components
    pub const DIM: usize = 6;

    /// Aggregate a team's statistics over a record set
    pub fn aggregate(team: &str, records: &[MatchRecord]) -> Self {
        let mut home_games = 0usize;
        let mut away_games = 0usize;
        let mut goals_scored = 0u64;
        let mut goals_conceded = 0u64;
        let mut wins = 0usize;
        let mut draws = 0usize;

        for record in records {
            if record.home_team == team {
                home_games += 1;
                goals_scored += record.home_goals as u64;
                goals_conceded += record.away_goals as u64;
                match record.result {
                    ResultLabel::HomeWin => wins += 1,
                    ResultLabel::Draw => draws += 1,
                    _ => {}
                }
            }
            if record.away_team == team {
                away_games += 1;
                goals_scored += record.away_goals as u64;
                goals_conceded += record.home_goals as u64;
                match record.result {
                    ResultLabel::AwayWin => wins += 1,
                    ResultLabel::Draw => draws += 1,
                    _ => {}
                }
            }
        }

        let total = home_games + away_games;
        if total == 0 {
            return Self::default();
        }

        let n = total as f64;
        let win_rate = wins as f64 / n;
        let draw_rate = draws as f64 / n;

        TeamStatVector {
            avg_goals_scored: goals_scored as f64 / n,
            avg_goals_conceded: goals_conceded as f64 / n,
            win_rate,
            draw_rate,
            loss_rate: 1.0 - win_rate - draw_rate,
            games_played: n,
        }
    }

    /// True when the team has no history in the aggregated records
    pub fn is_cold_start(&self) -> bool {
        self.games_played == 0.0
    }

    /// Components in model order
    pub fn to_array(&self) -> [f64; Self::DIM] {
        [
            self.avg_goals_scored,
            self.avg_goals_conceded,
            self.win_rate,
            self.draw_rate,
            self.loss_rate,
            self.games_played,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_match(home: &str, away: &str, home_goals: u32, away_goals: u32) -> MatchRecord {
        MatchRecord {
            league: "Liga I".to_string(),
            season: None,
            date: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals,
            away_goals,
            result: ResultLabel::from_goals(home_goals, away_goals),
        }
    }

    #[test]
    fn test_unbeaten_and_winless_teams() {
        let records = vec![
            make_match("A", "C", 3, 0),
            make_match("A", "D", 2, 1),
            make_match("B", "C", 0, 2),
            make_match("B", "D", 1, 3),
        ];

        let a = TeamStatVector::aggregate("A", &records);
        assert_eq!(a.win_rate, 1.0);
        assert_eq!(a.loss_rate, 0.0);
        assert_eq!(a.games_played, 2.0);
        assert_eq!(a.avg_goals_scored, 2.5);
        assert_eq!(a.avg_goals_conceded, 0.5);

        let b = TeamStatVector::aggregate("B", &records);
        assert_eq!(b.loss_rate, 1.0);
        assert_eq!(b.win_rate, 0.0);
        assert_eq!(b.draw_rate, 0.0);
    }

    #[test]
    fn test_home_and_away_partitions() {
        let records = vec![
            make_match("A", "B", 1, 1),
            make_match("B", "A", 0, 2),
            make_match("B", "A", 4, 1),
        ];

        let a = TeamStatVector::aggregate("A", &records);
        assert_eq!(a.games_played, 3.0);
        assert!((a.win_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((a.draw_rate - 1.0 / 3.0).abs() < 1e-12);
        assert!((a.loss_rate - 1.0 / 3.0).abs() < 1e-12);
        // Scored: 1 at home, 2 + 1 away
        assert!((a.avg_goals_scored - 4.0 / 3.0).abs() < 1e-12);
        assert!((a.avg_goals_conceded - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_team_on_both_sides_counts_each_side() {
        let records = vec![make_match("A", "A", 2, 1)];

        let a = TeamStatVector::aggregate("A", &records);
        assert_eq!(a.games_played, 2.0);
        assert_eq!(a.avg_goals_scored, 1.5);
        assert_eq!(a.avg_goals_conceded, 1.5);
        assert_eq!(a.win_rate, 0.5);
        assert_eq!(a.loss_rate, 0.5);
    }

    #[test]
    fn test_rates_sum_to_one() {
        let records = vec![
            make_match("A", "B", 1, 0),
            make_match("C", "A", 2, 2),
            make_match("A", "D", 0, 1),
            make_match("E", "A", 0, 3),
            make_match("A", "C", 5, 5),
            make_match("B", "A", 1, 0),
            make_match("A", "E", 2, 0),
        ];

        for team in ["A", "B", "C", "D", "E"] {
            let stats = TeamStatVector::aggregate(team, &records);
            assert!(stats.games_played > 0.0);
            let sum = stats.win_rate + stats.draw_rate + stats.loss_rate;
            assert!((sum - 1.0).abs() < 1e-9, "{}: rates sum to {}", team, sum);
        }
    }

    #[test]
    fn test_cold_start_is_zero_vector() {
        let records = vec![make_match("A", "B", 1, 0)];
        let stats = TeamStatVector::aggregate("Nobody", &records);

        assert!(stats.is_cold_start());
        assert_eq!(stats.to_array(), [0.0; TeamStatVector::DIM]);
        assert_eq!(
            TeamStatVector::aggregate("A", &[]).to_array(),
            [0.0; TeamStatVector::DIM]
        );
    }

    #[test]
    fn test_unknown_result_counts_as_game_only() {
        let mut record = make_match("A", "B", 1, 0);
        record.result = ResultLabel::Other("Postponed".to_string());

        let stats = TeamStatVector::aggregate("A", &[record]);
        assert_eq!(stats.games_played, 1.0);
        assert_eq!(stats.win_rate, 0.0);
        assert_eq!(stats.loss_rate, 1.0);
    }
}
