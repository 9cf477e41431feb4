//! Match feature representation for model input
//!
//! A fixture is encoded as the home team's stat vector followed by the away
//! team's.

use super::team_stats::TeamStatVector;
use crate::MatchRecord;

/// Features for one fixture: home stats then away stats
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MatchFeatures {
    pub home: TeamStatVector,
    pub away: TeamStatVector,
}

impl MatchFeatures {
    /// Dimension of feature vector
    pub const DIM: usize = 2 * TeamStatVector::DIM;

    /// Aggregate both sides of a fixture against a record set
    pub fn for_fixture(home_team: &str, away_team: &str, records: &[MatchRecord]) -> Self {
        MatchFeatures {
            home: TeamStatVector::aggregate(home_team, records),
            away: TeamStatVector::aggregate(away_team, records),
        }
    }

    /// Convert to model input (home-then-away)
    pub fn to_vec(&self) -> [f32; Self::DIM] {
        let mut out = [0.0f32; Self::DIM];
        let halves = self.home.to_array().into_iter().chain(self.away.to_array());
        for (slot, value) in out.iter_mut().zip(halves) {
            *slot = value as f32;
        }
        out
    }
}
