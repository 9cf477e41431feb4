//! Labeled training examples from a record collection

use super::match_repr::MatchFeatures;
use crate::{MatchRecord, PredictorError, Result};

/// Index-aligned features and class labels
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    pub features: Vec<MatchFeatures>,
    /// HomeWin=0, Draw=1, AwayWin=2
    pub labels: Vec<usize>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Count of examples per class
    pub fn class_counts(&self) -> [usize; 3] {
        let mut counts = [0usize; 3];
        for &label in &self.labels {
            counts[label] += 1;
        }
        counts
    }
}

/// Builds training examples using every record as context
///
/// Stats for each row are aggregated over the whole record set, including
/// matches played after the labeled one.
pub struct TrainingSetBuilder;

impl TrainingSetBuilder {
    /// Build features and labels, failing on the first unmapped result
    pub fn build(records: &[MatchRecord]) -> Result<TrainingSet> {
        let mut features = Vec::with_capacity(records.len());
        let mut labels = Vec::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            let label = record.result.class_index().ok_or_else(|| {
                PredictorError::DataValidation(format!(
                    "row {} ({} vs {}): invalid result '{}', expected HomeWin, Draw or AwayWin",
                    row, record.home_team, record.away_team, record.result
                ))
            })?;

            features.push(MatchFeatures::for_fixture(
                &record.home_team,
                &record.away_team,
                records,
            ));
            labels.push(label);
        }

        let set = TrainingSet { features, labels };
        log::info!(
            "Built {} training examples (home/draw/away: {:?})",
            set.len(),
            set.class_counts()
        );
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResultLabel;

    fn make_match(home: &str, away: &str, result: ResultLabel) -> MatchRecord {
        MatchRecord {
            league: "Liga I".to_string(),
            season: None,
            date: None,
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: 1,
            away_goals: 0,
            result,
        }
    }

    #[test]
    fn test_labels_and_alignment() {
        let records = vec![
            make_match("A", "B", ResultLabel::HomeWin),
            make_match("B", "C", ResultLabel::Draw),
            make_match("C", "A", ResultLabel::AwayWin),
        ];

        let set = TrainingSetBuilder::build(&records).unwrap();
        assert_eq!(set.len(), 3);
        assert_eq!(set.features.len(), 3);
        assert_eq!(set.labels, vec![0, 1, 2]);
        assert_eq!(set.class_counts(), [1, 1, 1]);

        // Row 0 uses whole-history stats for A and B
        let expected = MatchFeatures::for_fixture("A", "B", &records);
        assert_eq!(set.features[0], expected);
    }

    #[test]
    fn test_invalid_result_aborts_build() {
        let records = vec![
            make_match("A", "B", ResultLabel::HomeWin),
            make_match("B", "C", ResultLabel::Other("Abandoned".to_string())),
            make_match("C", "A", ResultLabel::AwayWin),
        ];

        let err = TrainingSetBuilder::build(&records).unwrap_err();
        assert!(matches!(err, PredictorError::DataValidation(_)));
        assert!(err.to_string().contains("Abandoned"));
    }

    #[test]
    fn test_empty_records() {
        let set = TrainingSetBuilder::build(&[]).unwrap();
        assert!(set.is_empty());
    }
}
