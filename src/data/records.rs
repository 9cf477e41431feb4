//! Match record loading from tabular (CSV) datasets

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::{MatchRecord, PredictorError, Result, ResultLabel};

/// Columns every dataset must provide
pub const REQUIRED_COLUMNS: [&str; 6] = [
    "HomeTeam",
    "AwayTeam",
    "Result",
    "HomeGoals",
    "AwayGoals",
    "League",
];

/// Read-only collection of match records for a session
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<MatchRecord>,
}

/// Column positions resolved from the header row
struct ColumnIndex {
    home_team: usize,
    away_team: usize,
    result: usize,
    home_goals: usize,
    away_goals: usize,
    league: usize,
    season: Option<usize>,
    date: Option<usize>,
}

impl ColumnIndex {
    fn from_header(header: &[String]) -> Result<Self> {
        let find = |name: &str| header.iter().position(|h| h.trim() == name);

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| find(*name).is_none())
            .collect();
        if !missing.is_empty() {
            return Err(PredictorError::DataValidation(format!(
                "required columns missing: {}",
                missing.join(", ")
            )));
        }

        let required = |name: &str| find(name).unwrap_or_default();
        Ok(ColumnIndex {
            home_team: required("HomeTeam"),
            away_team: required("AwayTeam"),
            result: required("Result"),
            home_goals: required("HomeGoals"),
            away_goals: required("AwayGoals"),
            league: required("League"),
            season: find("Season"),
            date: find("Date"),
        })
    }
}

impl RecordSet {
    pub fn new(records: Vec<MatchRecord>) -> Self {
        RecordSet { records }
    }

    /// Load a CSV dataset from disk
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            PredictorError::DataValidation(format!("cannot open {}: {}", path.display(), e))
        })?;
        let set = Self::from_reader(BufReader::new(file))?;
        log::info!("Loaded {} matches from {}", set.len(), path.display());
        Ok(set)
    }

    /// Parse a CSV dataset with a header row
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut lines = reader.lines();

        let header = match lines.next() {
            Some(line) => split_csv_line(line?.trim_start_matches('\u{feff}')),
            None => return Err(PredictorError::DataValidation("dataset is empty".into())),
        };
        let columns = ColumnIndex::from_header(&header)?;

        let mut records = Vec::new();
        // A quoted field may span several physical lines
        let mut pending = String::new();
        let mut start_line = 0;
        for (i, line) in lines.enumerate() {
            let line = line?;
            // Header is line 1
            let line_no = i + 2;
            if pending.is_empty() {
                if line.trim().is_empty() {
                    continue;
                }
                start_line = line_no;
                pending = line;
            } else {
                pending.push('\n');
                pending.push_str(&line);
            }

            if has_open_quote(&pending) {
                continue;
            }
            let fields = split_csv_line(&pending);
            records.push(parse_record(&fields, &columns, start_line)?);
            pending.clear();
        }

        if !pending.is_empty() {
            return Err(PredictorError::DataValidation(format!(
                "line {}: unterminated quoted field",
                start_line
            )));
        }

        Ok(RecordSet { records })
    }

    pub fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct home teams of a league
    pub fn list_teams(&self, league: &str) -> Vec<String> {
        self.records
            .iter()
            .filter(|r| r.league == league)
            .map(|r| r.home_team.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted distinct leagues
    pub fn leagues(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| r.league.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Earliest and latest dated match, if any row carries a date
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let mut dates = self.records.iter().filter_map(|r| r.date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

fn parse_record(fields: &[String], columns: &ColumnIndex, line_no: usize) -> Result<MatchRecord> {
    let optional = |idx: Option<usize>| {
        idx.and_then(|i| fields.get(i))
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    };

    Ok(MatchRecord {
        league: field(fields, columns.league, "League", line_no)?.to_string(),
        season: optional(columns.season).map(str::to_string),
        date: optional(columns.date).and_then(parse_date),
        home_team: field(fields, columns.home_team, "HomeTeam", line_no)?.to_string(),
        away_team: field(fields, columns.away_team, "AwayTeam", line_no)?.to_string(),
        home_goals: parse_goals(
            field(fields, columns.home_goals, "HomeGoals", line_no)?,
            "HomeGoals",
            line_no,
        )?,
        away_goals: parse_goals(
            field(fields, columns.away_goals, "AwayGoals", line_no)?,
            "AwayGoals",
            line_no,
        )?,
        result: ResultLabel::parse(field(fields, columns.result, "Result", line_no)?),
    })
}

fn field<'a>(fields: &'a [String], idx: usize, name: &str, line_no: usize) -> Result<&'a str> {
    fields.get(idx).map(|s| s.trim()).ok_or_else(|| {
        PredictorError::DataValidation(format!("line {}: missing value for {}", line_no, name))
    })
}

/// Goals may be written as integers or as whole floats ("2.0")
fn parse_goals(raw: &str, column: &str, line_no: usize) -> Result<u32> {
    if let Ok(goals) = raw.parse::<u32>() {
        return Ok(goals);
    }
    match raw.parse::<f64>() {
        Ok(v) if v >= 0.0 && v.fract() == 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(PredictorError::DataValidation(format!(
            "line {}: invalid {} value '{}'",
            line_no, column, raw
        ))),
    }
}

/// Accepts ISO dates/timestamps and day-first dates
fn parse_date(raw: &str) -> Option<NaiveDate> {
    raw.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%Y").ok())
        .or_else(|| NaiveDate::parse_from_str(raw, "%d/%m/%y").ok())
}

/// Odd quote count means a quoted field continues on the next line
fn has_open_quote(record: &str) -> bool {
    record.chars().filter(|&c| c == '"').count() % 2 == 1
}

/// Split one CSV record, honouring double-quoted fields
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}
