//! Record types shared by the parser, merger and output sinks.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Audience category shown by the TİAK daily tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// All people
    Total,
    /// AB socioeconomic segment
    Ab,
    /// 20+ ABC1 segment
    Abc1,
}

impl Category {
    /// All categories, in the order they are scraped.
    pub const ALL: [Category; 3] = [Category::Total, Category::Ab, Category::Abc1];

    /// Key used in output field names (`rank_total`, ...)
    pub fn key(&self) -> &'static str {
        match self {
            Category::Total => "total",
            Category::Ab => "ab",
            Category::Abc1 => "abc1",
        }
    }

    /// Option value of the category `<select>` on the charts page
    pub fn select_value(&self) -> &'static str {
        match self {
            Category::Total => "1",
            Category::Ab => "2",
            Category::Abc1 => "3",
        }
    }

    /// Label as displayed on the site
    pub fn label(&self) -> &'static str {
        match self {
            Category::Total => "All People",
            Category::Ab => "AB",
            Category::Abc1 => "20+ABC1",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" | "all" | "1" => Ok(Category::Total),
            "ab" | "2" => Ok(Category::Ab),
            "abc1" | "20+abc1" | "3" => Ok(Category::Abc1),
            other => anyhow::bail!("Unknown category: {}", other),
        }
    }
}

/// One table row, scoped to a single category
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRecord {
    pub rank: Option<u32>,
    pub channel: String,
    pub start_time: String, // HH:MM
    pub end_time: String,   // HH:MM
    pub rating: Option<f64>,
    pub share: Option<f64>,
}

/// Program name -> record for one category on one date
pub type CategoryExtract = BTreeMap<String, CategoryRecord>;

/// Rank, rating and share measured under one category
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    pub rank: Option<u32>,
    pub rating: Option<f64>,
    pub share: Option<f64>,
}

impl From<&CategoryRecord> for Measurement {
    fn from(record: &CategoryRecord) -> Self {
        Self {
            rank: record.rank,
            rating: record.rating,
            share: record.share,
        }
    }
}

/// A program with its measurements under every category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MergedProgram {
    pub name: String,
    pub channel: String,
    pub start_time: String,
    pub end_time: String,
    pub rank_total: Option<u32>,
    pub rating_total: Option<f64>,
    pub share_total: Option<f64>,
    pub rank_ab: Option<u32>,
    pub rating_ab: Option<f64>,
    pub share_ab: Option<f64>,
    pub rank_abc1: Option<u32>,
    pub rating_abc1: Option<f64>,
    pub share_abc1: Option<f64>,
}

impl MergedProgram {
    /// Measurement for a category (all fields `None` if the program was not listed)
    pub fn measurement(&self, category: Category) -> Measurement {
        match category {
            Category::Total => Measurement {
                rank: self.rank_total,
                rating: self.rating_total,
                share: self.share_total,
            },
            Category::Ab => Measurement {
                rank: self.rank_ab,
                rating: self.rating_ab,
                share: self.share_ab,
            },
            Category::Abc1 => Measurement {
                rank: self.rank_abc1,
                rating: self.rating_abc1,
                share: self.share_abc1,
            },
        }
    }

    pub fn set_measurement(&mut self, category: Category, m: Measurement) {
        let (rank, rating, share) = match category {
            Category::Total => (&mut self.rank_total, &mut self.rating_total, &mut self.share_total),
            Category::Ab => (&mut self.rank_ab, &mut self.rating_ab, &mut self.share_ab),
            Category::Abc1 => (&mut self.rank_abc1, &mut self.rating_abc1, &mut self.share_abc1),
        };
        *rank = m.rank;
        *rating = m.rating;
        *share = m.share;
    }
}

/// Merged output for one broadcast date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    #[serde(with = "iso_date")]
    pub date: NaiveDate,
    pub programs: Vec<MergedProgram>,
}

impl DailyReport {
    /// Programs ranked under `category`, best first.
    ///
    /// Unranked programs are left out. Equal ranks keep their existing order.
    pub fn ranked_by(&self, category: Category) -> Vec<&MergedProgram> {
        let mut ranked: Vec<_> = self
            .programs
            .iter()
            .filter(|p| p.measurement(category).rank.is_some())
            .collect();
        ranked.sort_by_key(|p| p.measurement(category).rank);
        ranked
    }
}

mod iso_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(name: &str, rank_total: Option<u32>) -> MergedProgram {
        MergedProgram {
            name: name.to_string(),
            rank_total,
            ..Default::default()
        }
    }

    #[test]
    fn test_report_json_shape() {
        let report = DailyReport {
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            programs: vec![MergedProgram {
                name: "Show A".to_string(),
                channel: "ChX".to_string(),
                start_time: "20:00".to_string(),
                end_time: "22:00".to_string(),
                rank_total: Some(1),
                rating_total: Some(5.2),
                share_total: Some(18.4),
                ..Default::default()
            }],
        };

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["date"], "2025-03-07");
        let p = &value["programs"][0];
        assert_eq!(p["name"], "Show A");
        assert_eq!(p["rank_total"], 1);
        assert_eq!(p["rating_total"], 5.2);
        assert!(p["rank_ab"].is_null());
        assert!(p["share_abc1"].is_null());

        let back: DailyReport = serde_json::from_value(value).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn test_measurement_accessors() {
        let mut p = MergedProgram::default();
        let m = Measurement {
            rank: Some(4),
            rating: Some(1.5),
            share: None,
        };
        p.set_measurement(Category::Ab, m);

        assert_eq!(p.measurement(Category::Ab), m);
        assert_eq!(p.rank_ab, Some(4));
        assert_eq!(p.measurement(Category::Total), Measurement::default());
    }

    #[test]
    fn test_ranked_by_skips_unranked() {
        let report = DailyReport {
            date: NaiveDate::from_ymd_opt(2025, 3, 7).unwrap(),
            programs: vec![
                program("C", Some(3)),
                program("None", None),
                program("A", Some(1)),
                program("B", Some(2)),
            ],
        };

        let names: Vec<_> = report
            .ranked_by(Category::Total)
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("total".parse::<Category>().unwrap(), Category::Total);
        assert_eq!("AB".parse::<Category>().unwrap(), Category::Ab);
        assert_eq!("20+ABC1".parse::<Category>().unwrap(), Category::Abc1);
        assert!("c2".parse::<Category>().is_err());
    }
}
