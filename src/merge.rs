//! Merges per-category extracts into one record per program.
//!
//! Programs are joined by name. Channel and air times come from the first
//! category in [`REFERENCE_ORDER`] that lists the program.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Category, CategoryExtract, CategoryRecord, MergedProgram, Measurement};

/// Categories tried, in order, for a program's channel and air times
pub const REFERENCE_ORDER: [Category; 3] = [Category::Total, Category::Ab, Category::Abc1];

/// Merge category extracts into programs, ordered by name.
///
/// Measurements are only filled for categories that list the program.
pub fn merge_extracts(extracts: &BTreeMap<Category, CategoryExtract>) -> Vec<MergedProgram> {
    let names: BTreeSet<&String> = extracts.values().flat_map(|e| e.keys()).collect();

    let mut programs = Vec::with_capacity(names.len());
    for name in names {
        let Some((reference_category, reference)) = reference_record(extracts, name) else {
            continue;
        };

        warn_on_divergence(extracts, name, reference_category, reference);

        let mut program = MergedProgram {
            name: name.clone(),
            channel: reference.channel.clone(),
            start_time: reference.start_time.clone(),
            end_time: reference.end_time.clone(),
            ..Default::default()
        };

        for (&category, extract) in extracts {
            if let Some(record) = extract.get(name) {
                program.set_measurement(category, Measurement::from(record));
            }
        }

        programs.push(program);
    }

    programs
}

/// First record for `name` following [`REFERENCE_ORDER`]
fn reference_record<'a>(
    extracts: &'a BTreeMap<Category, CategoryExtract>,
    name: &str,
) -> Option<(Category, &'a CategoryRecord)> {
    REFERENCE_ORDER.iter().find_map(|category| {
        extracts
            .get(category)
            .and_then(|extract| extract.get(name))
            .map(|record| (*category, record))
    })
}

fn warn_on_divergence(
    extracts: &BTreeMap<Category, CategoryExtract>,
    name: &str,
    reference_category: Category,
    reference: &CategoryRecord,
) {
    for (category, extract) in extracts {
        let Some(other) = extract.get(name) else {
            continue;
        };
        if other.channel != reference.channel
            || other.start_time != reference.start_time
            || other.end_time != reference.end_time
        {
            tracing::warn!(
                "{} differs between {} ({} {}-{}) and {} ({} {}-{}), keeping {}",
                name,
                reference_category,
                reference.channel,
                reference.start_time,
                reference.end_time,
                category,
                other.channel,
                other.start_time,
                other.end_time,
                reference_category
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rank: u32, channel: &str, start: &str, rating: f64) -> CategoryRecord {
        CategoryRecord {
            rank: Some(rank),
            channel: channel.to_string(),
            start_time: start.to_string(),
            end_time: "23:00".to_string(),
            rating: Some(rating),
            share: Some(rating * 3.0),
        }
    }

    fn extract(entries: &[(&str, CategoryRecord)]) -> CategoryExtract {
        entries
            .iter()
            .map(|(name, r)| (name.to_string(), r.clone()))
            .collect()
    }

    fn sample() -> BTreeMap<Category, CategoryExtract> {
        BTreeMap::from([
            (
                Category::Total,
                extract(&[
                    ("Show A", record(1, "ChX", "20:00", 5.2)),
                    ("Show B", record(2, "ChY", "21:00", 4.0)),
                ]),
            ),
            (
                Category::Ab,
                extract(&[
                    ("Show A", record(2, "ChX", "20:00", 3.1)),
                    ("Show C", record(1, "ChZ", "22:00", 3.5)),
                ]),
            ),
            (
                Category::Abc1,
                extract(&[
                    ("Show C", record(1, "ChW", "22:30", 2.9)),
                    ("Show D", record(2, "ChV", "19:00", 2.0)),
                ]),
            ),
        ])
    }

    #[test]
    fn test_merge_is_union_of_names() {
        let extracts = sample();
        let merged = merge_extracts(&extracts);

        let names: BTreeSet<_> = merged.iter().map(|p| p.name.clone()).collect();
        let expected: BTreeSet<_> = extracts
            .values()
            .flat_map(|e| e.keys().cloned())
            .collect();
        assert_eq!(names, expected);
        assert_eq!(merged.len(), 4);
    }

    #[test]
    fn test_program_in_all_categories() {
        let merged = merge_extracts(&sample());
        let a = merged.iter().find(|p| p.name == "Show A").unwrap();

        assert_eq!(a.channel, "ChX");
        assert_eq!(a.rank_total, Some(1));
        assert_eq!(a.rating_total, Some(5.2));
        assert_eq!(a.rank_ab, Some(2));
        assert_eq!(a.rating_ab, Some(3.1));
        assert_eq!(a.rank_abc1, None);
    }

    #[test]
    fn test_reference_falls_back_to_ab() {
        let merged = merge_extracts(&sample());
        let c = merged.iter().find(|p| p.name == "Show C").unwrap();

        // Absent from total: reference is ab, not abc1
        assert_eq!(c.channel, "ChZ");
        assert_eq!(c.start_time, "22:00");
        assert_eq!(c.rank_total, None);
        assert_eq!(c.rating_total, None);
        assert_eq!(c.share_total, None);
        assert_eq!(c.rank_abc1, Some(1));
    }

    #[test]
    fn test_reference_falls_back_to_abc1() {
        let merged = merge_extracts(&sample());
        let d = merged.iter().find(|p| p.name == "Show D").unwrap();

        assert_eq!(d.channel, "ChV");
        assert_eq!(d.start_time, "19:00");
        assert_eq!(d.measurement(Category::Total), Measurement::default());
        assert_eq!(d.measurement(Category::Ab), Measurement::default());
        assert_eq!(d.rank_abc1, Some(2));
    }

    #[test]
    fn test_absent_measurements_stay_absent() {
        let mut extracts = sample();
        extracts.get_mut(&Category::Total).unwrap().insert(
            "Unmeasured".to_string(),
            CategoryRecord {
                rank: None,
                channel: "ChX".to_string(),
                start_time: "02:00".to_string(),
                end_time: "03:00".to_string(),
                rating: None,
                share: Some(0.0),
            },
        );

        let merged = merge_extracts(&extracts);
        let u = merged.iter().find(|p| p.name == "Unmeasured").unwrap();
        assert_eq!(u.rank_total, None);
        assert_eq!(u.rating_total, None);
        assert_eq!(u.share_total, Some(0.0));
    }

    #[test]
    fn test_empty_categories() {
        let extracts = BTreeMap::from([
            (Category::Total, CategoryExtract::new()),
            (Category::Ab, CategoryExtract::new()),
            (Category::Abc1, CategoryExtract::new()),
        ]);
        assert!(merge_extracts(&extracts).is_empty());
    }

    #[test]
    fn test_missing_category_entry() {
        let mut extracts = sample();
        extracts.remove(&Category::Total);

        let merged = merge_extracts(&extracts);
        let a = merged.iter().find(|p| p.name == "Show A").unwrap();
        assert_eq!(a.rank_total, None);
        assert_eq!(a.rank_ab, Some(2));
        assert!(!merged.iter().any(|p| p.name == "Show B"));
    }
}
