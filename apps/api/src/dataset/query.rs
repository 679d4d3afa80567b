//! Read-only queries over the enrollment dataset: filter options, filtered
//! group-by sums, and the overall summary.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::dataset::record::{Dataset, Record};

// ────────────────────────────────────────────────────────────────────────────
// Dimensions
// ────────────────────────────────────────────────────────────────────────────

/// A field eligible for filtering and grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Institution,
    Program,
    Department,
    Year,
    Gender,
    Municipality,
}

impl Dimension {
    /// Resolves the tag used by the dashboard (`institucion`, `año`, ...).
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "institucion" => Some(Self::Institution),
            "programa" => Some(Self::Program),
            "departamento" => Some(Self::Department),
            "año" => Some(Self::Year),
            "genero" => Some(Self::Gender),
            "municipio" => Some(Self::Municipality),
            _ => None,
        }
    }

    /// Like `from_tag`, but also accepts the `Año` column label older clients send.
    pub fn from_group_by(tag: &str) -> Option<Self> {
        Self::from_tag(tag).or_else(|| (tag == "Año").then_some(Self::Year))
    }

    fn key(self, record: &Record) -> GroupKey {
        match self {
            Self::Institution => GroupKey::Text(record.institution.clone()),
            Self::Program => GroupKey::Text(record.program.clone()),
            Self::Department => GroupKey::Text(record.department.clone()),
            Self::Municipality => GroupKey::Text(record.municipality.clone()),
            Self::Year => GroupKey::Number(record.year),
            Self::Gender => GroupKey::Number(record.gender),
        }
    }

    fn text_value(self, record: &Record) -> Option<&str> {
        match self {
            Self::Institution => Some(&record.institution),
            Self::Program => Some(&record.program),
            Self::Department => Some(&record.department),
            Self::Municipality => Some(&record.municipality),
            Self::Year | Self::Gender => None,
        }
    }
}

/// A group label. Serialized bare: strings for categorical dimensions, integers
/// for year and gender.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum GroupKey {
    Number(i32),
    Text(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Filter options
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderOption {
    pub id: i32,
    pub label: &'static str,
}

/// The gender mapping is fixed; it is not derived from the data.
pub const GENDER_OPTIONS: [GenderOption; 2] = [
    GenderOption {
        id: 1,
        label: "Hombres",
    },
    GenderOption {
        id: 2,
        label: "Mujeres",
    },
];

/// Valid values for one dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FilterOptions {
    Text(Vec<String>),
    Years(Vec<i32>),
    Genders(Vec<GenderOption>),
}

impl FilterOptions {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::Years(v) => v.len(),
            Self::Genders(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Filters and results
// ────────────────────────────────────────────────────────────────────────────

/// Exact-match predicates, combined with AND. `None` means "don't filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub institution: Option<String>,
    pub program: Option<String>,
    pub department: Option<String>,
    pub municipality: Option<String>,
    pub year: Option<i32>,
    pub gender: Option<i32>,
}

impl Filters {
    pub fn matches(&self, record: &Record) -> bool {
        fn text_ok(filter: &Option<String>, value: &str) -> bool {
            filter.as_deref().map_or(true, |f| f == value)
        }

        text_ok(&self.institution, &record.institution)
            && text_ok(&self.program, &record.program)
            && text_ok(&self.department, &record.department)
            && text_ok(&self.municipality, &record.municipality)
            && self.year.map_or(true, |y| y == record.year)
            && self.gender.map_or(true, |g| g == record.gender)
    }
}

/// Chart-ready group-by result. `labels` and `values` are parallel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate {
    pub labels: Vec<GroupKey>,
    pub values: Vec<u64>,
    /// Records that passed the filter, counted before grouping.
    pub total_registros: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    #[serde(rename = "totalMatriculas")]
    pub total_matriculas: u64,
    #[serde(rename = "porAño")]
    pub por_anio: BTreeMap<i32, u64>,
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

impl Dataset {
    /// Lists valid values for the dimension named by `tag`.
    ///
    /// Unknown tags yield an empty list rather than an error; the dashboard
    /// relies on that.
    pub fn filter_options(&self, tag: &str) -> FilterOptions {
        let Some(dimension) = Dimension::from_tag(tag) else {
            return FilterOptions::Text(Vec::new());
        };

        match dimension {
            Dimension::Gender => FilterOptions::Genders(GENDER_OPTIONS.to_vec()),
            Dimension::Year => {
                let mut years: Vec<i32> = self.records().iter().map(|r| r.year).collect();
                years.sort_unstable_by(|a, b| b.cmp(a));
                years.dedup();
                FilterOptions::Years(years)
            }
            _ => {
                let mut values: Vec<String> = self
                    .records()
                    .iter()
                    .filter_map(|r| dimension.text_value(r))
                    .map(str::to_string)
                    .collect();
                values.sort_unstable();
                values.dedup();
                FilterOptions::Text(values)
            }
        }
    }

    /// Filters with AND semantics, then sums enrolled counts per `group_by` key.
    /// Groups come out in ascending key order.
    pub fn aggregate(&self, filters: &Filters, group_by: Dimension) -> Aggregate {
        let mut groups: BTreeMap<GroupKey, u64> = BTreeMap::new();
        let mut total_registros = 0usize;

        for record in self.records().iter().filter(|r| filters.matches(r)) {
            total_registros += 1;
            *groups.entry(group_by.key(record)).or_default() += record.enrolled;
        }

        let (labels, values) = groups.into_iter().unzip();
        Aggregate {
            labels,
            values,
            total_registros,
        }
    }

    /// Grand total plus per-year totals over the whole, unfiltered dataset.
    pub fn summary(&self) -> Summary {
        let mut por_anio: BTreeMap<i32, u64> = BTreeMap::new();
        for record in self.records() {
            *por_anio.entry(record.year).or_default() += record.enrolled;
        }

        Summary {
            total_matriculas: por_anio.values().sum(),
            por_anio,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;

    #[test]
    fn test_unknown_dimension_returns_empty_options() {
        let dataset = sample_dataset();
        for tag in ["", "carrera", "Año", "INSTITUCION"] {
            assert!(dataset.filter_options(tag).is_empty(), "tag {tag:?}");
        }
    }

    #[test]
    fn test_year_options_sorted_descending() {
        let dataset = sample_dataset();
        assert_eq!(
            dataset.filter_options("año"),
            FilterOptions::Years(vec![2023, 2022, 2021])
        );
    }

    #[test]
    fn test_categorical_options_sorted_ascending_and_distinct() {
        let dataset = sample_dataset();
        assert_eq!(
            dataset.filter_options("institucion"),
            FilterOptions::Text(vec![
                "UNIVERSIDAD DE ANTIOQUIA".to_string(),
                "UNIVERSIDAD DEL VALLE".to_string(),
                "UNIVERSIDAD NACIONAL".to_string(),
            ])
        );
        assert_eq!(
            dataset.filter_options("municipio"),
            FilterOptions::Text(vec![
                "BOGOTA D.C.".to_string(),
                "CALI".to_string(),
                "MEDELLIN".to_string(),
            ])
        );
    }

    #[test]
    fn test_gender_options_are_static() {
        let empty = Dataset::default();
        assert_eq!(
            empty.filter_options("genero"),
            FilterOptions::Genders(GENDER_OPTIONS.to_vec())
        );
    }

    #[test]
    fn test_gender_options_serialize_as_id_label_objects() {
        let json = serde_json::to_value(sample_dataset().filter_options("genero")).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"id": 1, "label": "Hombres"}, {"id": 2, "label": "Mujeres"}])
        );
    }

    #[test]
    fn test_unfiltered_year_aggregate_matches_summary_total() {
        let dataset = sample_dataset();
        let aggregate = dataset.aggregate(&Filters::default(), Dimension::Year);
        let summed: u64 = aggregate.values.iter().sum();

        assert_eq!(summed, dataset.summary().total_matriculas);
        assert_eq!(aggregate.total_registros, dataset.len());
        assert_eq!(
            aggregate.labels,
            vec![
                GroupKey::Number(2021),
                GroupKey::Number(2022),
                GroupKey::Number(2023)
            ]
        );
        assert_eq!(aggregate.values, vec![95, 1950, 280]);
    }

    #[test]
    fn test_filters_combine_with_and() {
        let dataset = sample_dataset();
        let filters = Filters {
            year: Some(2022),
            gender: Some(2),
            ..Filters::default()
        };
        let aggregate = dataset.aggregate(&filters, Dimension::Institution);

        assert_eq!(aggregate.total_registros, 2);
        assert_eq!(
            aggregate.labels,
            vec![
                GroupKey::Text("UNIVERSIDAD DE ANTIOQUIA".to_string()),
                GroupKey::Text("UNIVERSIDAD NACIONAL".to_string()),
            ]
        );
        assert_eq!(aggregate.values, vec![300, 450]);
    }

    #[test]
    fn test_non_matching_filter_yields_empty_result() {
        let dataset = sample_dataset();
        let filters = Filters {
            institution: Some("NO EXISTE".to_string()),
            ..Filters::default()
        };
        let aggregate = dataset.aggregate(&filters, Dimension::Year);

        assert!(aggregate.labels.is_empty());
        assert!(aggregate.values.is_empty());
        assert_eq!(aggregate.total_registros, 0);
    }

    #[test]
    fn test_summary_is_idempotent() {
        let dataset = sample_dataset();
        let first = dataset.summary();
        assert_eq!(first, dataset.summary());
        assert_eq!(first.total_matriculas, 2325);
        assert_eq!(first.por_anio.get(&2022), Some(&1950));
    }

    #[test]
    fn test_summary_serializes_year_keys_as_strings() {
        let json = serde_json::to_value(sample_dataset().summary()).unwrap();
        assert_eq!(json["totalMatriculas"], 2325);
        assert_eq!(json["porAño"]["2021"], 95);
    }

    #[test]
    fn test_group_by_accepts_legacy_column_label() {
        assert_eq!(Dimension::from_group_by("Año"), Some(Dimension::Year));
        assert_eq!(Dimension::from_group_by("programa"), Some(Dimension::Program));
        assert_eq!(Dimension::from_group_by("Total Matriculados"), None);
    }
}
