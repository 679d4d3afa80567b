use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::dataset::{Aggregate, Dimension, FilterOptions, Filters, Summary};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct FilterTypeQuery {
    pub tipo: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FilterOptionsResponse {
    pub opciones: FilterOptions,
}

/// Query string of `/api/datos-filtrados`. Every value arrives as text; empty
/// values mean "not filtered".
#[derive(Debug, Default, Deserialize)]
pub struct FilteredDataQuery {
    pub institucion: Option<String>,
    pub programa: Option<String>,
    pub departamento: Option<String>,
    #[serde(rename = "año")]
    pub anio: Option<String>,
    pub genero: Option<String>,
    pub municipio: Option<String>,
    #[serde(rename = "groupBy")]
    pub group_by: Option<String>,
}

impl FilteredDataQuery {
    pub fn into_filters(self) -> Result<(Filters, Dimension), AppError> {
        let group_by = match non_empty(self.group_by) {
            None => Dimension::Year,
            Some(tag) => Dimension::from_group_by(&tag)
                .ok_or_else(|| AppError::Validation(format!("Unknown groupBy '{tag}'")))?,
        };

        let filters = Filters {
            institution: non_empty(self.institucion),
            program: non_empty(self.programa),
            department: non_empty(self.departamento),
            municipality: non_empty(self.municipio),
            year: parse_int("año", self.anio)?,
            gender: parse_int("genero", self.genero)?,
        };

        Ok((filters, group_by))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn parse_int(name: &str, value: Option<String>) -> Result<Option<i32>, AppError> {
    non_empty(value)
        .map(|v| {
            v.trim()
                .parse::<i32>()
                .map_err(|_| AppError::Validation(format!("'{name}' must be an integer, got '{v}'")))
        })
        .transpose()
}

/// GET /api/filtros?tipo=<dimension>
pub async fn handle_filter_options(
    State(state): State<AppState>,
    Query(params): Query<FilterTypeQuery>,
) -> Json<FilterOptionsResponse> {
    let tag = params.tipo.unwrap_or_default();
    Json(FilterOptionsResponse {
        opciones: state.dataset.filter_options(&tag),
    })
}

/// GET /api/datos-filtrados
pub async fn handle_filtered_data(
    State(state): State<AppState>,
    Query(params): Query<FilteredDataQuery>,
) -> Result<Json<Aggregate>, AppError> {
    let (filters, group_by) = params.into_filters()?;
    let aggregate = state.dataset.aggregate(&filters, group_by);

    tracing::debug!(
        groups = aggregate.labels.len(),
        matched = aggregate.total_registros,
        "Filtered aggregate computed"
    );
    Ok(Json(aggregate))
}

/// GET /api/resumen
pub async fn handle_summary(State(state): State<AppState>) -> Json<Summary> {
    Json(state.dataset.summary())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query_defaults_to_year_and_no_filters() {
        let (filters, group_by) = FilteredDataQuery::default().into_filters().unwrap();
        assert_eq!(filters, Filters::default());
        assert_eq!(group_by, Dimension::Year);
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let query = FilteredDataQuery {
            institucion: Some(String::new()),
            anio: Some(String::new()),
            group_by: Some(String::new()),
            ..FilteredDataQuery::default()
        };
        let (filters, group_by) = query.into_filters().unwrap();
        assert_eq!(filters, Filters::default());
        assert_eq!(group_by, Dimension::Year);
    }

    #[test]
    fn test_numeric_filters_are_parsed() {
        let query = FilteredDataQuery {
            anio: Some("2023".to_string()),
            genero: Some("2".to_string()),
            group_by: Some("municipio".to_string()),
            ..FilteredDataQuery::default()
        };
        let (filters, group_by) = query.into_filters().unwrap();
        assert_eq!(filters.year, Some(2023));
        assert_eq!(filters.gender, Some(2));
        assert_eq!(group_by, Dimension::Municipality);
    }

    #[test]
    fn test_non_numeric_year_is_validation_error() {
        let query = FilteredDataQuery {
            anio: Some("dos mil".to_string()),
            ..FilteredDataQuery::default()
        };
        assert!(matches!(
            query.into_filters(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_unknown_group_by_is_validation_error() {
        let query = FilteredDataQuery {
            group_by: Some("Total Matriculados".to_string()),
            ..FilteredDataQuery::default()
        };
        assert!(matches!(
            query.into_filters(),
            Err(AppError::Validation(_))
        ));
    }
}
