//! First/last-year join of simulator summaries onto stand features.

use serde::Serialize;

use crate::error::{Result, StandsimError};
use crate::features::FeatureStore;
use crate::metrics::MetricField;
use crate::output::{OutputTable, YearRange};

#[derive(Debug, Clone, Serialize)]
pub struct JoinSummary {
    /// `None` only when the output table is empty and nothing was joined.
    pub years: Option<YearRange>,
    pub columns: Vec<String>,
}

/// Join `fields` onto `store` twice: each stand's first-year row suffixed
/// `_<first>`, then rows at the last year suffixed `_<last>`.
///
/// A single-year table yields one column set, since both passes would
/// produce identical column names from identical rows.
pub fn join_results<S: FeatureStore + ?Sized>(
    table: &OutputTable,
    store: &mut S,
    fields: &[MetricField],
) -> Result<JoinSummary> {
    let years = table.year_range()?;
    if fields.is_empty() {
        return Ok(JoinSummary {
            years,
            columns: Vec::new(),
        });
    }
    let range = years.ok_or(StandsimError::NoOutputRows)?;

    let first_rows = table.first_year_rows(fields)?;
    let mut columns = store.join_fields(&first_rows, fields, range.first)?;

    if range.last != range.first {
        let last_rows = table.rows_for_year(range.last, fields)?;
        columns.extend(store.join_fields(&last_rows, fields, range.last)?);
    } else {
        tracing::debug!(year = range.first, "single-year output; one column set");
    }

    tracing::info!(
        first = range.first,
        last = range.last,
        columns = columns.len(),
        "joined results onto features"
    );
    Ok(JoinSummary {
        years: Some(range),
        columns,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::{collection_of, GeoJsonStore};
    use serde_json::{json, Map, Value};
    use tempfile::TempDir;

    fn table(dir: &TempDir) -> OutputTable {
        let t = OutputTable::open(&dir.path().join("out.db")).unwrap();
        t.reset().unwrap();
        t
    }

    fn props<'a>(store: &'a GeoJsonStore, i: usize) -> &'a Map<String, Value> {
        store.collection()["features"][i]["properties"]
            .as_object()
            .unwrap()
    }

    #[test]
    fn first_and_last_year_columns() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        for year in 0..=3 {
            t.insert(
                "S1",
                year,
                &[
                    (MetricField::StandAge, 40.0 + year as f64),
                    (MetricField::BasalArea, 100.0 + 10.0 * year as f64),
                ],
            )
            .unwrap();
        }
        let mut store =
            GeoJsonStore::from_value("stands.geojson", collection_of(&[("S1", Map::new())]));

        let fields = [MetricField::StandAge, MetricField::BasalArea];
        let summary = join_results(&t, &mut store, &fields).unwrap();

        assert_eq!(summary.years, Some(YearRange { first: 0, last: 3 }));
        assert_eq!(summary.columns, vec!["Age_0", "BA_0", "Age_3", "BA_3"]);
        let p = props(&store, 0);
        assert_eq!(p["Age_0"], json!(40.0));
        assert_eq!(p["BA_0"], json!(100.0));
        assert_eq!(p["Age_3"], json!(43.0));
        assert_eq!(p["BA_3"], json!(130.0));
        assert!(!p.contains_key("Age_1"));
        assert!(!p.contains_key("Age_2"));
    }

    #[test]
    fn first_year_is_not_insertion_order_dependent() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        for year in [2, 0, 1] {
            t.insert("S1", year, &[(MetricField::StandAge, 40.0 + year as f64)])
                .unwrap();
        }
        let mut store =
            GeoJsonStore::from_value("stands.geojson", collection_of(&[("S1", Map::new())]));
        join_results(&t, &mut store, &[MetricField::StandAge]).unwrap();
        assert_eq!(props(&store, 0)["Age_0"], json!(40.0));
        assert_eq!(props(&store, 0)["Age_2"], json!(42.0));
    }

    #[test]
    fn every_feature_gets_columns() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        for stand in ["S1", "S2"] {
            for year in 0..=1 {
                t.insert(stand, year, &[(MetricField::TopHeight, 50.0)]).unwrap();
            }
        }
        let mut store = GeoJsonStore::from_value(
            "stands.geojson",
            collection_of(&[("S1", Map::new()), ("S2", Map::new()), ("S3", Map::new())]),
        );
        join_results(&t, &mut store, &[MetricField::TopHeight]).unwrap();

        assert_eq!(props(&store, 1)["TopHt_1"], json!(50.0));
        assert_eq!(props(&store, 2)["TopHt_0"], Value::Null);
        assert_eq!(props(&store, 2)["TopHt_1"], Value::Null);
    }

    #[test]
    fn single_year_output_yields_one_column_set() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        t.insert("S1", 0, &[(MetricField::StandAge, 40.0)]).unwrap();
        let mut store =
            GeoJsonStore::from_value("stands.geojson", collection_of(&[("S1", Map::new())]));
        let summary = join_results(&t, &mut store, &[MetricField::StandAge]).unwrap();
        assert_eq!(summary.years, Some(YearRange { first: 0, last: 0 }));
        assert_eq!(summary.columns, vec!["Age_0"]);
    }

    #[test]
    fn no_fields_still_reports_years() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        t.insert("S1", 0, &[]).unwrap();
        t.insert("S1", 4, &[]).unwrap();
        let mut store =
            GeoJsonStore::from_value("stands.geojson", collection_of(&[("S1", Map::new())]));
        let summary = join_results(&t, &mut store, &[]).unwrap();
        assert_eq!(summary.years, Some(YearRange { first: 0, last: 4 }));
        assert!(summary.columns.is_empty());
        assert_eq!(props(&store, 0).len(), 1);
    }

    #[test]
    fn fields_against_empty_table_fail() {
        let dir = TempDir::new().unwrap();
        let t = table(&dir);
        let mut store =
            GeoJsonStore::from_value("stands.geojson", collection_of(&[("S1", Map::new())]));
        let err = join_results(&t, &mut store, &[MetricField::StandAge]).unwrap_err();
        assert!(matches!(err, StandsimError::NoOutputRows));
    }
}
