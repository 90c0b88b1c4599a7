//! Stand features: the source of stand ids and the target of result joins.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::{Result, StandsimError};
use crate::job::check_stand_id;
use crate::metrics::MetricField;
use crate::output::MetricRow;

/// Mandatory join-key property on every stand feature.
pub const STAND_ID_FIELD: &str = "Stand_ID";

pub trait FeatureStore {
    /// Stand ids in feature order, each listed once.
    fn stand_ids(&self) -> Result<Vec<String>>;

    /// Attach `rows` to features by stand id, naming each new column
    /// `<code>_<year>`. Features without a matching row get `null`.
    /// Returns the column names added.
    fn join_fields(
        &mut self,
        rows: &HashMap<String, MetricRow>,
        fields: &[MetricField],
        year: i64,
    ) -> Result<Vec<String>>;
}

// ---------------------------------------------------------------------------
// GeoJsonStore
// ---------------------------------------------------------------------------

/// A GeoJSON FeatureCollection held in memory. Geometry is carried
/// through untouched; only `properties` are read and extended.
#[derive(Debug, Clone)]
pub struct GeoJsonStore {
    source: PathBuf,
    collection: Value,
}

impl GeoJsonStore {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let collection: Value = serde_json::from_str(&data)?;
        Ok(Self {
            source: path.to_path_buf(),
            collection,
        })
    }

    pub fn from_value(source: impl Into<PathBuf>, collection: Value) -> Self {
        Self {
            source: source.into(),
            collection,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_json::to_string_pretty(&self.collection)?;
        crate::io::atomic_write(path, data.as_bytes())
    }

    pub fn collection(&self) -> &Value {
        &self.collection
    }

    fn features(&self) -> &[Value] {
        self.collection
            .get("features")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn missing_key(&self) -> StandsimError {
        StandsimError::MissingStandIdField(self.source.display().to_string())
    }
}

fn stand_id_of(feature: &Value) -> Option<String> {
    match feature.get("properties")?.get(STAND_ID_FIELD)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl FeatureStore for GeoJsonStore {
    fn stand_ids(&self) -> Result<Vec<String>> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for feature in self.features() {
            let id = stand_id_of(feature).ok_or_else(|| self.missing_key())?;
            check_stand_id(&id)?;
            if seen.insert(id.clone()) {
                ids.push(id);
            } else {
                tracing::warn!(stand = %id, "duplicate stand id; later features share its results");
            }
        }
        Ok(ids)
    }

    fn join_fields(
        &mut self,
        rows: &HashMap<String, MetricRow>,
        fields: &[MetricField],
        year: i64,
    ) -> Result<Vec<String>> {
        let columns: Vec<String> = fields.iter().map(|f| f.joined_column(year)).collect();
        let source = self.source.display().to_string();

        let Some(features) = self
            .collection
            .get_mut("features")
            .and_then(Value::as_array_mut)
        else {
            return Ok(columns);
        };

        for feature in features.iter_mut() {
            let id = stand_id_of(feature)
                .ok_or_else(|| StandsimError::MissingStandIdField(source.clone()))?;
            let row = rows.get(&id);
            let Some(props) = feature
                .get_mut("properties")
                .and_then(Value::as_object_mut)
            else {
                continue;
            };
            for (field, column) in fields.iter().zip(&columns) {
                let value = row
                    .and_then(|r| r.get(field.code()))
                    .cloned()
                    .unwrap_or(Value::Null);
                props.insert(column.clone(), value);
            }
        }
        Ok(columns)
    }
}

/// Build a FeatureCollection from `(stand id, extra properties)` pairs.
/// Geometry is left null.
#[cfg(test)]
pub(crate) fn collection_of(stands: &[(&str, Map<String, Value>)]) -> Value {
    let features: Vec<Value> = stands
        .iter()
        .map(|(id, extra)| {
            let mut props = extra.clone();
            props.insert(STAND_ID_FIELD.to_string(), Value::from(*id));
            serde_json::json!({
                "type": "Feature",
                "geometry": null,
                "properties": props,
            })
        })
        .collect();
    serde_json::json!({ "type": "FeatureCollection", "features": features })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store(value: Value) -> GeoJsonStore {
        GeoJsonStore::from_value("stands.geojson", value)
    }

    #[test]
    fn stand_ids_in_feature_order() {
        let s = store(collection_of(&[("S2", Map::new()), ("S1", Map::new())]));
        assert_eq!(s.stand_ids().unwrap(), vec!["S2", "S1"]);
    }

    #[test]
    fn numeric_stand_ids_are_stringified() {
        let s = store(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": null, "properties": { "Stand_ID": 17 } }]
        }));
        assert_eq!(s.stand_ids().unwrap(), vec!["17"]);
    }

    #[test]
    fn missing_stand_id_is_an_error() {
        let s = store(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": null, "properties": { "Name": "north" } }]
        }));
        let err = s.stand_ids().unwrap_err();
        assert!(matches!(err, StandsimError::MissingStandIdField(ref p) if p == "stands.geojson"));
    }

    #[test]
    fn control_characters_in_stand_id_are_rejected() {
        let s = store(json!({
            "type": "FeatureCollection",
            "features": [{ "type": "Feature", "geometry": null, "properties": { "Stand_ID": "S1\nSTOP" } }]
        }));
        assert!(matches!(
            s.stand_ids().unwrap_err(),
            StandsimError::InvalidStandId(_)
        ));
    }

    #[test]
    fn duplicate_ids_are_collapsed() {
        let s = store(collection_of(&[
            ("S1", Map::new()),
            ("S2", Map::new()),
            ("S1", Map::new()),
        ]));
        assert_eq!(s.stand_ids().unwrap(), vec!["S1", "S2"]);
    }

    #[test]
    fn join_adds_suffixed_columns_and_nulls() {
        let mut s = store(collection_of(&[("S1", Map::new()), ("S9", Map::new())]));
        let mut row = Map::new();
        row.insert("Age".to_string(), json!(40.0));
        let rows = HashMap::from([("S1".to_string(), row)]);

        let cols = s.join_fields(&rows, &[MetricField::StandAge], 0).unwrap();
        assert_eq!(cols, vec!["Age_0"]);

        let features = s.collection()["features"].as_array().unwrap();
        assert_eq!(features[0]["properties"]["Age_0"], json!(40.0));
        assert_eq!(features[1]["properties"]["Age_0"], Value::Null);
    }

    #[test]
    fn join_preserves_geometry_and_existing_properties() {
        let mut s = store(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "geometry": { "type": "Point", "coordinates": [1.0, 2.0] },
                "properties": { "Stand_ID": "S1", "Owner": "state" }
            }]
        }));
        s.join_fields(&HashMap::new(), &[MetricField::BasalArea], 5).unwrap();
        let f = &s.collection()["features"][0];
        assert_eq!(f["geometry"]["coordinates"], json!([1.0, 2.0]));
        assert_eq!(f["properties"]["Owner"], json!("state"));
        assert_eq!(f["properties"]["BA_5"], Value::Null);
    }

    #[test]
    fn save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("joined.geojson");
        let s = store(collection_of(&[("S1", Map::new())]));
        s.save(&path).unwrap();
        let loaded = GeoJsonStore::load(&path).unwrap();
        assert_eq!(loaded.stand_ids().unwrap(), vec!["S1"]);
    }
}
