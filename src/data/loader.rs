use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::compute::cast;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Categorical, Index, MetadataValue, ObsTable, Series};

/// Column names recognised as the row index.
const INDEX_COLUMNS: [&str; 3] = ["index", "", "__index_level_0__"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load an observation table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – dictionary-encoded columns load as categorical (recommended)
/// * `.json`    – `[{ "index": "cell_0", "clusters": "a", ... }, ...]`
/// * `.csv`     – header row, empty cells are missing
///
/// Text formats carry no dtype, so their columns load as plain values; use
/// [`Series::astype_category`] before handing them to the categorical helpers.
pub fn load_file(path: &Path) -> Result<ObsTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;
    log::info!(
        "Loaded {} observations with columns {:?} from {}",
        table.len(),
        table.column_names,
        path.display()
    );
    Ok(table)
}

/// Load a color sidecar: `{ "<column>_colors": ["#e41a1c", ...], ... }`.
pub fn load_colors(path: &Path) -> Result<BTreeMap<String, Vec<String>>> {
    let text = std::fs::read_to_string(path).context("reading colors file")?;
    serde_json::from_str(&text).context("parsing colors JSON")
}

// ---------------------------------------------------------------------------
// Record-oriented assembly shared by the JSON and CSV loaders
// ---------------------------------------------------------------------------

fn table_from_records(
    records: Vec<BTreeMap<String, MetadataValue>>,
    index: Option<Vec<MetadataValue>>,
) -> Result<ObsTable> {
    let column_names: BTreeSet<String> = records
        .iter()
        .flat_map(|r| r.keys().cloned())
        .collect();

    let index = match index {
        Some(labels) => Index::new(labels),
        None => Index::range(records.len()),
    };
    let mut table = ObsTable::new(index.clone());
    for col in column_names {
        let values: Vec<MetadataValue> = records
            .iter()
            .map(|r| r.get(&col).cloned().unwrap_or(MetadataValue::Null))
            .collect();
        let series = Series::from_values(values).with_index(index.clone())?;
        table.insert(&col, series)?;
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "index": "cell_0", "clusters": "Alpha", "terminal_states": null },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<ObsTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    let mut index = Vec::new();
    let mut has_index = false;

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let mut metadata = BTreeMap::new();
        let mut label = MetadataValue::Integer(i as i64);
        for (key, val) in obj {
            if INDEX_COLUMNS.contains(&key.as_str()) {
                has_index = true;
                label = json_to_metadata(val);
                continue;
            }
            metadata.insert(key.clone(), json_to_metadata(val));
        }
        index.push(label);
        rows.push(metadata);
    }

    table_from_records(rows, has_index.then_some(index))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout:  header row with column names, one observation per row.
/// A column named `index` (or the unnamed first column pandas writes) is the
/// row index. Empty cells are missing values.
fn load_csv(path: &Path) -> Result<ObsTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let index_idx = headers
        .iter()
        .position(|h| INDEX_COLUMNS.contains(&h.as_str()));

    let mut rows = Vec::new();
    let mut index = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let mut metadata = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if Some(col_idx) == index_idx {
                index.push(guess_metadata_type(value));
                continue;
            }
            let col_name = headers
                .get(col_idx)
                .with_context(|| format!("CSV row {row_no}: too many fields"))?;
            metadata.insert(col_name.clone(), guess_metadata_type(value));
        }
        rows.push(metadata);
    }

    table_from_records(rows, index_idx.map(|_| index))
}

/// Numbers are only recognised when they print back to the same text, so
/// labels such as `01` or `2.50` keep their spelling.
fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        if i.to_string() == s {
            return MetadataValue::Integer(i);
        }
    }
    if let Ok(f) = s.parse::<f64>() {
        if f.is_finite() && f.to_string() == s {
            return MetadataValue::Float(f);
        }
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Column accumulated across record batches.
enum ColumnBuffer {
    Categorical {
        categories: Vec<String>,
        labels: Vec<Option<String>>,
    },
    Values(Vec<MetadataValue>),
}

/// Load a Parquet file containing an observation table.
///
/// Dictionary-encoded string columns (what **Pandas** writes for
/// `category` dtype) become categorical series with the dictionary order as
/// category order. Any other column is loaded as plain values.
fn load_parquet(path: &Path) -> Result<ObsTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut names: Vec<String> = Vec::new();
    let mut buffers: BTreeMap<String, ColumnBuffer> = BTreeMap::new();
    let mut index: Vec<MetadataValue> = Vec::new();
    let mut has_index = false;
    let mut n_rows = 0usize;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        for (col_idx, field) in schema.fields().iter().enumerate() {
            let col = batch.column(col_idx);
            let name = field.name().clone();

            if INDEX_COLUMNS.contains(&name.as_str()) {
                has_index = true;
                index.extend((0..batch.num_rows()).map(|row| extract_metadata_value(col, row)));
                continue;
            }

            if !buffers.contains_key(&name) {
                names.push(name.clone());
                let buffer = if matches!(col.data_type(), DataType::Dictionary(_, _)) {
                    ColumnBuffer::Categorical {
                        categories: Vec::new(),
                        labels: vec![None; n_rows],
                    }
                } else {
                    ColumnBuffer::Values(vec![MetadataValue::Null; n_rows])
                };
                buffers.insert(name.clone(), buffer);
            }
            let buffer = buffers
                .get_mut(&name)
                .context("column buffer disappeared")?;
            append_column(buffer, col)
                .with_context(|| format!("reading column '{name}'"))?;
        }
        n_rows += batch.num_rows();
    }

    let index = if has_index {
        Index::new(index)
    } else {
        Index::range(n_rows)
    };
    let mut table = ObsTable::new(index.clone());
    for name in names {
        let Some(buffer) = buffers.remove(&name) else {
            continue;
        };
        let series = match buffer {
            ColumnBuffer::Categorical { categories, labels } => {
                Series::categorical(Categorical::with_categories(categories, labels)?)
            }
            ColumnBuffer::Values(values) => Series::from_values(values),
        };
        table.insert(&name, series.with_index(index.clone())?)?;
    }
    Ok(table)
}

fn append_column(buffer: &mut ColumnBuffer, col: &Arc<dyn Array>) -> Result<()> {
    match buffer {
        ColumnBuffer::Categorical { categories, labels } => {
            let dict = col
                .as_any_dictionary_opt()
                .context("expected a dictionary column")?;
            let values = cast(dict.values(), &DataType::Utf8).context("casting dictionary values")?;
            let values = values.as_string::<i32>();
            let dictionary: Vec<Option<String>> = (0..values.len())
                .map(|i| (!values.is_null(i)).then(|| values.value(i).to_string()))
                .collect();
            for cat in dictionary.iter().flatten() {
                if !categories.contains(cat) {
                    categories.push(cat.clone());
                }
            }
            let keys = dict.normalized_keys();
            for (row, key) in keys.iter().enumerate() {
                let label = if col.is_null(row) {
                    None
                } else {
                    dictionary.get(*key).cloned().flatten()
                };
                labels.push(label);
            }
        }
        ColumnBuffer::Values(values) => {
            values.extend((0..col.len()).map(|row| extract_metadata_value(col, row)));
        }
    }
    Ok(())
}

// -- Parquet / Arrow helpers --

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    let value = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| MetadataValue::String(s.value(row).to_string())),
        DataType::LargeUtf8 => {
            let s = col.as_string::<i64>();
            Some(MetadataValue::String(s.value(row).to_string()))
        }
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| MetadataValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| MetadataValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| MetadataValue::Bool(a.value(row))),
        _ => None,
    };
    value.unwrap_or_else(|| MetadataValue::String(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_csv_with_index() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("obs.csv");
        std::fs::write(
            &path,
            "index,clusters,score\ncell_0,a,1.5\ncell_1,,2\ncell_2,b,\n",
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.column_names, vec!["clusters", "score"]);
        assert_eq!(table.index().values()[1], MetadataValue::from("cell_1"));

        let clusters = table.column("clusters").unwrap().astype_category();
        let cat = clusters.as_categorical().unwrap();
        assert_eq!(
            cat.labels().collect::<Vec<_>>(),
            vec![Some("a"), None, Some("b")]
        );
        assert_eq!(
            table.column("score").unwrap().value(1),
            MetadataValue::Integer(2)
        );
    }

    #[test]
    fn test_load_json_records() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("obs.json");
        std::fs::write(
            &path,
            r#"[{"clusters": "a", "flag": true}, {"clusters": null}]"#,
        )
        .unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.index(), &Index::range(2));
        let clusters = table.column("clusters").unwrap();
        assert!(!clusters.is_categorical());
        assert_eq!(clusters.value(1), MetadataValue::Null);
        assert_eq!(table.column("flag").unwrap().value(1), MetadataValue::Null);
    }

    #[test]
    fn test_csv_labels_keep_their_text() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("obs.csv");
        std::fs::write(&path, "index,clusters\nc0,01\nc1,1\nc2,2.50\nc3,2.5\n").unwrap();

        let table = load_file(&path).unwrap();
        let clusters = table.column("clusters").unwrap();
        assert_eq!(clusters.value(0), MetadataValue::from("01"));
        assert_eq!(clusters.value(1), MetadataValue::Integer(1));
        assert_eq!(clusters.value(2), MetadataValue::from("2.50"));
        assert_eq!(clusters.value(3), MetadataValue::Float(2.5));

        let clusters = clusters.astype_category();
        let cat = clusters.as_categorical().unwrap();
        assert_eq!(cat.categories().len(), 4);
        assert_eq!(
            cat.labels().collect::<Vec<_>>(),
            vec![Some("01"), Some("1"), Some("2.50"), Some("2.5")]
        );
    }

    #[test]
    fn test_load_colors_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("colors.json");
        std::fs::write(&path, r##"{"clusters_colors": ["red", "#00ff00"]}"##).unwrap();
        let colors = load_colors(&path).unwrap();
        assert_eq!(colors["clusters_colors"], vec!["red", "#00ff00"]);
    }

    #[test]
    fn test_unsupported_extension() {
        let err = load_file(Path::new("obs.h5ad")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }
}
