use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Number, Value as JsonValue};

use super::model::{MetadataValue, ObsTable};

/// Write an observation table; the format follows the extension (`.csv` or `.json`).
pub fn save_file(table: &ObsTable, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => save_csv(table, path),
        "json" => save_json(table, path),
        other => bail!("Unsupported output extension: .{other}"),
    }?;
    log::info!("Wrote {} observations to {}", table.len(), path.display());
    Ok(())
}

/// Write a color sidecar (`{ "<column>_colors": [...] }`).
pub fn save_colors(colors: &BTreeMap<String, Vec<String>>, path: &Path) -> Result<()> {
    let text = serde_json::to_string_pretty(colors).context("serializing colors")?;
    std::fs::write(path, text).context("writing colors file")
}

fn cell_text(value: &MetadataValue) -> String {
    match value {
        MetadataValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn save_csv(table: &ObsTable, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    let mut header = vec!["index".to_string()];
    header.extend(table.column_names.iter().cloned());
    writer.write_record(&header).context("writing CSV header")?;

    let columns: Vec<_> = table.columns().map(|(_, s)| s).collect();
    for (row, label) in table.index().values().iter().enumerate() {
        let mut record = vec![cell_text(label)];
        record.extend(columns.iter().map(|s| cell_text(&s.value(row))));
        writer
            .write_record(&record)
            .with_context(|| format!("writing CSV row {row}"))?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn metadata_to_json(value: &MetadataValue) -> JsonValue {
    match value {
        MetadataValue::String(s) => JsonValue::String(s.clone()),
        MetadataValue::Integer(i) => JsonValue::Number((*i).into()),
        MetadataValue::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        MetadataValue::Bool(b) => JsonValue::Bool(*b),
        MetadataValue::Null => JsonValue::Null,
    }
}

fn save_json(table: &ObsTable, path: &Path) -> Result<()> {
    let records: Vec<JsonValue> = table
        .index()
        .values()
        .iter()
        .enumerate()
        .map(|(row, label)| {
            let mut obj = Map::new();
            obj.insert("index".to_string(), metadata_to_json(label));
            for (name, series) in table.columns() {
                obj.insert(name.to_string(), metadata_to_json(&series.value(row)));
            }
            JsonValue::Object(obj)
        })
        .collect();
    let text = serde_json::to_string_pretty(&records).context("serializing table")?;
    std::fs::write(path, text).context("writing JSON file")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{load_colors, load_file};
    use crate::data::model::{Index, Series};
    use tempfile::TempDir;

    fn sample_table() -> ObsTable {
        let index = Index::from_labels(["cell_0", "cell_1", "cell_2"]);
        let mut table = ObsTable::new(index.clone());
        let clusters = Series::from_labels([Some("a"), None, Some("b")])
            .with_index(index)
            .unwrap();
        table.insert("clusters", clusters).unwrap();
        table
    }

    #[test]
    fn test_csv_written_then_loaded() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.csv");
        save_file(&sample_table(), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "index,clusters\ncell_0,a\ncell_1,\ncell_2,b\n");

        let loaded = load_file(&path).unwrap();
        assert_eq!(loaded.index(), sample_table().index());
    }

    #[test]
    fn test_json_output_uses_null_for_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("out.json");
        save_file(&sample_table(), &path).unwrap();

        let value: JsonValue =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[1]["index"], "cell_1");
        assert!(value[1]["clusters"].is_null());
        assert_eq!(value[2]["clusters"], "b");
    }

    #[test]
    fn test_colors_sidecar() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("colors.json");
        let colors: BTreeMap<String, Vec<String>> =
            [("clusters_colors".to_string(), vec!["#ff0000".to_string()])].into();
        save_colors(&colors, &path).unwrap();
        assert_eq!(load_colors(&path).unwrap(), colors);
    }

    #[test]
    fn test_unsupported_output() {
        let temp = TempDir::new().unwrap();
        assert!(save_file(&sample_table(), &temp.path().join("out.parquet")).is_err());
    }
}
