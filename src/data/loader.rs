use color_eyre::eyre::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::data::table::Table;

/// CSV 파일에서 레코드를 로드합니다.
pub fn load_records<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    reader
        .deserialize()
        .enumerate()
        .map(|(i, record)| {
            record.with_context(|| format!("Failed to parse record {} in {:?}", i + 1, path))
        })
        .collect()
}

/// 레코드를 CSV 파일로 내보냅니다. 상위 폴더가 없으면 생성합니다.
pub fn write_records<T, P>(records: &[T], path: P) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    for record in records {
        writer
            .serialize(record)
            .with_context(|| format!("Failed to write record to {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {:?}", path))?;

    Ok(())
}

/// 헤더가 있는 CSV 파일을 컬럼 구성 그대로 Table 로 로드합니다.
pub fn load_table<P: AsRef<Path>>(path: P) -> Result<Table> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to open CSV file: {:?}", path))?;

    let headers = reader
        .headers()
        .with_context(|| format!("Failed to read CSV header: {:?}", path))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut table = Table::new(headers);
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("Failed to read row {} in {:?}", i + 1, path))?;
        table.rows.push(record.iter().map(|c| c.to_string()).collect());
    }

    Ok(table)
}

/// Table 을 CSV 파일로 저장합니다.
pub fn write_table<P: AsRef<Path>>(table: &Table, path: P) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("Failed to create CSV file: {:?}", path))?;
    writer
        .write_record(&table.headers)
        .with_context(|| format!("Failed to write CSV header: {:?}", path))?;
    for row in &table.rows {
        writer
            .write_record(row)
            .with_context(|| format!("Failed to write row to {:?}", path))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to flush CSV file: {:?}", path))?;

    Ok(())
}

/// JSON 파일을 읽어 역직렬화합니다.
pub fn load_json<T, P>(path: P) -> Result<T>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file_content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read file: {:?}", path.as_ref()))?;

    serde_json::from_str(&file_content)
        .with_context(|| format!("Failed to parse JSON from file: {:?}", path.as_ref()))
}

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::models::{IdlePeriod, ProductionTick};
    use crate::data::utils::parse_timestamp;

    #[test]
    fn test_records_round_trip_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/Standzeiten.csv");

        let periods = vec![IdlePeriod {
            start: parse_timestamp("2025-02-01 06:00:00").unwrap(),
            end: parse_timestamp("2025-02-01 06:05:30.250").unwrap(),
        }];
        write_records(&periods, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("Timestamp,End Timestamp\n"));
        assert!(content.contains("2025-02-01 06:05:30.250"));

        let loaded: Vec<IdlePeriod> = load_records(&path).unwrap();
        assert_eq!(loaded, periods);
    }

    #[test]
    fn test_load_records_reports_bad_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Produktionszeiten.csv");
        fs::write(&path, "Timestamp\n2025-02-01 06:00:00\nkaputt\n").unwrap();

        let err = load_records::<ProductionTick, _>(&path).unwrap_err();
        assert!(format!("{:?}", err).contains("record 2"));
    }

    #[test]
    fn test_table_keeps_dynamic_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Keyence.csv");
        fs::write(
            &path,
            "Timestamp,Measurement ToolID.200,Measurement ToolID.205\n2025-03-23 20:21:00,9.2,\n",
        )
        .unwrap();

        let table = load_table(&path).unwrap();
        assert_eq!(table.headers.len(), 3);
        assert_eq!(table.rows[0][1], "9.2");
        assert_eq!(table.rows[0][2], "");

        let copy = dir.path().join("copy.csv");
        write_table(&table, &copy).unwrap();
        assert_eq!(load_table(&copy).unwrap(), table);
    }

    #[test]
    fn test_load_json_missing_file() {
        let result: Result<serde_json::Value> = load_json("/nonexistent/config.json");
        assert!(result.is_err());
    }
}
