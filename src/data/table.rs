use chrono::NaiveDateTime;
use color_eyre::eyre::{eyre, Result};

use crate::data::utils;

/// 행의 셀 값을 반환합니다. 짧은 행은 빈 문자열로 취급합니다.
pub fn cell(row: &[String], col: usize) -> &str {
    row.get(col).map(String::as_str).unwrap_or("")
}

/// 셀을 숫자로 읽습니다. 비어 있거나 숫자가 아니면 None.
pub fn numeric(row: &[String], col: usize) -> Option<f64> {
    cell(row, col).trim().parse::<f64>().ok()
}

/// 컬럼 구성이 파일마다 다른 측정 데이터 (Keyence 등) 를 담는 단순 테이블
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn require_column(&self, name: &str) -> Result<usize> {
        self.column_index(name)
            .ok_or_else(|| eyre!("Missing column '{}' (available: {:?})", name, self.headers))
    }

    /// 컬럼 전체를 타임스탬프로 파싱합니다. 하나라도 실패하면 에러.
    pub fn timestamps(&self, name: &str) -> Result<Vec<NaiveDateTime>> {
        let col = self.require_column(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                utils::parse_timestamp(cell(row, col))
                    .map_err(|e| eyre!("Row {}: column '{}': {}", i + 1, name, e))
            })
            .collect()
    }

    /// 컬럼이 없으면 추가하고 인덱스를 반환합니다.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column_index(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        let width = self.headers.len();
        for row in &mut self.rows {
            row.resize(width, String::new());
        }
        width - 1
    }

    /// 조건을 만족하는 행만 남깁니다.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row.as_slice()));
    }

    /// 지정한 컬럼 기준으로 안정 정렬합니다. 파싱 실패 시 에러.
    pub fn sort_by_timestamp(&mut self, name: &str) -> Result<()> {
        let keys = self.timestamps(name)?;
        let mut keyed: Vec<(NaiveDateTime, Vec<String>)> =
            keys.into_iter().zip(self.rows.drain(..)).collect();
        keyed.sort_by_key(|(ts, _)| *ts);
        self.rows = keyed.into_iter().map(|(_, row)| row).collect();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table {
            headers: vec!["Timestamp".into(), "Value".into()],
            rows: vec![
                vec!["2025-03-23 10:00:05".into(), "1.5".into()],
                vec!["2025-03-23 10:00:01".into(), "x".into()],
            ],
        }
    }

    #[test]
    fn test_numeric_and_missing_cells() {
        let table = sample();
        let col = table.require_column("Value").unwrap();
        assert_eq!(numeric(&table.rows[0], col), Some(1.5));
        assert_eq!(numeric(&table.rows[1], col), None);
        assert_eq!(cell(&table.rows[0], 7), "");
        assert!(table.require_column("Nope").is_err());
    }

    #[test]
    fn test_ensure_column_pads_rows() {
        let mut table = sample();
        let idx = table.ensure_column("Timestamp Prod");
        assert_eq!(idx, 2);
        assert!(table.rows.iter().all(|r| r.len() == 3));
        assert_eq!(table.ensure_column("Value"), 1);
    }

    #[test]
    fn test_sort_by_timestamp() {
        let mut table = sample();
        table.sort_by_timestamp("Timestamp").unwrap();
        assert_eq!(table.rows[0][1], "x");
        assert_eq!(table.rows[1][1], "1.5");
    }
}
