use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::data::utils::naive_ts;

/// ====== 설비 CSV 레코드 ======
/// 컬럼 이름은 공장 데이터베이스 테이블의 이름을 그대로 따릅니다.

/// 생산 완료 시각 (Produktionszeiten)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionTick {
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub timestamp: NaiveDateTime,
}

/// 생산 중단 구간 (Standzeiten)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdlePeriod {
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub start: NaiveDateTime,
    #[serde(rename = "End Timestamp", with = "naive_ts")]
    pub end: NaiveDateTime,
}

/// 공구 교체 이벤트 (Werkzeugwechsel)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolChange {
    #[serde(rename = "ToolID")]
    pub tool_id: u32,
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Timestamp End", with = "naive_ts::option", default)]
    pub timestamp_end: Option<NaiveDateTime>,
}

/// 축 보정 기록 (Achse)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AxisAdjustment {
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "TD", default)]
    pub td: String,
    #[serde(rename = "Verstellung")]
    pub adjustment: f64,
    #[serde(rename = "Ursprüngliche Achseneinstellung", default)]
    pub original_setting: Option<f64>,
    #[serde(rename = "Neue Achseneinstellung", default)]
    pub new_setting: Option<f64>,
    #[serde(rename = "Achse", default)]
    pub axis: String,
}

/// 전력 측정값 (Energy)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergySample {
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Power (W)", default)]
    pub power: Option<f64>,
    #[serde(rename = "Current (A)", default)]
    pub current: Option<f64>,
    #[serde(rename = "Voltage (V)", default)]
    pub voltage: Option<f64>,
}

/// NCU 알람 로그 한 건 (Alarm)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlarmEntry {
    #[serde(rename = "Error Code")]
    pub error_code: String,
    #[serde(rename = "NCU Message")]
    pub message: String,
    #[serde(rename = "Timestamp", with = "naive_ts")]
    pub timestamp: NaiveDateTime,
    #[serde(rename = "Timestamp End", with = "naive_ts")]
    pub timestamp_end: NaiveDateTime,
}

/// 공구 교체 이후 경과 시간 기준 축 보정값
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelativeAdjustment {
    /// 공구 교체 이후 경과 시간 (시간 단위)
    #[serde(rename = "Relative_Time")]
    pub relative_hours: f64,
    #[serde(rename = "Verstellung")]
    pub adjustment: f64,
}

/// 경과 시간 히스토그램 구간
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DensityBin {
    pub bin_center: f64,
    pub count: usize,
}
