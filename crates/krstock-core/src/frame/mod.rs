//! 키로 정렬되는 테이블 데이터 모델.
//!
//! 소스가 돌려주는 비정규화 테이블(`RawFrame`)과, 키가 보장된 정렬
//! 테이블(`Frame<K>`)을 제공합니다. 키 종류는 셋입니다:
//! - `DailyKey` - (일자, 종목코드) 복합 키. 시계열 저장소의 키.
//! - `String` - 종목코드 단일 키. 하루치 테이블의 키.
//! - `NaiveDate` - 일자 단일 키. 단일 종목 시계열의 키.
//!
//! `Frame`은 `BTreeMap`을 사용하므로 행은 항상 키 오름차순으로
//! 유지됩니다. 복합 키의 경우 일자 오름차순, 같은 일자 안에서는
//! 종목코드 오름차순입니다.

pub mod columns;
mod value;

pub use value::{parse_date, Value, ValueKind};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, StockError};

/// 비정규화 테이블. 컬럼 이름 순서와 행 순서를 그대로 보존합니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RawFrame {
    /// 주어진 컬럼 이름으로 빈 테이블을 생성합니다.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// 행을 추가합니다. 컬럼 수와 값 개수가 다르면 `Schema` 에러입니다.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(StockError::Schema(format!(
                "행의 값 개수({})가 컬럼 수({})와 다릅니다",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub(crate) fn push_row_unchecked(&mut self, row: Vec<Value>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    /// 컬럼 이름 목록.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 컬럼 이름의 첫 번째 위치.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 행 반복자.
    pub fn rows(&self) -> impl Iterator<Item = &[Value]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// 행 수.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 행이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 지정한 컬럼의 문자열 셀을 날짜로 파싱해 교체합니다.
    ///
    /// 컬럼이 없으면 아무 일도 하지 않습니다. 파싱할 수 없는 셀은
    /// `Validation` 에러이며 테이블은 변경되지 않습니다.
    pub fn normalize_date_column(&mut self, name: &str) -> Result<()> {
        let Some(idx) = self.column_index(name) else {
            return Ok(());
        };
        let mut normalized = Vec::with_capacity(self.rows.len());
        for row in &self.rows {
            let cell = match &row[idx] {
                Value::Date(d) => Value::Date(*d),
                Value::Text(s) => Value::Date(parse_date(s)?),
                Value::Null => Value::Null,
                other => {
                    return Err(StockError::Validation(format!(
                        "'{}' 컬럼에 날짜가 아닌 값이 있습니다: {}",
                        name, other
                    )))
                }
            };
            normalized.push(cell);
        }
        for (row, cell) in self.rows.iter_mut().zip(normalized) {
            row[idx] = cell;
        }
        Ok(())
    }
}

/// 테이블 키 trait. 키 컬럼 이름과 행 값 사이의 변환을 정의합니다.
pub trait FrameKey: Ord + Clone + fmt::Display {
    /// 키를 구성하는 컬럼 이름들.
    const KEY_COLUMNS: &'static [&'static str];

    /// 키 컬럼 순서대로 나열된 값들에서 키를 만듭니다.
    fn from_values(values: &[Value]) -> Result<Self>;

    /// 키를 컬럼 값 순서대로 되돌립니다.
    fn to_values(&self) -> Vec<Value>;
}

/// (일자, 종목코드) 복합 키.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DailyKey {
    /// 일자
    pub date: NaiveDate,
    /// 종목코드
    pub symbol: String,
}

impl DailyKey {
    /// 새 복합 키를 생성합니다.
    pub fn new(date: NaiveDate, symbol: impl Into<String>) -> Self {
        Self {
            date,
            symbol: symbol.into(),
        }
    }
}

impl fmt::Display for DailyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.date, self.symbol)
    }
}

impl FrameKey for DailyKey {
    const KEY_COLUMNS: &'static [&'static str] = &[columns::DATE, columns::SYMBOL];

    fn from_values(values: &[Value]) -> Result<Self> {
        let date = match values.first() {
            Some(Value::Date(d)) => *d,
            Some(Value::Text(s)) => parse_date(s)?,
            other => {
                return Err(StockError::Validation(format!(
                    "일자 키 값이 올바르지 않습니다: {:?}",
                    other
                )))
            }
        };
        let symbol = match values.get(1) {
            Some(Value::Text(s)) => s.clone(),
            other => {
                return Err(StockError::Validation(format!(
                    "종목코드 키 값이 올바르지 않습니다: {:?}",
                    other
                )))
            }
        };
        Ok(DailyKey { date, symbol })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Date(self.date), Value::Text(self.symbol.clone())]
    }
}

impl FrameKey for String {
    const KEY_COLUMNS: &'static [&'static str] = &[columns::SYMBOL];

    fn from_values(values: &[Value]) -> Result<Self> {
        match values.first() {
            Some(Value::Text(s)) => Ok(s.clone()),
            other => Err(StockError::Validation(format!(
                "종목코드 키 값이 올바르지 않습니다: {:?}",
                other
            ))),
        }
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Text(self.clone())]
    }
}

impl FrameKey for NaiveDate {
    const KEY_COLUMNS: &'static [&'static str] = &[columns::DATE];

    fn from_values(values: &[Value]) -> Result<Self> {
        match values.first() {
            Some(Value::Date(d)) => Ok(*d),
            Some(Value::Text(s)) => parse_date(s),
            other => Err(StockError::Validation(format!(
                "일자 키 값이 올바르지 않습니다: {:?}",
                other
            ))),
        }
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Date(*self)]
    }
}

/// 키가 보장된 정렬 테이블.
///
/// 값 컬럼만 `columns`에 들어가며, 키 컬럼은 키 자체에만 존재합니다.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame<K: FrameKey> {
    columns: Vec<String>,
    rows: BTreeMap<K, Vec<Value>>,
}

impl<K: FrameKey> Default for Frame<K> {
    fn default() -> Self {
        Self {
            columns: Vec::new(),
            rows: BTreeMap::new(),
        }
    }
}

impl<K: FrameKey> Frame<K> {
    /// 주어진 값 컬럼으로 빈 테이블을 생성합니다.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: BTreeMap::new(),
        }
    }

    /// 비정규화 테이블을 키 테이블로 정규화합니다.
    ///
    /// - 키 컬럼이 없으면 `Schema` 에러.
    /// - 중복된 컬럼 이름은 첫 번째 것만 유지.
    /// - 일자 키 값은 달력 날짜로 정규화 (파싱 실패는 `Validation`).
    /// - 한 테이블 안에서 키가 중복되면 `Validation` 에러.
    pub fn from_raw(raw: &RawFrame) -> Result<Self> {
        let mut key_indices = Vec::with_capacity(K::KEY_COLUMNS.len());
        for key_col in K::KEY_COLUMNS {
            let idx = raw.column_index(key_col).ok_or_else(|| {
                StockError::Schema(format!("키 컬럼 '{}'이 필요합니다", key_col))
            })?;
            key_indices.push(idx);
        }

        let mut columns: Vec<String> = Vec::new();
        let mut value_indices: Vec<usize> = Vec::new();
        for (idx, name) in raw.columns().iter().enumerate() {
            if K::KEY_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            if columns.iter().any(|c| c == name) {
                continue;
            }
            columns.push(name.clone());
            value_indices.push(idx);
        }

        let mut rows = BTreeMap::new();
        for row in raw.rows() {
            let key_values: Vec<Value> =
                key_indices.iter().map(|&i| row[i].clone()).collect();
            let key = K::from_values(&key_values)?;
            let values: Vec<Value> =
                value_indices.iter().map(|&i| row[i].clone()).collect();
            if rows.insert(key.clone(), values).is_some() {
                return Err(StockError::Validation(format!(
                    "중복된 키가 있습니다: {}",
                    key
                )));
            }
        }

        Ok(Self { columns, rows })
    }

    /// 값 컬럼 이름 목록 (키 컬럼 제외).
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// 값 컬럼 이름의 위치.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 행 수.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// 행이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 키에 해당하는 행.
    pub fn get<Q>(&self, key: &Q) -> Option<&[Value]>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rows.get(key).map(|v| v.as_slice())
    }

    /// 키에 해당하는 행 (가변).
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut Vec<Value>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rows.get_mut(key)
    }

    /// (키, 컬럼)에 해당하는 셀.
    pub fn cell<Q>(&self, key: &Q, column: &str) -> Option<&Value>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let idx = self.column_index(column)?;
        self.rows.get(key).and_then(|row| row.get(idx))
    }

    /// 키 존재 여부.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rows.contains_key(key)
    }

    /// 키 오름차순 행 반복자.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &[Value])> {
        self.rows.iter().map(|(k, v)| (k, v.as_slice()))
    }

    /// 키 오름차순 키 반복자.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.rows.keys()
    }

    /// 행을 삽입합니다. 같은 키의 기존 행은 통째로 교체됩니다.
    pub fn insert(&mut self, key: K, values: Vec<Value>) -> Result<Option<Vec<Value>>> {
        if values.len() != self.columns.len() {
            return Err(StockError::Schema(format!(
                "행의 값 개수({})가 컬럼 수({})와 다릅니다",
                values.len(),
                self.columns.len()
            )));
        }
        Ok(self.rows.insert(key, values))
    }

    /// 키에 해당하는 행을 제거합니다.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<Vec<Value>>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.rows.remove(key)
    }

    /// 조건을 만족하는 행만 남깁니다.
    pub fn retain<F>(&mut self, mut f: F)
    where
        F: FnMut(&K, &[Value]) -> bool,
    {
        self.rows.retain(|k, v| f(k, v.as_slice()));
    }

    /// 조건을 만족하는 행만 담은 사본을 반환합니다.
    pub fn filtered<F>(&self, f: F) -> Frame<K>
    where
        F: Fn(&K, &[Value]) -> bool,
    {
        Frame {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(k, v)| f(k, v.as_slice()))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    /// 지정한 컬럼들을 목표 종류로 변환한 사본을 반환합니다.
    ///
    /// 테이블에 없는 컬럼은 건너뜁니다. 변환할 수 없는 셀이 하나라도
    /// 있으면 `Parse` 에러이며 원본은 변경되지 않습니다.
    pub fn cast_columns(&self, mapping: &[(&str, ValueKind)]) -> Result<Frame<K>> {
        let targets: Vec<(usize, ValueKind)> = mapping
            .iter()
            .filter_map(|(name, kind)| self.column_index(name).map(|idx| (idx, *kind)))
            .collect();

        let mut out = self.clone();
        for row in out.rows.values_mut() {
            for &(idx, kind) in &targets {
                row[idx] = row[idx].cast(kind)?;
            }
        }
        Ok(out)
    }

    /// 키 컬럼을 앞에 붙인 비정규화 테이블로 되돌립니다.
    pub fn to_raw(&self) -> RawFrame {
        let mut all_columns: Vec<String> =
            K::KEY_COLUMNS.iter().map(|s| s.to_string()).collect();
        all_columns.extend(self.columns.iter().cloned());

        let mut raw = RawFrame::new(all_columns);
        for (key, values) in &self.rows {
            let mut row = key.to_values();
            row.extend(values.iter().cloned());
            raw.push_row_unchecked(row);
        }
        raw
    }
}

impl Frame<DailyKey> {
    /// 존재하는 일자들 (오름차순, 중복 제거).
    pub fn distinct_dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = Vec::new();
        for key in self.rows.keys() {
            if dates.last() != Some(&key.date) {
                dates.push(key.date);
            }
        }
        dates
    }

    /// 가장 최근 일자.
    pub fn last_date(&self) -> Option<NaiveDate> {
        self.rows.keys().next_back().map(|k| k.date)
    }

    /// 지정한 일자의 행들을 종목코드 키 테이블로 떼어냅니다.
    pub fn day_by_symbol(&self, date: NaiveDate) -> Frame<String> {
        Frame {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(k, _)| k.date == date)
                .map(|(k, v)| (k.symbol.clone(), v.clone()))
                .collect(),
        }
    }

    /// 가장 최근 일자의 행들을 종목코드 키 테이블로 떼어냅니다.
    /// 빈 테이블이면 값 컬럼만 유지한 빈 테이블을 돌려줍니다.
    pub fn latest_by_symbol(&self) -> (Frame<String>, Option<NaiveDate>) {
        match self.last_date() {
            Some(last) => (self.day_by_symbol(last), Some(last)),
            None => (Frame::new(self.columns.clone()), None),
        }
    }

    /// 한 종목의 시계열을 일자 키 테이블로 떼어냅니다.
    pub fn symbol_series(&self, symbol: &str) -> Frame<NaiveDate> {
        Frame {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|(k, _)| k.symbol == symbol)
                .map(|(k, v)| (k.date, v.clone()))
                .collect(),
        }
    }
}
