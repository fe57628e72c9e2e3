//! 테이블 셀 값 타입.
//!
//! 원천 피드마다 숫자/문자/날짜가 섞여 들어오므로, 셀 하나를 `Value`로
//! 통일해 담습니다. 수집 단계의 숫자 변환 실패는 자리 채움 없이 즉시
//! 에러로 중단됩니다.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, StockError};

/// 테이블 셀 하나의 값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// 결측값
    Null,
    /// 정수 (가격, 거래량, 주식수 등)
    Int(i64),
    /// 십진수 (변동률 등 소수부가 있는 값)
    Decimal(Decimal),
    /// 문자열 (종목명, 시장ID 등)
    Text(String),
    /// 달력 날짜 (시각 없음)
    Date(NaiveDate),
}

/// 셀 값의 종류. 컬럼 형변환과 SQL 타입 매핑에 사용합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Int,
    Decimal,
    Text,
    Date,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Int => write!(f, "int"),
            ValueKind::Decimal => write!(f, "decimal"),
            ValueKind::Text => write!(f, "text"),
            ValueKind::Date => write!(f, "date"),
        }
    }
}

impl Value {
    /// 결측값인지 확인합니다.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// 값의 종류를 반환합니다. 결측값은 종류가 없습니다.
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Int(_) => Some(ValueKind::Int),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Date(_) => Some(ValueKind::Date),
        }
    }

    /// 정수 값을 반환합니다.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// 십진수 값을 반환합니다. 정수 셀은 십진수로 넓혀 반환합니다.
    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Value::Int(v) => Some(Decimal::from(*v)),
            Value::Decimal(v) => Some(*v),
            _ => None,
        }
    }

    /// 문자열 값을 반환합니다.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    /// 날짜 값을 반환합니다.
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(v) => Some(*v),
            _ => None,
        }
    }

    /// 값을 지정한 종류로 변환합니다.
    ///
    /// 결측값은 종류와 무관하게 결측값으로 남습니다.
    /// 변환할 수 없는 값은 `Parse` 에러입니다.
    pub fn cast(&self, kind: ValueKind) -> Result<Value> {
        if self.is_null() {
            return Ok(Value::Null);
        }
        match (self, kind) {
            (Value::Int(v), ValueKind::Int) => Ok(Value::Int(*v)),
            (Value::Int(v), ValueKind::Decimal) => Ok(Value::Decimal(Decimal::from(*v))),
            (Value::Int(v), ValueKind::Text) => Ok(Value::Text(v.to_string())),
            (Value::Decimal(v), ValueKind::Decimal) => Ok(Value::Decimal(*v)),
            (Value::Decimal(v), ValueKind::Int) => {
                if v.fract().is_zero() {
                    v.to_i64().map(Value::Int).ok_or_else(|| {
                        StockError::Parse(format!("정수 범위를 벗어났습니다: {}", v))
                    })
                } else {
                    Err(StockError::Parse(format!(
                        "소수부가 있어 정수로 변환할 수 없습니다: {}",
                        v
                    )))
                }
            }
            (Value::Decimal(v), ValueKind::Text) => Ok(Value::Text(v.to_string())),
            (Value::Text(v), ValueKind::Text) => Ok(Value::Text(v.clone())),
            (Value::Text(v), ValueKind::Int) => v
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| StockError::Parse(format!("정수로 변환할 수 없습니다: '{}'", v))),
            (Value::Text(v), ValueKind::Decimal) => v
                .trim()
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|_| StockError::Parse(format!("십진수로 변환할 수 없습니다: '{}'", v))),
            (Value::Text(v), ValueKind::Date) => parse_date(v).map(Value::Date),
            (Value::Date(v), ValueKind::Date) => Ok(Value::Date(*v)),
            (Value::Date(v), ValueKind::Text) => Ok(Value::Text(v.to_string())),
            (value, kind) => Err(StockError::Parse(format!(
                "{} 값을 {} 종류로 변환할 수 없습니다",
                value, kind
            ))),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, ""),
            Value::Int(v) => write!(f, "{}", v),
            Value::Decimal(v) => write!(f, "{}", v),
            Value::Text(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// 문자열을 달력 날짜로 파싱합니다. 시각 부분은 잘라냅니다.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let trimmed = s.trim();
    let head = trimmed.split(['T', ' ']).next().unwrap_or(trimmed);
    for fmt in ["%Y-%m-%d", "%Y%m%d", "%Y/%m/%d", "%Y.%m.%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(head, fmt) {
            return Ok(date);
        }
    }
    Err(StockError::Validation(format!(
        "날짜로 변환할 수 없습니다: '{}'",
        s
    )))
}
