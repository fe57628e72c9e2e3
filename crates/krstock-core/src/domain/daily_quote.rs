//! 일별 시세 레코드.
//!
//! 소스별 응답을 공통 스키마로 눌러 담는 중간 표현입니다. 소스가
//! 주지 않는 항목은 `None`으로 두면 테이블에서 빈 셀이 됩니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::frame::{columns, RawFrame, Value};

/// 일별 시세 테이블의 표준 컬럼 순서.
pub const QUOTE_COLUMNS: [&str; 19] = [
    columns::DATE,
    columns::SYMBOL,
    columns::ISIN,
    columns::NAME,
    columns::MARKET,
    columns::ADMIN_STATE,
    columns::CLOSE,
    columns::CHANGE_CODE,
    columns::CHANGE,
    columns::CHANGE_RATE,
    columns::OPEN,
    columns::HIGH,
    columns::LOW,
    columns::VOLUME,
    columns::TRADING_VALUE,
    columns::MARKET_CAP,
    columns::SHARES_OUTSTANDING,
    columns::MARKET_ID,
    columns::BASE_PRICE,
];

/// 한 종목의 하루치 시세.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyQuote {
    /// 일자
    pub date: NaiveDate,
    /// 종목코드 (6자리)
    pub symbol: String,
    /// 표준코드 (ISIN)
    pub isin: String,
    /// 종목명
    pub name: String,
    /// 마켓구분 (KOSPI, KOSDAQ 등)
    pub market: String,
    /// 관리구분
    pub admin_state: Option<String>,
    /// 종가
    pub close: i64,
    /// 변동코드
    pub change_code: Option<String>,
    /// 전일대비
    pub change: i64,
    /// 변동률 (비율, 1.5% -> 0.015)
    pub change_rate: Decimal,
    /// 시가
    pub open: i64,
    /// 고가
    pub high: i64,
    /// 저가
    pub low: i64,
    /// 거래량
    pub volume: i64,
    /// 거래대금
    pub trading_value: i64,
    /// 시가총액
    pub market_cap: Option<i64>,
    /// 상장주식수
    pub shares_outstanding: Option<i64>,
    /// 시장ID (STK, KSQ, KNX, NXT)
    pub market_id: Option<String>,
    /// 기준가 (종가 - 전일대비)
    pub base_price: i64,
}

impl DailyQuote {
    /// `QUOTE_COLUMNS` 순서대로 나열한 행 값.
    pub fn into_row(self) -> Vec<Value> {
        vec![
            Value::Date(self.date),
            Value::Text(self.symbol),
            Value::Text(self.isin),
            Value::Text(self.name),
            Value::Text(self.market),
            Value::from(self.admin_state),
            Value::Int(self.close),
            Value::from(self.change_code),
            Value::Int(self.change),
            Value::Decimal(self.change_rate),
            Value::Int(self.open),
            Value::Int(self.high),
            Value::Int(self.low),
            Value::Int(self.volume),
            Value::Int(self.trading_value),
            Value::from(self.market_cap),
            Value::from(self.shares_outstanding),
            Value::from(self.market_id),
            Value::Int(self.base_price),
        ]
    }
}

/// 시세 레코드들을 표준 컬럼 순서의 테이블로 모읍니다.
pub fn quotes_to_frame<I>(quotes: I) -> RawFrame
where
    I: IntoIterator<Item = DailyQuote>,
{
    let mut raw = RawFrame::new(QUOTE_COLUMNS);
    for quote in quotes {
        raw.push_row_unchecked(quote.into_row());
    }
    raw
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sample_quote() -> DailyQuote {
        DailyQuote {
            date: NaiveDate::from_ymd_opt(2025, 3, 4).unwrap(),
            symbol: "005930".to_string(),
            isin: "KR7005930003".to_string(),
            name: "삼성전자".to_string(),
            market: "KOSPI".to_string(),
            admin_state: Some("-".to_string()),
            close: 71_900,
            change_code: Some("2".to_string()),
            change: 700,
            change_rate: dec!(0.0098),
            open: 71_200,
            high: 72_100,
            low: 71_000,
            volume: 12_345_678,
            trading_value: 887_766_554_433,
            market_cap: Some(429_000_000_000_000),
            shares_outstanding: Some(5_969_782_550),
            market_id: Some("STK".to_string()),
            base_price: 71_200,
        }
    }

    #[test]
    fn test_into_row_matches_columns() {
        let row = sample_quote().into_row();
        assert_eq!(row.len(), QUOTE_COLUMNS.len());
        assert_eq!(row[1], Value::Text("005930".to_string()));
        assert_eq!(row[6], Value::Int(71_900));
    }

    #[test]
    fn test_missing_fields_become_null() {
        let mut quote = sample_quote();
        quote.admin_state = None;
        quote.market_cap = None;
        let row = quote.into_row();
        assert_eq!(row[5], Value::Null);
        assert_eq!(row[15], Value::Null);
    }

    #[test]
    fn test_quotes_to_frame() {
        let raw = quotes_to_frame(vec![sample_quote()]);
        assert_eq!(raw.columns().len(), 19);
        assert_eq!(raw.len(), 1);
        assert_eq!(raw.column_index(columns::BASE_PRICE), Some(18));
    }
}
