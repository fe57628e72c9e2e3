//! 넥스트레이드(NXT) 일별 시세 수집기.
//!
//! 대체거래소 넥스트레이드의 종목별 거래현황 게시판을 호출합니다.
//! KRX와 달리 값이 JSON 숫자로 내려오고, 관리구분/변동코드/시가총액/
//! 상장주식수는 제공하지 않습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use krstock_core::config::SourceConfig;
use krstock_core::domain::{quotes_to_frame, DailyQuote, DailyQuoteSource, QUOTE_COLUMNS};
use krstock_core::error::{Result, StockError};
use krstock_core::frame::RawFrame;
use krstock_core::types::Market;

use super::{recent_via_daily, USER_AGENT};

const DEFAULT_BASE_URL: &str = "https://nextrade.co.kr";
const ORIGIN: &str = "https://nextrade.co.kr";
const REFERER: &str = "https://nextrade.co.kr/menu/transactionStatusMain/menuList.do";

/// 거래현황 게시판 응답 래퍼.
#[derive(Debug, Deserialize)]
struct NxtResponse {
    #[serde(default)]
    rows: Vec<NxtRow>,
}

/// 게시판의 원시 행.
#[derive(Debug, Deserialize)]
struct NxtRow {
    #[serde(rename = "isuSrdCd")]
    symbol: String,
    #[serde(rename = "isuCd")]
    isin: String,
    #[serde(rename = "isuAbwdNm")]
    name: String,
    #[serde(rename = "mktNm")]
    market: String,
    #[serde(rename = "curPrc")]
    close: i64,
    #[serde(rename = "contrastPrc")]
    change: i64,
    #[serde(rename = "upDownRate")]
    change_rate: Decimal,
    #[serde(rename = "oppr")]
    open: i64,
    #[serde(rename = "hgpr")]
    high: i64,
    #[serde(rename = "lwpr")]
    low: i64,
    #[serde(rename = "accTdQty")]
    volume: i64,
    #[serde(rename = "accTrval")]
    trading_value: i64,
    #[serde(rename = "mktId")]
    market_id: String,
}

/// 넥스트레이드 일별 시세 수집기.
///
/// 게시판 조회에는 시장 구분 조건이 없어 항상 전 종목을 반환합니다.
#[derive(Debug, Clone)]
pub struct NxtDailySource {
    client: reqwest::Client,
    base_url: String,
    pacing_delay: Duration,
    max_lookback_days: u32,
}

impl NxtDailySource {
    /// 설정값으로 수집기를 생성합니다.
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .user_agent(USER_AGENT)
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            base_url: DEFAULT_BASE_URL.to_string(),
            pacing_delay: Duration::from_secs(config.pacing_delay_secs),
            max_lookback_days: config.max_lookback_days,
        }
    }

    /// 기본 엔드포인트 대신 다른 주소를 바라보게 합니다.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for NxtDailySource {
    fn default() -> Self {
        Self::new(&SourceConfig::default())
    }
}

#[async_trait]
impl DailyQuoteSource for NxtDailySource {
    async fn fetch_daily(&self, date: NaiveDate, _market: Market) -> Result<RawFrame> {
        let url = format!("{}/brdinfoTime/brdinfoTimeListAll.do", self.base_url);
        let agg_dd = date.format("%Y%m%d").to_string();
        let nd = chrono::Utc::now().timestamp_millis().to_string();
        let payload = [
            ("pageUnit", "20"),
            ("scAggDd", agg_dd.as_str()),
            ("scMktId", ""),
            ("searchKeyword", ""),
            ("_search", "false"),
            ("nd", nd.as_str()),
            ("pageIndex", "1"),
            ("sidx", ""),
            ("sord", "asc"),
        ];

        debug!(%date, "NXT 일별 시세 요청");

        let response = self
            .client
            .post(&url)
            .form(&payload)
            .header("Accept", "application/json, text/javascript, */*; q=0.01")
            .header("Origin", ORIGIN)
            .header("Referer", REFERER)
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(|e| StockError::Fetch(format!("NXT 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(StockError::Fetch(format!(
                "NXT 응답 상태 이상: {}",
                response.status()
            )));
        }

        let body: NxtResponse = response
            .json()
            .await
            .map_err(|e| StockError::Fetch(format!("NXT 응답 본문 파싱 실패: {}", e)))?;

        Ok(build_frame(date, body.rows))
    }

    async fn fetch_recent(&self, market: Market) -> Result<RawFrame> {
        recent_via_daily(self, market, self.pacing_delay, self.max_lookback_days).await
    }
}

/// 종목코드를 정규화합니다. 앞의 `A`를 떼고 6자리로 왼쪽을 0으로 채웁니다.
fn normalize_symbol(raw: &str) -> String {
    let stripped = raw.strip_prefix('A').unwrap_or(raw);
    format!("{:0>6}", stripped)
}

fn build_frame(date: NaiveDate, rows: Vec<NxtRow>) -> RawFrame {
    if rows.is_empty() {
        return RawFrame::new(QUOTE_COLUMNS);
    }
    quotes_to_frame(rows.into_iter().map(|row| to_quote(date, row)))
}

fn to_quote(date: NaiveDate, row: NxtRow) -> DailyQuote {
    DailyQuote {
        date,
        symbol: normalize_symbol(&row.symbol),
        isin: row.isin,
        name: row.name,
        market: row.market,
        admin_state: None,
        close: row.close,
        change_code: None,
        change: row.change,
        change_rate: row.change_rate / dec!(100),
        open: row.open,
        high: row.high,
        low: row.low,
        volume: row.volume,
        trading_value: row.trading_value,
        market_cap: None,
        shares_outstanding: None,
        market_id: Some(row.market_id),
        base_price: row.close - row.change,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use krstock_core::frame::{columns, Value};

    fn wire_row(symbol: &str) -> NxtRow {
        NxtRow {
            symbol: symbol.to_string(),
            isin: "KR7005930003".to_string(),
            name: "삼성전자".to_string(),
            market: "KOSPI".to_string(),
            close: 71_900,
            change: 700,
            change_rate: dec!(0.98),
            open: 71_200,
            high: 72_100,
            low: 71_000,
            volume: 1_234_567,
            trading_value: 88_776_655_443,
            market_id: "NXT".to_string(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 7).unwrap()
    }

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("A005930"), "005930");
        assert_eq!(normalize_symbol("005930"), "005930");
        assert_eq!(normalize_symbol("A35420"), "035420");
    }

    #[test]
    fn test_build_frame_maps_rows() {
        let frame = build_frame(day(), vec![wire_row("A005930")]);
        assert_eq!(frame.columns(), QUOTE_COLUMNS);

        let row = frame.rows().next().unwrap();
        assert_eq!(row[1], Value::Text("005930".to_string()));
        assert_eq!(row[9], Value::Decimal(dec!(0.0098)));
        assert_eq!(row[18], Value::Int(71_200));
        // 넥스트레이드가 주지 않는 항목은 빈 셀로 남는다.
        let admin_idx = frame.column_index(columns::ADMIN_STATE).unwrap();
        let cap_idx = frame.column_index(columns::MARKET_CAP).unwrap();
        assert_eq!(row[admin_idx], Value::Null);
        assert_eq!(row[cap_idx], Value::Null);
    }

    #[test]
    fn test_build_frame_empty_rows() {
        let frame = build_frame(day(), Vec::new());
        assert!(frame.is_empty());
        assert_eq!(frame.columns(), QUOTE_COLUMNS);
    }
}
