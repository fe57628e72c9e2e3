//! KRX 정보데이터시스템 일별 시세 수집기.
//!
//! data.krx.co.kr의 전종목 시세 화면(MDCSTAT01501)을 그대로 호출합니다.
//! 응답은 천 단위 쉼표와 `-` 자리표시자가 섞인 문자열 테이블이므로,
//! 여기서 정리 규칙을 적용해 표준 시세 테이블로 변환합니다.
//!
//! # 정리 규칙
//!
//! - 모든 셀에서 쉼표와 공백을 제거한다.
//! - 전일대비/변동률을 제외한 셀에서 `-`를 제거한다. 두 컬럼은 음수를
//!   가질 수 있다.
//! - 전 종목의 전일대비가 `-`이면 휴장일이므로 빈 테이블을 반환한다.
//! - 가격 컬럼의 정수 변환 실패는 수집 실패로 즉시 중단한다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use krstock_core::config::SourceConfig;
use krstock_core::domain::{quotes_to_frame, DailyQuote, DailyQuoteSource, QUOTE_COLUMNS};
use krstock_core::error::{Result, StockError};
use krstock_core::frame::{columns, RawFrame};
use krstock_core::types::Market;

use super::{recent_via_daily, USER_AGENT};

const DEFAULT_BASE_URL: &str = "http://data.krx.co.kr";
const REFERER: &str = "http://data.krx.co.kr/contents/MDC/MDI/mdiLoader/index.cmd";
const BLD: &str = "dbms/MDC/STAT/standard/MDCSTAT01501";

/// KRX 정보데이터시스템 응답 래퍼.
#[derive(Debug, Deserialize)]
struct KrxResponse {
    #[serde(rename = "OutBlock_1")]
    out_block: Option<Vec<KrxRow>>,
}

/// 전종목 시세 화면의 원시 행. 모든 값이 문자열로 내려온다.
#[derive(Debug, Default, Deserialize)]
struct KrxRow {
    #[serde(rename = "ISU_SRT_CD", default)]
    symbol: Option<String>,
    #[serde(rename = "ISU_CD", default)]
    isin: Option<String>,
    #[serde(rename = "ISU_ABBRV", default)]
    name: Option<String>,
    #[serde(rename = "MKT_NM", default)]
    market: Option<String>,
    #[serde(rename = "SECT_TP_NM", default)]
    admin_state: Option<String>,
    #[serde(rename = "TDD_CLSPRC", default)]
    close: Option<String>,
    #[serde(rename = "FLUC_TP_CD", default)]
    change_code: Option<String>,
    #[serde(rename = "CMPPREVDD_PRC", default)]
    change: Option<String>,
    #[serde(rename = "FLUC_RT", default)]
    change_rate: Option<String>,
    #[serde(rename = "TDD_OPNPRC", default)]
    open: Option<String>,
    #[serde(rename = "TDD_HGPRC", default)]
    high: Option<String>,
    #[serde(rename = "TDD_LWPRC", default)]
    low: Option<String>,
    #[serde(rename = "ACC_TRDVOL", default)]
    volume: Option<String>,
    #[serde(rename = "ACC_TRDVAL", default)]
    trading_value: Option<String>,
    #[serde(rename = "MKTCAP", default)]
    market_cap: Option<String>,
    #[serde(rename = "LIST_SHRS", default)]
    shares_outstanding: Option<String>,
    #[serde(rename = "MKT_ID", default)]
    market_id: Option<String>,
}

/// KRX 정보데이터시스템(data.krx.co.kr) 일별 시세 수집기.
#[derive(Debug, Clone)]
pub struct KrxDailySource {
    client: reqwest::Client,
    base_url: String,
    pacing_delay: Duration,
    max_lookback_days: u32,
}

impl KrxDailySource {
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

impl Default for KrxDailySource {
    fn default() -> Self {
        Self::new(&SourceConfig::default())
    }
}

#[async_trait]
impl DailyQuoteSource for KrxDailySource {
    async fn fetch_daily(&self, date: NaiveDate, market: Market) -> Result<RawFrame> {
        let url = format!("{}/comm/bldAttendant/getJsonData.cmd", self.base_url);
        let trd_dd = date.format("%Y%m%d").to_string();
        let params = [
            ("bld", BLD),
            ("mktId", market.mkt_id()),
            ("trdDd", trd_dd.as_str()),
            ("share", "1"),
            ("money", "1"),
            ("csvxls_isNo", "false"),
        ];

        debug!(%date, %market, "KRX 일별 시세 요청");

        let response = self
            .client
            .post(&url)
            .form(&params)
            .header("Referer", REFERER)
            .send()
            .await
            .map_err(|e| StockError::Fetch(format!("KRX 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(StockError::Fetch(format!(
                "KRX 응답 상태 이상: {}",
                response.status()
            )));
        }

        let body: KrxResponse = response
            .json()
            .await
            .map_err(|e| StockError::Fetch(format!("KRX 응답 본문 파싱 실패: {}", e)))?;

        build_frame(date, body.out_block.unwrap_or_default())
    }

    async fn fetch_recent(&self, market: Market) -> Result<RawFrame> {
        recent_via_daily(self, market, self.pacing_delay, self.max_lookback_days).await
    }
}

/// 쉼표와 공백을 제거합니다. 전일대비와 변동률에 적용합니다.
fn clean_text(raw: &str) -> String {
    raw.chars().filter(|c| *c != ',' && *c != ' ').collect()
}

/// 쉼표, 공백과 함께 `-` 자리표시자까지 제거합니다.
fn clean_numeric(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != ',' && *c != ' ' && *c != '-')
        .collect()
}

/// 정리된 가격 셀을 정수로 변환합니다. 응답에 없는 셀은 -1로 둡니다.
fn parse_price(value: Option<&str>, column: &str) -> Result<i64> {
    match value {
        None => Ok(-1),
        Some(raw) => {
            let cleaned = clean_numeric(raw);
            cleaned.parse::<i64>().map_err(|e| {
                StockError::Parse(format!("{} 컬럼 정수 변환 실패: '{}' ({})", column, cleaned, e))
            })
        }
    }
}

/// 정리된 전일대비 셀을 정수로 변환합니다. 응답에 없는 셀은 0으로 둡니다.
fn parse_change(cleaned: Option<&str>) -> Result<i64> {
    match cleaned {
        None => Ok(0),
        Some(raw) => raw.parse::<i64>().map_err(|e| {
            StockError::Parse(format!(
                "{} 컬럼 정수 변환 실패: '{}' ({})",
                columns::CHANGE,
                raw,
                e
            ))
        }),
    }
}

/// 변동률 셀을 비율로 변환합니다. 응답의 백분율 값을 100으로 나눕니다.
fn parse_rate(value: Option<&str>) -> Result<Decimal> {
    match value {
        None => Ok(Decimal::ZERO),
        Some(raw) => {
            let cleaned = clean_text(raw);
            let percent = cleaned.parse::<Decimal>().map_err(|e| {
                StockError::Parse(format!(
                    "{} 컬럼 숫자 변환 실패: '{}' ({})",
                    columns::CHANGE_RATE,
                    cleaned,
                    e
                ))
            })?;
            Ok(percent / dec!(100))
        }
    }
}

fn text_field(value: Option<&str>) -> String {
    value.map(clean_numeric).unwrap_or_default()
}

/// 원시 행들을 정리해 표준 시세 테이블로 변환합니다.
fn build_frame(date: NaiveDate, rows: Vec<KrxRow>) -> Result<RawFrame> {
    if rows.is_empty() {
        return Ok(RawFrame::new(QUOTE_COLUMNS));
    }

    // 전일대비는 음수를 구분해야 하므로 쉼표/공백만 정리한다.
    let changes: Vec<Option<String>> = rows
        .iter()
        .map(|row| row.change.as_deref().map(clean_text))
        .collect();

    // 전 종목이 자리표시자면 거래가 없었던 날이다.
    if changes.iter().all(|c| matches!(c.as_deref(), Some("-"))) {
        info!(%date, "전일대비가 모두 자리표시자입니다. 휴장일로 처리합니다");
        return Ok(RawFrame::new(QUOTE_COLUMNS));
    }

    let mut quotes = Vec::with_capacity(rows.len());
    for (row, change) in rows.into_iter().zip(changes) {
        quotes.push(to_quote(date, row, change.as_deref())?);
    }
    Ok(quotes_to_frame(quotes))
}

fn to_quote(date: NaiveDate, row: KrxRow, change: Option<&str>) -> Result<DailyQuote> {
    let close = parse_price(row.close.as_deref(), columns::CLOSE)?;
    let change = parse_change(change)?;

    Ok(DailyQuote {
        date,
        symbol: text_field(row.symbol.as_deref()),
        isin: text_field(row.isin.as_deref()),
        name: text_field(row.name.as_deref()),
        market: text_field(row.market.as_deref()),
        admin_state: row.admin_state.as_deref().map(|s| clean_numeric(s)),
        close,
        change_code: row.change_code.as_deref().map(|s| clean_numeric(s)),
        change,
        change_rate: parse_rate(row.change_rate.as_deref())?,
        open: parse_price(row.open.as_deref(), columns::OPEN)?,
        high: parse_price(row.high.as_deref(), columns::HIGH)?,
        low: parse_price(row.low.as_deref(), columns::LOW)?,
        volume: parse_price(row.volume.as_deref(), columns::VOLUME)?,
        trading_value: parse_price(row.trading_value.as_deref(), columns::TRADING_VALUE)?,
        market_cap: Some(parse_price(row.market_cap.as_deref(), columns::MARKET_CAP)?),
        shares_outstanding: Some(parse_price(
            row.shares_outstanding.as_deref(),
            columns::SHARES_OUTSTANDING,
        )?),
        market_id: row.market_id.as_deref().map(|s| clean_numeric(s)),
        base_price: close - change,
    })
}
