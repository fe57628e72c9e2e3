//! 네이버 금융 수집기.
//!
//! 종목 페이지 스크래핑과 비공식 API 두 경로를 모두 사용합니다:
//! - `fetch_summary`: 종목 메인 페이지에서 시가총액, 상장주식수, 당일
//!   가격과 넥스트레이드 거래 현황까지 한 번에 긁어옵니다.
//! - `fetch_intraday`: 분봉 차트 API.
//! - `fetch_realtime`: 폴링 API로 여러 종목의 통합(KRX+NXT) 현재가를
//!   묶음 조회합니다.
//!
//! HTML 파싱은 응답 본문을 모두 받은 뒤에만 수행합니다.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use krstock_core::config::SourceConfig;
use krstock_core::error::{Result, StockError};

use super::USER_AGENT;

const DEFAULT_FINANCE_URL: &str = "https://finance.naver.com";
const DEFAULT_CHART_API_URL: &str = "https://api.stock.naver.com";
const DEFAULT_POLLING_URL: &str = "https://polling.finance.naver.com";

/// 지원하는 분봉 간격.
const INTRADAY_MINUTES: [u32; 6] = [1, 3, 5, 10, 30, 60];

/// 종목 메인 페이지에서 긁어온 당일 요약.
///
/// 거래량과 거래대금은 KRX 분량과 넥스트레이드 분량을 따로 들고,
/// 합산 값을 함께 제공합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryQuote {
    /// 종목코드
    pub symbol: String,
    /// 종목명
    pub name: String,
    /// 현재가
    pub current: i64,
    /// 전일가
    pub previous: i64,
    /// 기준가 (전일가와 동일)
    pub base_price: i64,
    /// 전일대비
    pub change: i64,
    /// 변동률 (비율)
    pub change_rate: Decimal,
    /// 시가
    pub open: i64,
    /// 고가
    pub high: i64,
    /// 저가
    pub low: i64,
    /// 종가 (현재가와 동일)
    pub close: i64,
    /// 상한가
    pub upper_limit: i64,
    /// KRX 거래량
    pub volume_krx: i64,
    /// 넥스트레이드 거래량
    pub volume_nxt: i64,
    /// 합산 거래량
    pub volume: i64,
    /// KRX 거래대금
    pub trading_value_krx: i64,
    /// 넥스트레이드 거래대금
    pub trading_value_nxt: i64,
    /// 합산 거래대금
    pub trading_value: i64,
    /// 시가총액 (원)
    pub market_cap: i64,
    /// 상장주식수
    pub shares_outstanding: i64,
}

/// 분봉 하나. 파생 컬럼(평균가, 추정/누적 거래대금)을 함께 담습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntradayBar {
    /// 봉 시각 (현지)
    pub timestamp: NaiveDateTime,
    /// 종가
    pub close: i64,
    /// 시가
    pub open: i64,
    /// 고가
    pub high: i64,
    /// 저가
    pub low: i64,
    /// 거래량
    pub volume: i64,
    /// 평균가 = (종가+시가+고가+저가)/4
    pub mean_price: Decimal,
    /// 추정 거래대금 = 평균가 x 거래량
    pub estimated_value: Decimal,
    /// 추정 거래대금 누적 합
    pub cumulative_value: Decimal,
}

/// 넥스트레이드 장 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VenueState {
    /// 개장
    Open,
    /// 폐장
    Closed,
    /// 거래 대상 아님 (블록 없음 또는 가격 없음)
    Excluded,
}

/// 폴링 API의 통합 실시간 시세 한 건.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeQuote {
    /// 종목코드
    pub symbol: String,
    /// 종목명
    pub name: String,
    /// 정규장 개장 여부
    pub regular_open: bool,
    /// 넥스트레이드 상태
    pub venue: VenueState,
    /// 기준가
    pub base_price: i64,
    /// 전일가
    pub previous: i64,
    /// 현재가 (유효 종가와 동일)
    pub current: i64,
    /// 전일대비 (KRX 종가 - 기준가)
    pub change: i64,
    /// 변동률 (비율)
    pub change_rate: Decimal,
    /// 넥스트레이드 변동률
    pub change_rate_nxt: Decimal,
    /// 장후 변동률 = 넥스트레이드 종가 / KRX 종가 - 1
    pub after_hours_rate: Decimal,
    /// 시가
    pub open: i64,
    /// 고가
    pub high: i64,
    /// 저가
    pub low: i64,
    /// 유효 종가. 정규장이 닫히고 넥스트레이드가 열려 있으면 그쪽 가격.
    pub close: i64,
    /// KRX 종가
    pub close_krx: i64,
    /// 넥스트레이드 종가 (제외 종목은 KRX 종가)
    pub close_nxt: i64,
    /// 상한가
    pub upper_limit: i64,
    /// 하한가
    pub lower_limit: i64,
    /// 거래량
    pub volume: i64,
    /// 거래대금
    pub trading_value: i64,
}

// === 폴링 API 원시 응답 ===

#[derive(Debug, Deserialize)]
struct RealtimeResponse {
    #[serde(rename = "resultCode", default)]
    result_code: String,
    #[serde(default)]
    result: Option<RealtimeResult>,
}

#[derive(Debug, Deserialize)]
struct RealtimeResult {
    #[serde(default)]
    areas: Vec<RealtimeArea>,
}

#[derive(Debug, Deserialize)]
struct RealtimeArea {
    #[serde(default)]
    datas: Vec<RealtimeItem>,
}

#[derive(Debug, Deserialize)]
struct RealtimeItem {
    cd: String,
    nm: String,
    /// 기준가
    sv: i64,
    /// KRX 종가
    nv: i64,
    #[serde(default)]
    pcv: i64,
    #[serde(default)]
    ov: i64,
    #[serde(default)]
    hv: i64,
    #[serde(default)]
    lv: i64,
    #[serde(default)]
    ul: i64,
    #[serde(default)]
    ll: i64,
    #[serde(default)]
    aq: i64,
    #[serde(default)]
    aa: i64,
    /// 정규장 상태. CLOSE면 폐장.
    #[serde(default)]
    ms: String,
    #[serde(rename = "nxtOverMarketPriceInfo", default)]
    nxt: Option<NxtOverInfo>,
}

#[derive(Debug, Deserialize)]
struct NxtOverInfo {
    #[serde(rename = "overMarketStatus", default)]
    status: Option<String>,
    /// 쉼표가 섞인 문자열 가격
    #[serde(rename = "overPrice", default)]
    price: Option<String>,
    #[serde(rename = "fluctuationsRatio", default)]
    rate: Option<String>,
}

/// 분봉 차트 API의 원시 봉.
#[derive(Debug, Deserialize)]
struct IntradayWireBar {
    #[serde(rename = "localDateTime")]
    local_date_time: String,
    #[serde(rename = "closePrice")]
    close: i64,
    #[serde(rename = "openPrice")]
    open: i64,
    #[serde(rename = "highPrice")]
    high: i64,
    #[serde(rename = "lowPrice")]
    low: i64,
    #[serde(rename = "accumulatedTradingVolume")]
    volume: i64,
}

/// 네이버 금융 수집기.
#[derive(Debug, Clone)]
pub struct NaverFetcher {
    client: reqwest::Client,
    finance_url: String,
    chart_api_url: String,
    polling_url: String,
    pacing_delay: Duration,
    chunk_size: usize,
}

impl NaverFetcher {
    /// 설정값으로 수집기를 생성합니다.
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(config.request_timeout_secs))
                .user_agent(USER_AGENT)
                .build()
                .expect("HTTP 클라이언트 생성 실패"),
            finance_url: DEFAULT_FINANCE_URL.to_string(),
            chart_api_url: DEFAULT_CHART_API_URL.to_string(),
            polling_url: DEFAULT_POLLING_URL.to_string(),
            pacing_delay: Duration::from_secs(config.pacing_delay_secs),
            chunk_size: config.realtime_chunk_size.max(1),
        }
    }

    /// 종목 페이지 주소를 바꿉니다.
    pub fn with_finance_url(mut self, url: impl Into<String>) -> Self {
        self.finance_url = url.into();
        self
    }

    /// 분봉 차트 API 주소를 바꿉니다.
    pub fn with_chart_api_url(mut self, url: impl Into<String>) -> Self {
        self.chart_api_url = url.into();
        self
    }

    /// 폴링 API 주소를 바꿉니다.
    pub fn with_polling_url(mut self, url: impl Into<String>) -> Self {
        self.polling_url = url.into();
        self
    }

    /// 종목 메인 페이지에서 당일 요약을 긁어옵니다.
    pub async fn fetch_summary(&self, symbol: &str) -> Result<SummaryQuote> {
        let url = format!("{}/item/main.nhn?code={}", self.finance_url, symbol);
        debug!(symbol, "네이버 종목 요약 요청");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StockError::Fetch(format!("네이버 요청 실패: {}", e)))?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(StockError::Fetch("네이버 요청이 제한되었습니다 (429)".to_string()));
        }
        if !response.status().is_success() {
            return Err(StockError::Fetch(format!(
                "네이버 응답 상태 이상: {}",
                response.status()
            )));
        }

        let html = response
            .text()
            .await
            .map_err(|e| StockError::Fetch(format!("네이버 응답 본문 수신 실패: {}", e)))?;

        parse_summary(symbol, &html)
    }

    /// 분봉 차트를 조회합니다. `minute`은 1, 3, 5, 10, 30, 60 중 하나여야 합니다.
    pub async fn fetch_intraday(&self, symbol: &str, minute: u32) -> Result<Vec<IntradayBar>> {
        if !INTRADAY_MINUTES.contains(&minute) {
            return Err(StockError::Validation(format!(
                "지원하지 않는 분봉 간격입니다: {}",
                minute
            )));
        }

        // 1분봉은 경로에 숫자를 붙이지 않는다.
        let timeframe = if minute == 1 {
            "minute".to_string()
        } else {
            format!("minute{}", minute)
        };
        let url = format!(
            "{}/chart/domestic/item/{}/{}",
            self.chart_api_url, symbol, timeframe
        );

        debug!(symbol, minute, "네이버 분봉 요청");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StockError::Fetch(format!("네이버 분봉 요청 실패: {}", e)))?;

        if !response.status().is_success() {
            return Err(StockError::Fetch(format!(
                "네이버 분봉 응답 상태 이상: {}",
                response.status()
            )));
        }

        let bars: Vec<IntradayWireBar> = response
            .json()
            .await
            .map_err(|e| StockError::Fetch(format!("네이버 분봉 파싱 실패: {}", e)))?;

        derive_bars(bars)
    }

    /// 여러 종목의 통합 실시간 시세를 묶음 조회합니다.
    ///
    /// 종목코드를 설정된 크기로 쪼개 순서대로 요청하며, 응답 코드가
    /// 성공이 아닌 묶음은 경고만 남기고 건너뜁니다.
    pub async fn fetch_realtime<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Vec<RealtimeQuote>> {
        let mut quotes = Vec::new();

        for chunk in symbols.chunks(self.chunk_size) {
            let codes: Vec<&str> = chunk
                .iter()
                .map(|s| s.as_ref())
                .filter(|s| !s.is_empty())
                .collect();
            if codes.is_empty() {
                continue;
            }

            let url = format!(
                "{}/api/realtime?query=SERVICE_RECENT_ITEM:{}",
                self.polling_url,
                codes.join(",")
            );

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| StockError::Fetch(format!("실시간 시세 요청 실패: {}", e)))?;

            if !response.status().is_success() {
                warn!(
                    count = codes.len(),
                    status = %response.status(),
                    "실시간 시세 응답 상태 이상. 이 묶음을 건너뜁니다"
                );
                continue;
            }

            let body: RealtimeResponse = response
                .json()
                .await
                .map_err(|e| StockError::Fetch(format!("실시간 시세 파싱 실패: {}", e)))?;

            if body.result_code != "success" {
                warn!(
                    count = codes.len(),
                    result_code = %body.result_code,
                    "실시간 시세 응답 코드가 성공이 아닙니다. 이 묶음을 건너뜁니다"
                );
                continue;
            }

            let items = body
                .result
                .map(|r| r.areas)
                .unwrap_or_default()
                .into_iter()
                .flat_map(|area| area.datas);
            quotes.extend(items.map(to_realtime_quote));

            tokio::time::sleep(self.pacing_delay).await;
        }

        Ok(quotes)
    }
}

impl Default for NaverFetcher {
    fn default() -> Self {
        Self::new(&SourceConfig::default())
    }
}

// === 변환 도우미 ===

/// "348조 6,353억" 형태의 시가총액 문자열을 원 단위 정수로 바꿉니다.
///
/// 조/억 단위가 모두 없으면 0을 반환합니다.
pub fn convert_market_cap(value: &str) -> Result<i64> {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    let trillion = amount_before(&compact, '조')?;
    let billion = amount_before(&compact, '억')?;
    Ok(trillion * 1_000_000_000_000 + billion * 100_000_000)
}

/// 쉼표가 섞인 정수 문자열을 변환합니다. 예: "5,969,782,550".
pub fn convert_number(value: &str) -> Result<i64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',')
        .collect();
    cleaned.parse::<i64>().map_err(|e| {
        StockError::Parse(format!("숫자 변환 실패: '{}' ({})", cleaned, e))
    })
}

/// 단위 문자 바로 앞에 이어진 숫자(쉼표 허용) 구간을 정수로 읽습니다.
fn amount_before(text: &str, unit: char) -> Result<i64> {
    let Some(end) = text.find(unit) else {
        return Ok(0);
    };
    let head = &text[..end];
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| c.is_ascii_digit() || *c == ',')
        .last()
        .map(|(i, _)| i);
    let Some(start) = start else {
        return Ok(0);
    };
    let digits: String = head[start..].chars().filter(|c| *c != ',').collect();
    digits.parse::<i64>().map_err(|e| {
        StockError::Parse(format!("시가총액 숫자 변환 실패: '{}' ({})", &head[start..], e))
    })
}

// === 종목 페이지 파싱 ===

/// 종목 메인 페이지 HTML에서 요약을 조립합니다.
fn parse_summary(symbol: &str, html: &str) -> Result<SummaryQuote> {
    let document = Html::parse_document(html);

    let name = extract_name(&document)
        .ok_or_else(|| StockError::Fetch("네이버 응답에서 종목명을 찾지 못했습니다".to_string()))?;

    let market_cap = convert_market_cap(&th_td_value(&document, "시가총액").ok_or_else(|| {
        StockError::Fetch("네이버 응답에서 시가총액을 찾지 못했습니다".to_string())
    })?)?;
    let shares_outstanding = convert_number(&th_td_value(&document, "상장주식수").ok_or_else(
        || StockError::Fetch("네이버 응답에서 상장주식수를 찾지 못했습니다".to_string()),
    )?)?;

    let current = dd_price(&document, "현재가")?;
    let previous = dd_price(&document, "전일가")?;
    let open = dd_price(&document, "시가")?;
    let high = dd_price(&document, "고가")?;
    let low = dd_price(&document, "저가")?;
    let upper_limit = dd_price(&document, "상한가")?;
    let volume_krx = dd_price(&document, "거래량")?;
    let trading_value_krx = dd_price(&document, "거래대금")?;

    // 넥스트레이드 블록은 거래 대상 종목에만 있다. 없으면 0으로 둔다.
    let volume_nxt = nxt_blind_value(&document, "거래량").unwrap_or(0);
    let trading_value_nxt = nxt_blind_value(&document, "거래대금").unwrap_or(0) * 1_000_000;

    let change = current - previous;
    let change_rate = Decimal::from(change)
        .checked_div(Decimal::from(previous))
        .ok_or_else(|| {
            StockError::Parse(format!("전일가가 0이라 변동률을 계산할 수 없습니다: {}", symbol))
        })?;

    Ok(SummaryQuote {
        symbol: symbol.to_string(),
        name,
        current,
        previous,
        base_price: previous,
        change,
        change_rate,
        open,
        high,
        low,
        close: current,
        upper_limit,
        volume_krx,
        volume_nxt,
        volume: volume_krx + volume_nxt,
        trading_value_krx,
        trading_value_nxt,
        trading_value: trading_value_krx + trading_value_nxt,
        market_cap,
        shares_outstanding,
    })
}

/// 종목명 추출.
fn extract_name(document: &Html) -> Option<String> {
    let selector = Selector::parse("div.wrap_company h2 a").ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
}

/// 투자 정보 표(#tab_con1)에서 항목명이 `key`인 행의 값을 찾습니다.
fn th_td_value(document: &Html, key: &str) -> Option<String> {
    let tr_selector = Selector::parse("#tab_con1 tr").ok()?;
    let th_selector = Selector::parse("th").ok()?;
    let td_selector = Selector::parse("td").ok()?;

    for tr in document.select(&tr_selector) {
        let (Some(th), Some(td)) = (
            tr.select(&th_selector).next(),
            tr.select(&td_selector).next(),
        ) else {
            continue;
        };
        let heading: String = th.text().collect::<String>().split_whitespace().collect();
        if heading == key {
            return Some(td.text().collect::<String>());
        }
    }
    None
}

/// 종합 정보 목록(dd 태그)에서 `key` 바로 뒤의 값을 찾습니다.
fn dd_value(document: &Html, key: &str) -> Option<String> {
    let selector = Selector::parse("#middle.new_totalinfo dl dd").ok()?;
    for dd in document.select(&selector) {
        let text = dd.text().collect::<String>();
        if text.contains(key) {
            return text.split_whitespace().nth(1).map(|s| s.to_string());
        }
    }
    None
}

/// dd 값을 정수 가격으로 변환합니다. "백만" 접미사는 0 여섯 개로 펼칩니다.
fn dd_price(document: &Html, key: &str) -> Result<i64> {
    let raw = dd_value(document, key).ok_or_else(|| {
        StockError::Fetch(format!("네이버 응답에서 {}를 찾지 못했습니다", key))
    })?;
    let cleaned = raw.replace(',', "").replace("백만", "000000");
    cleaned.parse::<i64>().map_err(|e| {
        StockError::Parse(format!("{} 숫자 변환 실패: '{}' ({})", key, cleaned, e))
    })
}

/// 넥스트레이드 블록(`div#rate_info_nxt`)에서 거래량·거래대금을 읽습니다.
fn nxt_blind_value(document: &Html, key: &str) -> Option<i64> {
    let row_selector = Selector::parse("div#rate_info_nxt table.no_info tr").ok()?;
    let td_selector = Selector::parse("td").ok()?;
    let blind_selector = Selector::parse("em span.blind").ok()?;

    for row in document.select(&row_selector) {
        let text = row.text().collect::<String>();
        if !text.contains(key) {
            continue;
        }
        let td = row.select(&td_selector).last()?;
        let value = td.select(&blind_selector).next()?.text().collect::<String>();
        return value.trim().replace(',', "").parse::<i64>().ok();
    }
    None
}

// === 파생 계산 ===

/// 원시 봉에 평균가와 추정/누적 거래대금을 붙입니다.
fn derive_bars(wire: Vec<IntradayWireBar>) -> Result<Vec<IntradayBar>> {
    let mut cumulative = Decimal::ZERO;
    let mut bars = Vec::with_capacity(wire.len());

    for bar in wire {
        let timestamp = NaiveDateTime::parse_from_str(&bar.local_date_time, "%Y%m%d%H%M%S")
            .map_err(|e| {
                StockError::Parse(format!(
                    "분봉 시각 파싱 실패: '{}' ({})",
                    bar.local_date_time, e
                ))
            })?;
        let mean_price = Decimal::from(bar.close + bar.open + bar.high + bar.low) / dec!(4);
        let estimated_value = mean_price * Decimal::from(bar.volume);
        cumulative += estimated_value;

        bars.push(IntradayBar {
            timestamp,
            close: bar.close,
            open: bar.open,
            high: bar.high,
            low: bar.low,
            volume: bar.volume,
            mean_price,
            estimated_value,
            cumulative_value: cumulative,
        });
    }
    Ok(bars)
}

/// 폴링 항목 하나를 통합 시세로 변환합니다.
///
/// 넥스트레이드 블록이 없거나 가격을 읽을 수 없으면 제외 종목으로 보고
/// KRX 값을 그대로 넘깁니다. 유효 종가는 정규장이 닫힌 동안 넥스트레이드가
/// 열려 있을 때에만 그쪽 가격을 택합니다.
fn to_realtime_quote(item: RealtimeItem) -> RealtimeQuote {
    let regular_open = item.ms != "CLOSE";
    let close_krx = item.nv;

    let (venue, venue_price, venue_rate) = match &item.nxt {
        Some(info) => {
            let state = match info.status.as_deref() {
                Some("OPEN") => Some(VenueState::Open),
                Some("CLOSE") => Some(VenueState::Closed),
                _ => None,
            };
            let price = info
                .price
                .as_deref()
                .and_then(|p| p.replace(',', "").parse::<i64>().ok());
            let rate = info.rate.as_deref().and_then(|r| r.parse::<Decimal>().ok());
            match (state, price) {
                (Some(state), Some(price)) => (state, Some(price), rate),
                (Some(_), None) => {
                    warn!(symbol = %item.cd, "넥스트레이드 가격이 비어 있어 제외로 처리합니다");
                    (VenueState::Excluded, None, None)
                }
                _ => (VenueState::Excluded, None, None),
            }
        }
        None => (VenueState::Excluded, None, None),
    };

    let change = close_krx - item.sv;
    let change_rate = if item.sv == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(change) / Decimal::from(item.sv)
    };

    let excluded = venue == VenueState::Excluded;
    let close_nxt = if excluded {
        close_krx
    } else {
        venue_price.unwrap_or(close_krx)
    };
    let change_rate_nxt = if excluded {
        change_rate
    } else {
        venue_rate.unwrap_or_default()
    };
    let after_hours_rate = if excluded || close_krx == 0 {
        Decimal::ZERO
    } else {
        Decimal::from(close_nxt) / Decimal::from(close_krx) - Decimal::ONE
    };

    let close = if !regular_open && venue == VenueState::Open {
        close_nxt
    } else {
        close_krx
    };

    RealtimeQuote {
        symbol: item.cd,
        name: item.nm,
        regular_open,
        venue,
        base_price: item.sv,
        previous: item.pcv,
        current: close,
        change,
        change_rate,
        change_rate_nxt,
        after_hours_rate,
        open: item.ov,
        high: item.hv,
        low: item.lv,
        close,
        close_krx,
        close_nxt,
        upper_limit: item.ul,
        lower_limit: item.ll,
        volume: item.aq,
        trading_value: item.aa,
    }
}
