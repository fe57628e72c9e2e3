//! 일별 시세 수집기 모듈.
//!
//! 외부 피드에서 시세를 끌어오는 수집기들을 정의합니다.
//!
//! ## KRX 정보데이터시스템
//! - `KrxDailySource`: 전종목 일별 시세 (KOSPI/KOSDAQ/KONEX)
//! - 쉼표/자리표시자 정리, 휴장일 판정, 기준가 계산
//!
//! ## 넥스트레이드
//! - `NxtDailySource`: 대체거래소(NXT) 일별 시세
//!
//! ## 네이버 금융
//! - `NaverFetcher`: 종목 요약 스크래핑, 분봉 차트, 실시간 통합 시세

use chrono::NaiveDate;
use chrono_tz::Asia::Seoul;
use std::time::Duration;
use tracing::{info, warn};

use krstock_core::domain::DailyQuoteSource;
use krstock_core::error::{Result, StockError};
use krstock_core::frame::RawFrame;
use krstock_core::types::Market;

pub mod krx;
pub mod naver;
pub mod nxt;

pub use krx::KrxDailySource;
pub use naver::{
    convert_market_cap, convert_number, IntradayBar, NaverFetcher, RealtimeQuote, SummaryQuote,
    VenueState,
};
pub use nxt::NxtDailySource;

/// 모든 수집기가 공통으로 쓰는 브라우저 User-Agent.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// 서울 기준 오늘 날짜.
pub(crate) fn seoul_today() -> NaiveDate {
    chrono::Utc::now().with_timezone(&Seoul).date_naive()
}

/// 서울 기준 오늘부터 하루씩 거슬러 내려가며 데이터가 있는 첫 거래일을 찾습니다.
///
/// 휴장일이나 아직 집계 전인 날짜는 빈 테이블이 돌아오므로, 빈 테이블이
/// 아닐 때까지 하루 전으로 이동합니다. `max_lookback`일을 넘게 거슬러도
/// 데이터가 없으면 수집 실패로 봅니다.
pub(crate) async fn recent_via_daily<S>(
    source: &S,
    market: Market,
    pacing_delay: Duration,
    max_lookback: u32,
) -> Result<RawFrame>
where
    S: DailyQuoteSource + ?Sized,
{
    let today = seoul_today();
    let mut date = today;
    loop {
        let frame = source.fetch_daily(date, market).await?;
        if !frame.is_empty() {
            info!(%date, rows = frame.len(), "최근 거래일 시세 확보");
            return Ok(frame);
        }

        let walked = (today - date).num_days() as u32;
        if walked >= max_lookback {
            return Err(StockError::Fetch(format!(
                "{}일을 거슬러도 거래일을 찾지 못했습니다",
                max_lookback
            )));
        }

        warn!(%date, "시세가 비어 있어 하루 전으로 이동합니다");
        date = date - chrono::Duration::days(1);
        tokio::time::sleep(pacing_delay).await;
    }
}
