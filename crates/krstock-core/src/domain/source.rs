//! 일별 시세 소스 trait.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::frame::RawFrame;
use crate::types::Market;

/// 일별 시세 공급자 trait.
///
/// 구현체는 표준 컬럼 스키마(`QUOTE_COLUMNS`)의 테이블을 돌려줍니다.
/// 거래가 없는 날(휴장일)은 에러가 아니라 빈 테이블입니다.
#[async_trait]
pub trait DailyQuoteSource: Send + Sync {
    /// 지정한 일자의 전 종목 시세를 가져옵니다.
    async fn fetch_daily(&self, date: NaiveDate, market: Market) -> Result<RawFrame>;

    /// 가장 최근 거래일의 시세를 가져옵니다.
    ///
    /// 오늘부터 하루씩 되짚어가며 비어 있지 않은 테이블이 나올 때까지
    /// 조회합니다. 되짚는 일수에는 구현체별 상한이 있습니다.
    async fn fetch_recent(&self, market: Market) -> Result<RawFrame>;
}
