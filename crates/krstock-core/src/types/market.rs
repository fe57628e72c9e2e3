//! 시장 및 호가 체계 타입 정의.
//!
//! 이 모듈은 시세 조회와 호가 계산에 사용되는 타입을 정의합니다:
//! - `Market` - KRX 시세 조회 대상 시장
//! - `MarketRegime` - 호가 단위 체계 (현행 통합 / 과거 코스피 / 과거 코스닥)
//! - `TradingSession` - 정규장 / 시간외 세션
//! - `Side` - 매수 / 매도 구분

use serde::{Deserialize, Serialize};
use std::fmt;

/// KRX 시세 조회 대상 시장.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// 전체 시장
    All,
    /// 유가증권시장
    Kospi,
    /// 코스닥시장
    Kosdaq,
    /// 코넥스시장
    Konex,
}

impl Market {
    /// KRX 정보데이터시스템의 mktId 파라미터 값을 반환합니다.
    pub fn mkt_id(&self) -> &'static str {
        match self {
            Market::All => "ALL",
            Market::Kospi => "STK",
            Market::Kosdaq => "KSQ",
            Market::Konex => "KNX",
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Market::All => write!(f, "ALL"),
            Market::Kospi => write!(f, "KOSPI"),
            Market::Kosdaq => write!(f, "KOSDAQ"),
            Market::Konex => write!(f, "KONEX"),
        }
    }
}

impl std::str::FromStr for Market {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ALL" => Ok(Market::All),
            "KOSPI" | "STK" => Ok(Market::Kospi),
            "KOSDAQ" | "KSQ" => Ok(Market::Kosdaq),
            "KONEX" | "KNX" => Ok(Market::Konex),
            _ => Err(format!("Unknown market: {}", s)),
        }
    }
}

/// 호가 단위 체계.
///
/// 2023년 1월 25일부터 전 시장이 통합 호가 단위를 사용합니다.
/// 과거 체계는 그 이전 데이터의 백필 계산을 위해 유지합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketRegime {
    /// 현행 통합 호가 단위 (2023-01-25 이후)
    Current,
    /// 과거 코스피 호가 단위
    LegacyKospi,
    /// 과거 코스닥 호가 단위
    LegacyKosdaq,
}

impl fmt::Display for MarketRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketRegime::Current => write!(f, "current"),
            MarketRegime::LegacyKospi => write!(f, "legacy_kospi"),
            MarketRegime::LegacyKosdaq => write!(f, "legacy_kosdaq"),
        }
    }
}

/// 거래 세션. 상하한가 비율 선택에만 영향을 줍니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TradingSession {
    /// 정규장 (±30%)
    Regular,
    /// 시간외 단일가 (±10%)
    AfterHours,
}

/// 매수/매도 구분.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// 매수 (상한가 방향)
    Buy,
    /// 매도 (하한가 방향)
    Sell,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_mkt_id() {
        assert_eq!(Market::All.mkt_id(), "ALL");
        assert_eq!(Market::Kospi.mkt_id(), "STK");
        assert_eq!(Market::Kosdaq.mkt_id(), "KSQ");
        assert_eq!(Market::Konex.mkt_id(), "KNX");
    }

    #[test]
    fn test_market_from_str() {
        assert_eq!("kospi".parse::<Market>().unwrap(), Market::Kospi);
        assert_eq!("KSQ".parse::<Market>().unwrap(), Market::Kosdaq);
        assert!("NYSE".parse::<Market>().is_err());
    }
}
