//! 표준 컬럼 이름.
//!
//! 모든 소스가 같은 이름으로 정규화되어 저장소에 들어옵니다.
//! 괄호 안은 KRX 피드의 원래 필드입니다.

/// 일자
pub const DATE: &str = "date";
/// 종목코드 (ISU_SRT_CD)
pub const SYMBOL: &str = "symbol";
/// 표준코드 (ISU_CD)
pub const ISIN: &str = "isin";
/// 종목명 (ISU_ABBRV)
pub const NAME: &str = "name";
/// 마켓구분 (MKT_NM)
pub const MARKET: &str = "market";
/// 관리구분 (SECT_TP_NM)
pub const ADMIN_STATE: &str = "admin_state";
/// 종가 (TDD_CLSPRC)
pub const CLOSE: &str = "close";
/// 변동코드 (FLUC_TP_CD)
pub const CHANGE_CODE: &str = "change_code";
/// 전일대비 (CMPPREVDD_PRC)
pub const CHANGE: &str = "change";
/// 변동률 (FLUC_RT, 1/100 배율 적용 후)
pub const CHANGE_RATE: &str = "change_rate";
/// 시가 (TDD_OPNPRC)
pub const OPEN: &str = "open";
/// 고가 (TDD_HGPRC)
pub const HIGH: &str = "high";
/// 저가 (TDD_LWPRC)
pub const LOW: &str = "low";
/// 거래량 (ACC_TRDVOL)
pub const VOLUME: &str = "volume";
/// 거래대금 (ACC_TRDVAL)
pub const TRADING_VALUE: &str = "trading_value";
/// 시가총액 (MKTCAP)
pub const MARKET_CAP: &str = "market_cap";
/// 상장주식수 (LIST_SHRS)
pub const SHARES_OUTSTANDING: &str = "shares_outstanding";
/// 시장ID (MKT_ID)
pub const MARKET_ID: &str = "market_id";
/// 기준가 (종가 - 전일대비)
pub const BASE_PRICE: &str = "base_price";
