//! 국내 주식 시세 수집과 저장.
//!
//! 세 원천에서 시세를 모아 공용 테이블(`RawFrame`)로 만들고,
//! PostgreSQL 또는 JSON 파일로 내보냅니다.
//!
//! - KRX 정보데이터시스템: 일별 전종목 시세
//! - 넥스트레이드: 대체거래소 일별 시세
//! - 네이버 금융: 종목 요약, 분봉, 통합 실시간 시세

pub mod sink;
pub mod source;

// 수집기
pub use source::{KrxDailySource, NaverFetcher, NxtDailySource};

// 네이버 금융 타입과 변환 도우미
pub use source::{convert_market_cap, convert_number, IntradayBar, RealtimeQuote, SummaryQuote, VenueState};

// 저장소
pub use sink::{load_frame, save_frame, Database, QuoteRepository};
