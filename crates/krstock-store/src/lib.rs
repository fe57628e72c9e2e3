//! # KRStock Store
//!
//! 국내 주식 일별 시세를 메모리에 보관하는 키 테이블 저장소.
//!
//! ## 구성
//! - `SnapshotStore`: 종목코드 키의 하루치 스냅샷과 종목명 조회
//! - `HistoryStore`: (일자, 종목코드) 키의 시계열과 파생 스냅샷
//! - `merge`: 키 교집합 갱신(update)과 업서트(upsert) 알고리즘
//! - `window`: 최근 일자 범위 축소
//! - `filter`: 스팩·우선주 등 거래 대상 외 종목 필터
//!
//! 저장소는 동기·단일 스레드 값입니다. 인스턴스를 공유하려면
//! 호출자가 직접 잠금을 감싸야 합니다.

pub mod filter;
pub mod history;
pub mod merge;
pub mod snapshot;
pub mod window;

pub use filter::drop_untradable;
pub use history::HistoryStore;
pub use merge::{update_with, upsert_with, UpdateReport};
pub use snapshot::SnapshotStore;
pub use window::recent_window;
