//! # KRStock Core
//!
//! 한국 주식 일별 데이터 시스템의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 테이블 데이터 모델 (`Frame`, `RawFrame`, `Value`)
//! - 일별 시세 행 (`DailyQuote`)
//! - 호가 단위 및 상하한가 계산
//! - 시장 및 호가 체계 타입
//! - 데이터 소스 trait
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod frame;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use frame::*;
pub use logging::*;
pub use types::*;
