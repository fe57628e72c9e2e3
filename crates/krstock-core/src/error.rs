//! 주식 데이터 시스템의 에러 타입.
//!
//! 이 모듈은 데이터 저장소와 수집기 전반에서 사용되는 에러 타입을 정의합니다.
//! 구조적 에러(Schema/Validation)는 변경 작업 전체를 중단시키며,
//! 저장소는 호출 이전 상태를 유지합니다.

use thiserror::Error;

/// 핵심 데이터 에러.
#[derive(Debug, Error)]
pub enum StockError {
    /// 키 컬럼이 없거나 모호한 경우
    #[error("스키마 에러: {0}")]
    Schema(String),

    /// 정규화 후에도 해소되지 않는 데이터 불일치
    #[error("검증 에러: {0}")]
    Validation(String),

    /// 심볼/종목명/날짜 조회 실패
    #[error("찾을 수 없음: {0}")]
    NotFound(String),

    /// 행이 없는 저장소에 최소 1개 날짜가 필요한 연산을 호출한 경우
    #[error("빈 저장소 에러: {0}")]
    EmptyState(String),

    /// 원천 데이터의 숫자 변환 실패 (자리 채움 없이 즉시 중단)
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 외부 소스 조회 에러
    #[error("조회 에러: {0}")]
    Fetch(String),

    /// 데이터베이스 에러
    #[error("데이터베이스 에러: {0}")]
    Database(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 주식 데이터 작업을 위한 Result 타입.
pub type Result<T> = std::result::Result<T, StockError>;

impl StockError {
    /// 저장소 상태를 변경하지 않고 중단된 구조적 에러인지 확인합니다.
    pub fn is_structural(&self) -> bool {
        matches!(self, StockError::Schema(_) | StockError::Validation(_))
    }

    /// 수집 경로에서 치명적인 에러인지 확인합니다.
    pub fn is_ingest_fatal(&self) -> bool {
        matches!(self, StockError::Parse(_) | StockError::Fetch(_))
    }
}

impl From<config::ConfigError> for StockError {
    fn from(err: config::ConfigError) -> Self {
        StockError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_structural() {
        let schema_err = StockError::Schema("일자 컬럼 없음".to_string());
        assert!(schema_err.is_structural());

        let miss = StockError::NotFound("005930".to_string());
        assert!(!miss.is_structural());
    }

    #[test]
    fn test_error_ingest_fatal() {
        let parse_err = StockError::Parse("종가 '1,234x'".to_string());
        assert!(parse_err.is_ingest_fatal());

        let empty = StockError::EmptyState("last_date".to_string());
        assert!(!empty.is_ingest_fatal());
    }
}
