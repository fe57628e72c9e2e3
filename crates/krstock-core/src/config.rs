//! 설정 관리.
//!
//! 이 모듈은 수집기와 저장소 주변부의 애플리케이션 설정을 정의합니다.
//! 파일 + `KRSTOCK__` 접두사 환경 변수의 계층 구조로 로드됩니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    /// 로깅 설정
    #[serde(default)]
    pub logging: LoggingConfig,
    /// 데이터 소스 설정
    #[serde(default)]
    pub source: SourceConfig,
    /// 데이터베이스 설정
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 데이터 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// HTTP 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 연속 요청 사이의 대기 시간 (초)
    pub pacing_delay_secs: u64,
    /// 최근 거래일 탐색 시 거슬러 올라가는 최대 일수
    pub max_lookback_days: u32,
    /// 실시간 시세 조회 시 한 요청에 담는 최대 심볼 수
    pub realtime_chunk_size: usize,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            pacing_delay_secs: 1,
            max_lookback_days: 10,
            realtime_chunk_size: 1000,
        }
    }
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// 접속 URL
    pub url: String,
    /// 시세 테이블 이름
    pub quote_table: String,
    /// 최대 연결 수
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/krstock".to_string(),
            quote_table: "daily_quotes".to_string(),
            max_connections: 10,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("KRSTOCK")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}
