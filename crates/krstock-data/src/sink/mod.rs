//! 수집 결과 저장.
//!
//! ## sql
//! PostgreSQL upsert 저장소. 테이블에 없는 컬럼은 값 종류에 맞는
//! 타입으로 먼저 추가한 뒤 (일자, 종목코드) 기준으로 씁니다.
//!
//! ## file
//! JSON 파일 보관. 데이터베이스 없이 수집 결과를 남길 때 씁니다.

pub mod file;
pub mod sql;

pub use file::{load_frame, save_frame};
pub use sql::{missing_columns, sql_type_for, Database, QuoteRepository};
