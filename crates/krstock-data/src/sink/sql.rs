//! PostgreSQL 시세 저장소.
//!
//! 수집된 테이블을 (일자, 종목코드) 기준으로 upsert 합니다. 테이블에
//! 없는 컬럼은 쓰기 전에 먼저 추가하므로, 원천이 컬럼을 늘려도 수집은
//! 멈추지 않습니다.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::Query;
use sqlx::{PgPool, Postgres};
use tracing::{error, info, warn};

use krstock_core::config::DatabaseConfig;
use krstock_core::error::{Result, StockError};
use krstock_core::frame::{columns, RawFrame, Value, ValueKind};

/// PostgreSQL 연결 풀 래퍼.
#[derive(Debug, Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// 설정값으로 연결 풀을 만듭니다.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(url = %config.url, "데이터베이스 연결 시도");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| StockError::Database(format!("연결 실패: {}", e)))?;

        info!("데이터베이스 연결 완료");
        Ok(Self { pool })
    }

    /// 이미 만들어진 풀을 감쌉니다.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 내부 풀 참조.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// 테이블에 없는 프레임 컬럼 목록. 프레임의 컬럼 순서를 유지합니다.
pub fn missing_columns(frame: &RawFrame, table_columns: &[String]) -> Vec<String> {
    frame
        .columns()
        .iter()
        .filter(|c| !table_columns.iter().any(|t| t == *c))
        .cloned()
        .collect()
}

/// 컬럼의 PostgreSQL 타입. 전부 결측이면 TEXT로 둡니다.
pub fn sql_type_for(frame: &RawFrame, column: &str) -> &'static str {
    match column_kind(frame, column) {
        Some(ValueKind::Int) => "BIGINT",
        Some(ValueKind::Decimal) => "NUMERIC",
        Some(ValueKind::Date) => "DATE",
        Some(ValueKind::Text) | None => "TEXT",
    }
}

/// 컬럼에서 처음 만나는 비결측값의 종류.
fn column_kind(frame: &RawFrame, column: &str) -> Option<ValueKind> {
    let index = frame.column_index(column)?;
    frame.rows().find_map(|row| row[index].kind())
}

/// (일자, 종목코드) 충돌 시 나머지 컬럼을 갱신하는 upsert 문.
fn upsert_sql(table: &str, names: &[String]) -> String {
    let quoted: Vec<String> = names.iter().map(|c| format!("\"{}\"", c)).collect();
    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("${}", i)).collect();
    let updates: Vec<String> = names
        .iter()
        .filter(|c| c.as_str() != columns::DATE && c.as_str() != columns::SYMBOL)
        .map(|c| format!("\"{}\" = EXCLUDED.\"{}\"", c, c))
        .collect();

    let conflict_action = if updates.is_empty() {
        "DO NOTHING".to_string()
    } else {
        format!("DO UPDATE SET {}", updates.join(", "))
    };

    format!(
        "INSERT INTO {} ({}) VALUES ({}) ON CONFLICT ({}, {}) {}",
        table,
        quoted.join(", "),
        placeholders.join(", "),
        columns::DATE,
        columns::SYMBOL,
        conflict_action
    )
}

/// 셀 값을 자리표시자에 바인딩합니다. 결측값은 컬럼 종류에 맞는
/// 타입의 NULL로 바인딩합니다.
fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
    kind: Option<ValueKind>,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        Value::Int(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.clone()),
        Value::Date(v) => query.bind(*v),
        Value::Null => match kind {
            Some(ValueKind::Int) => query.bind(None::<i64>),
            Some(ValueKind::Decimal) => query.bind(None::<Decimal>),
            Some(ValueKind::Date) => query.bind(None::<NaiveDate>),
            Some(ValueKind::Text) | None => query.bind(None::<String>),
        },
    }
}

/// 일별 시세 테이블 저장소.
#[derive(Debug, Clone)]
pub struct QuoteRepository {
    db: Database,
    table: String,
}

impl QuoteRepository {
    /// 지정한 테이블을 다루는 저장소를 생성합니다.
    pub fn new(db: Database, table: impl Into<String>) -> Self {
        Self {
            db,
            table: table.into(),
        }
    }

    /// 테이블의 컬럼 이름들 (정의 순서).
    pub async fn table_columns(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT column_name
            FROM information_schema.columns
            WHERE table_name = $1
            ORDER BY ordinal_position
            "#,
        )
        .bind(&self.table)
        .fetch_all(self.db.pool())
        .await
        .map_err(|e| StockError::Database(format!("테이블 컬럼 조회 실패: {}", e)))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    /// 프레임에는 있지만 테이블에 없는 컬럼을 추가합니다.
    ///
    /// 컬럼 하나가 실패해도 나머지는 계속 시도하며, 실제로 추가된
    /// 컬럼 이름들을 반환합니다.
    pub async fn add_missing_columns(&self, frame: &RawFrame) -> Result<Vec<String>> {
        let table_columns = self.table_columns().await?;
        let missing = missing_columns(frame, &table_columns);

        let mut added = Vec::new();
        for column in missing {
            let sql_type = sql_type_for(frame, &column);
            let sql = format!(
                r#"ALTER TABLE {} ADD COLUMN "{}" {}"#,
                self.table, column, sql_type
            );
            match sqlx::query(&sql).execute(self.db.pool()).await {
                Ok(_) => {
                    info!(table = %self.table, column = %column, sql_type, "컬럼 추가");
                    added.push(column);
                }
                Err(e) => {
                    error!(table = %self.table, column = %column, "컬럼 추가 실패: {}", e);
                }
            }
        }
        Ok(added)
    }

    /// 프레임 전체를 한 트랜잭션으로 upsert 합니다.
    ///
    /// 빈 프레임은 경고만 남기고 0을 반환합니다. 일자·종목코드 컬럼이
    /// 없으면 `Schema` 에러입니다.
    pub async fn sync_frame(&self, frame: &RawFrame) -> Result<u64> {
        if frame.is_empty() {
            warn!(table = %self.table, "빈 테이블이라 동기화를 건너뜁니다");
            return Ok(0);
        }
        for key in [columns::DATE, columns::SYMBOL] {
            if frame.column_index(key).is_none() {
                return Err(StockError::Schema(format!("'{}' 컬럼이 필요합니다", key)));
            }
        }

        self.add_missing_columns(frame).await?;

        let sql = upsert_sql(&self.table, frame.columns());
        let kinds: Vec<Option<ValueKind>> = frame
            .columns()
            .iter()
            .map(|c| column_kind(frame, c))
            .collect();

        let mut tx = self
            .db
            .pool()
            .begin()
            .await
            .map_err(|e| StockError::Database(format!("트랜잭션 시작 실패: {}", e)))?;

        let mut written = 0u64;
        for row in frame.rows() {
            let mut query = sqlx::query(&sql);
            for (value, kind) in row.iter().zip(&kinds) {
                query = bind_value(query, value, *kind);
            }
            query
                .execute(&mut *tx)
                .await
                .map_err(|e| StockError::Database(format!("행 쓰기 실패: {}", e)))?;
            written += 1;
        }

        tx.commit()
            .await
            .map_err(|e| StockError::Database(format!("트랜잭션 커밋 실패: {}", e)))?;

        info!(table = %self.table, rows = written, "시세 동기화 완료");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn sample_frame() -> RawFrame {
        let mut frame = RawFrame::new([
            columns::DATE,
            columns::SYMBOL,
            columns::CLOSE,
            columns::CHANGE_RATE,
            columns::ADMIN_STATE,
            "메모",
        ]);
        frame
            .push_row(vec![
                Value::Date(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()),
                Value::Text("005930".to_string()),
                Value::Int(71_900),
                Value::Decimal(dec!(0.0098)),
                Value::Null,
                Value::Null,
            ])
            .unwrap();
        frame
            .push_row(vec![
                Value::Date(NaiveDate::from_ymd_opt(2025, 3, 4).unwrap()),
                Value::Text("000020".to_string()),
                Value::Int(7_900),
                Value::Decimal(dec!(-0.0124)),
                Value::Text("관리종목".to_string()),
                Value::Null,
            ])
            .unwrap();
        frame
    }

    #[test]
    fn test_missing_columns_keeps_frame_order() {
        let table_columns = vec![
            columns::DATE.to_string(),
            columns::SYMBOL.to_string(),
            columns::CLOSE.to_string(),
        ];
        assert_eq!(
            missing_columns(&sample_frame(), &table_columns),
            vec![
                columns::CHANGE_RATE.to_string(),
                columns::ADMIN_STATE.to_string(),
                "메모".to_string()
            ]
        );
    }

    #[test]
    fn test_missing_columns_empty_when_all_present() {
        let frame = sample_frame();
        let table_columns: Vec<String> = frame.columns().to_vec();
        assert!(missing_columns(&frame, &table_columns).is_empty());
    }

    #[test]
    fn test_sql_type_for() {
        let frame = sample_frame();
        assert_eq!(sql_type_for(&frame, columns::DATE), "DATE");
        assert_eq!(sql_type_for(&frame, columns::SYMBOL), "TEXT");
        assert_eq!(sql_type_for(&frame, columns::CLOSE), "BIGINT");
        assert_eq!(sql_type_for(&frame, columns::CHANGE_RATE), "NUMERIC");
    }

    #[test]
    fn test_sql_type_skips_leading_nulls() {
        // 첫 행이 결측이어도 뒤 행에서 종류를 찾는다.
        assert_eq!(sql_type_for(&sample_frame(), columns::ADMIN_STATE), "TEXT");
    }

    #[test]
    fn test_sql_type_all_null_defaults_to_text() {
        assert_eq!(sql_type_for(&sample_frame(), "메모"), "TEXT");
        assert_eq!(sql_type_for(&sample_frame(), "없는컬럼"), "TEXT");
    }

    #[test]
    fn test_upsert_sql_excludes_key_columns_from_update() {
        let names = vec![
            columns::DATE.to_string(),
            columns::SYMBOL.to_string(),
            columns::CLOSE.to_string(),
        ];
        assert_eq!(
            upsert_sql("daily_quotes", &names),
            "INSERT INTO daily_quotes (\"date\", \"symbol\", \"close\") \
             VALUES ($1, $2, $3) \
             ON CONFLICT (date, symbol) DO UPDATE SET \"close\" = EXCLUDED.\"close\""
        );
    }

    #[test]
    fn test_upsert_sql_key_only_does_nothing() {
        let names = vec![columns::DATE.to_string(), columns::SYMBOL.to_string()];
        assert!(upsert_sql("daily_quotes", &names).ends_with("DO NOTHING"));
    }
}
