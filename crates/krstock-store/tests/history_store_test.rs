//! HistoryStore 통합 테스트.
//!
//! 시계열 저장소의 전체 흐름을 검증합니다:
//! - 교체/덧붙임/삭제/업서트와 스냅샷 파생
//! - 일자·종목 슬라이스 프로젝션
//! - 빈 저장소 에러와 멱등성
//! - 소스 연동 (ingest_latest / refresh_from_source)

use async_trait::async_trait;
use chrono::NaiveDate;
use krstock_core::domain::DailyQuoteSource;
use krstock_core::error::{Result, StockError};
use krstock_core::frame::{columns, DailyKey, Frame, RawFrame, Value, ValueKind};
use krstock_core::types::Market;
use krstock_store::{HistoryStore, SnapshotStore};

// ================================================================================================
// 헬퍼 함수
// ================================================================================================

/// 테스트용 일자 생성 (2025년 3월).
fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
}

/// (일자, 종목코드, 종목명, 종가) 행들로 테이블 생성.
fn create_raw(rows: &[(u32, &str, &str, i64)]) -> RawFrame {
    let mut raw = RawFrame::new([
        columns::DATE,
        columns::SYMBOL,
        columns::NAME,
        columns::CLOSE,
    ]);
    for &(d, symbol, name, close) in rows {
        raw.push_row(vec![
            Value::Date(day(d)),
            Value::Text(symbol.to_string()),
            Value::Text(name.to_string()),
            Value::Int(close),
        ])
        .unwrap();
    }
    raw
}

/// 4일 = {AAA: 10, BBB: 20}, 5일 = {AAA: 11, BBB: 21} 저장소 생성.
fn create_two_day_store() -> HistoryStore {
    let mut store = HistoryStore::new();
    store
        .set(&create_raw(&[
            (4, "000010", "AAA", 10),
            (4, "000020", "BBB", 20),
            (5, "000010", "AAA", 11),
            (5, "000020", "BBB", 21),
        ]))
        .unwrap();
    store
}

fn close_of(frame: &Frame<DailyKey>, d: u32, symbol: &str) -> Option<Value> {
    frame
        .cell(&DailyKey::new(day(d), symbol), columns::CLOSE)
        .cloned()
}

// ================================================================================================
// 변경 연산 테스트
// ================================================================================================

mod mutation_tests {
    use super::*;

    #[test]
    fn test_set_sorts_and_derives_snapshot() {
        // 일부러 뒤섞인 순서로 넣는다
        let mut store = HistoryStore::new();
        store
            .set(&create_raw(&[
                (5, "000020", "BBB", 21),
                (4, "000010", "AAA", 10),
                (5, "000010", "AAA", 11),
                (4, "000020", "BBB", 20),
            ]))
            .unwrap();

        assert_eq!(store.dates(), vec![day(4), day(5)]);
        assert_eq!(store.last_date().unwrap(), day(5));
        // 스냅샷은 최근 일자 슬라이스
        assert_eq!(store.snapshot().date(), Some(day(5)));
        assert_eq!(store.snapshot().len(), 2);
        assert_eq!(store.lookup_name("000010").unwrap(), "AAA");
    }

    #[test]
    fn test_set_round_trip() {
        let store = create_two_day_store();
        let raw = store.frame().to_raw();
        let again = Frame::<DailyKey>::from_raw(&raw).unwrap();
        assert_eq!(&again, store.frame());
    }

    #[test]
    fn test_set_requires_both_key_columns() {
        let mut raw = RawFrame::new([columns::SYMBOL, columns::CLOSE]);
        raw.push_row(vec![Value::Text("000010".to_string()), Value::Int(10)])
            .unwrap();

        let mut store = create_two_day_store();
        assert!(matches!(
            store.set(&raw).unwrap_err(),
            StockError::Schema(_)
        ));
        // 실패한 교체는 기존 상태를 건드리지 않는다
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_append_day_is_idempotent() {
        let income = create_raw(&[(6, "000010", "AAA", 12), (6, "000020", "BBB", 22)]);

        let mut once = create_two_day_store();
        once.append_day(&income).unwrap();
        let mut twice = create_two_day_store();
        twice.append_day(&income).unwrap();
        twice.append_day(&income).unwrap();

        assert_eq!(once.frame(), twice.frame());
        assert_eq!(once.len(), 6);
    }

    #[test]
    fn test_append_day_on_empty_store_is_set() {
        let mut store = HistoryStore::new();
        store
            .append_day(&create_raw(&[(4, "000010", "AAA", 10)]))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot().date(), Some(day(4)));
    }

    #[test]
    fn test_append_day_overwrites_colliding_keys() {
        let mut store = create_two_day_store();
        store
            .append_day(&create_raw(&[
                (5, "000010", "AAA", 99),
                (6, "000010", "AAA", 12),
            ]))
            .unwrap();

        assert_eq!(close_of(store.frame(), 5, "000010"), Some(Value::Int(99)));
        assert_eq!(close_of(store.frame(), 6, "000010"), Some(Value::Int(12)));
        assert_eq!(store.len(), 5);
    }

    #[test]
    fn test_append_day_rejects_column_change() {
        let mut extra = RawFrame::new([
            columns::DATE,
            columns::SYMBOL,
            columns::NAME,
            columns::CLOSE,
            columns::VOLUME,
        ]);
        extra
            .push_row(vec![
                Value::Date(day(6)),
                Value::Text("000010".to_string()),
                Value::Text("AAA".to_string()),
                Value::Int(12),
                Value::Int(100),
            ])
            .unwrap();

        let mut store = create_two_day_store();
        let err = store.append_day(&extra).unwrap_err();
        assert!(matches!(err, StockError::Schema(_)));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_delete_date_leaves_other_days() {
        let mut store = create_two_day_store();
        store.delete_date(day(4));

        assert_eq!(store.dates(), vec![day(5)]);
        assert_eq!(store.len(), 2);
        assert_eq!(close_of(store.frame(), 5, "000010"), Some(Value::Int(11)));
        assert_eq!(close_of(store.frame(), 5, "000020"), Some(Value::Int(21)));

        // 없는 일자는 경고만 남기고 지나간다
        store.delete_date(day(20));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_retain_recent_keeps_last_day() {
        let mut store = create_two_day_store();
        let windowed = store.windowed(1).unwrap();
        store.retain_recent(1).unwrap();

        // 읽기 전용 짝과 변경 연산의 결과가 같다
        assert_eq!(&windowed, store.frame());
        assert_eq!(store.dates(), vec![day(5)]);
        assert_eq!(close_of(store.frame(), 5, "000020"), Some(Value::Int(21)));

        // 멱등성: 한 번 더 적용해도 그대로
        store.retain_recent(1).unwrap();
        assert_eq!(store.dates(), vec![day(5)]);

        // 일자 수가 n 이하이면 항등
        store.retain_recent(10).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_upsert_widens_schema() {
        let mut income = RawFrame::new([
            columns::DATE,
            columns::SYMBOL,
            columns::CLOSE,
            columns::VOLUME,
        ]);
        income
            .push_row(vec![
                Value::Date(day(5)),
                Value::Text("000010".to_string()),
                Value::Int(111),
                Value::Int(500),
            ])
            .unwrap();

        let mut store = create_two_day_store();
        store.upsert(&income).unwrap();

        // 충돌 키는 행 전체가 교체되어 종목명 셀이 Null로 빈다
        assert_eq!(close_of(store.frame(), 5, "000010"), Some(Value::Int(111)));
        assert_eq!(
            store
                .frame()
                .cell(&DailyKey::new(day(5), "000010"), columns::NAME),
            Some(&Value::Null)
        );
        assert_eq!(
            store
                .frame()
                .cell(&DailyKey::new(day(4), "000010"), columns::VOLUME),
            Some(&Value::Null)
        );
        assert_eq!(store.columns().last().map(String::as_str), Some(columns::VOLUME));
    }

    #[test]
    fn test_field_update_reports_counts() {
        let mut income = RawFrame::new([columns::DATE, columns::SYMBOL, columns::CLOSE]);
        for (d, symbol, close) in [(5, "000010", 999), (5, "999990", 1)] {
            income
                .push_row(vec![
                    Value::Date(day(d)),
                    Value::Text(symbol.to_string()),
                    Value::Int(close),
                ])
                .unwrap();
        }

        let mut store = create_two_day_store();
        let report = store.field_update(&income).unwrap();

        assert_eq!(report.updated_keys, 1);
        assert_eq!(report.updated_columns, 1);
        assert_eq!(report.ignored_keys, 1);
        assert_eq!(close_of(store.frame(), 5, "000010"), Some(Value::Int(999)));
        // 종목명 컬럼은 교집합 밖이라 그대로
        assert_eq!(store.lookup_name("000010").unwrap(), "AAA");
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_cast_columns_decimal() {
        use rust_decimal_macros::dec;

        let mut store = create_two_day_store();
        store
            .cast_columns(&[(columns::CLOSE, ValueKind::Decimal), ("없는컬럼", ValueKind::Int)])
            .unwrap();
        assert_eq!(
            close_of(store.frame(), 4, "000010"),
            Some(Value::Decimal(dec!(10)))
        );

        // 변환 불가능한 셀은 Parse 에러로 중단되고 상태가 유지된다
        let err = store
            .cast_columns(&[(columns::NAME, ValueKind::Int)])
            .unwrap_err();
        assert!(matches!(err, StockError::Parse(_)));
        assert_eq!(store.lookup_name("000010").unwrap(), "AAA");
    }

    #[test]
    fn test_clear_keeps_columns_and_empties_snapshot() {
        let mut store = create_two_day_store();
        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.columns().len(), 2);
        assert!(store.snapshot().is_empty());
        assert_eq!(store.snapshot().date(), None);
        assert!(matches!(
            store.latest().unwrap_err(),
            StockError::EmptyState(_)
        ));
    }

    #[test]
    fn test_empty_store_errors() {
        let store = HistoryStore::new();
        assert!(matches!(store.last_date(), Err(StockError::EmptyState(_))));
        assert!(matches!(store.latest(), Err(StockError::EmptyState(_))));
        assert!(matches!(store.latest_rows(), Err(StockError::EmptyState(_))));
        assert!(matches!(store.windowed(1), Err(StockError::EmptyState(_))));
        assert!(matches!(store.days_back(1), Err(StockError::EmptyState(_))));
        assert!(matches!(
            store.latest_symbols(),
            Err(StockError::EmptyState(_))
        ));

        let mut store = store;
        assert!(matches!(
            store.retain_recent(1),
            Err(StockError::EmptyState(_))
        ));
    }
}

// ================================================================================================
// 프로젝션 테스트
// ================================================================================================

mod projection_tests {
    use super::*;

    #[test]
    fn test_at_date_drops_key_level() {
        let store = create_two_day_store();
        let d4 = store.at_date(day(4)).unwrap();
        assert_eq!(d4.len(), 2);
        assert_eq!(d4.cell("000010", columns::CLOSE), Some(&Value::Int(10)));
        // 일자 컬럼은 키에서 빠져 하루치 테이블에는 없다
        assert_eq!(d4.column_index(columns::DATE), None);

        assert!(matches!(
            store.at_date(day(20)).unwrap_err(),
            StockError::NotFound(_)
        ));
    }

    #[test]
    fn test_latest_and_days_back() {
        let store = create_two_day_store();
        let latest = store.latest().unwrap();
        assert_eq!(latest.cell("000020", columns::CLOSE), Some(&Value::Int(21)));

        // 1이 가장 최근, 2가 그 전날
        assert_eq!(
            store.days_back(1).unwrap().cell("000010", columns::CLOSE),
            Some(&Value::Int(11))
        );
        assert_eq!(
            store.days_back(2).unwrap().cell("000010", columns::CLOSE),
            Some(&Value::Int(10))
        );
        assert!(matches!(
            store.days_back(3).unwrap_err(),
            StockError::NotFound(_)
        ));
        assert!(matches!(
            store.days_back(0).unwrap_err(),
            StockError::NotFound(_)
        ));
    }

    #[test]
    fn test_rows_at_and_latest_rows() {
        let store = create_two_day_store();
        assert_eq!(store.rows_at(day(4)).len(), 2);
        // 없는 일자는 빈 테이블이지 에러가 아니다
        assert!(store.rows_at(day(20)).is_empty());

        let latest = store.latest_rows().unwrap();
        assert_eq!(latest.len(), 2);
        assert_eq!(close_of(&latest, 5, "000010"), Some(Value::Int(11)));
    }

    #[test]
    fn test_after_before_between() {
        let mut store = create_two_day_store();
        store
            .append_day(&create_raw(&[(6, "000010", "AAA", 12)]))
            .unwrap();

        // 경계 포함 여부
        assert_eq!(
            store.after(day(5), true).distinct_dates(),
            vec![day(5), day(6)]
        );
        assert_eq!(store.after(day(5), false).distinct_dates(), vec![day(6)]);
        assert_eq!(
            store.before(day(5), true).distinct_dates(),
            vec![day(4), day(5)]
        );
        assert_eq!(store.before(day(5), false).distinct_dates(), vec![day(4)]);
        // 사이 조회는 양 끝을 포함한다
        assert_eq!(
            store.between(day(4), day(5)).distinct_dates(),
            vec![day(4), day(5)]
        );
    }

    #[test]
    fn test_by_symbol_and_series() {
        let store = create_two_day_store();

        let track = store.by_symbol("000010");
        assert_eq!(track.len(), 2);
        assert_eq!(close_of(&track, 4, "000010"), Some(Value::Int(10)));

        let both = store.by_symbols(&["000010", "000020"]);
        assert_eq!(both.len(), 4);

        let series = store.series("000020");
        assert_eq!(series.len(), 2);
        assert_eq!(
            series.cell(&day(5), columns::CLOSE),
            Some(&Value::Int(21))
        );
    }

    #[test]
    fn test_row_probe() {
        let store = create_two_day_store();
        assert!(store.row(day(4), "000010").is_some());
        assert!(store.row(day(4), "999990").is_none());
    }

    #[test]
    fn test_tradable_filters_rows() {
        let mut raw = RawFrame::new([
            columns::DATE,
            columns::SYMBOL,
            columns::NAME,
            columns::MARKET_ID,
        ]);
        for (symbol, name, market_id) in [
            ("005930", "삼성전자", "STK"),
            ("005935", "삼성전자우", "STK"),
            ("123450", "교보15호스팩", "KSQ"),
        ] {
            raw.push_row(vec![
                Value::Date(day(5)),
                Value::Text(symbol.to_string()),
                Value::Text(name.to_string()),
                Value::Text(market_id.to_string()),
            ])
            .unwrap();
        }

        let mut store = HistoryStore::new();
        store.set(&raw).unwrap();
        let tradable = store.tradable();
        assert_eq!(tradable.len(), 1);
        assert!(tradable.contains_key(&DailyKey::new(day(5), "005930")));
    }
}

// ================================================================================================
// 스냅샷 파생 테스트
// ================================================================================================

mod snapshot_tests {
    use super::*;

    #[test]
    fn test_snapshot_follows_max_date() {
        let mut store = create_two_day_store();
        assert_eq!(store.snapshot().date(), Some(day(5)));

        store
            .append_day(&create_raw(&[(6, "000010", "AAA", 12)]))
            .unwrap();
        assert_eq!(store.snapshot().date(), Some(day(6)));
        assert_eq!(store.latest_symbols().unwrap(), vec!["000010"]);

        // 최근 일자를 지우면 스냅샷이 그 전날로 물러난다
        store.delete_date(day(6));
        assert_eq!(store.snapshot().date(), Some(day(5)));
        assert_eq!(store.latest_symbols().unwrap(), vec!["000010", "000020"]);
    }

    #[test]
    fn test_snapshot_cleared_when_store_emptied() {
        let mut store = create_two_day_store();
        store.delete_date(day(4));
        store.delete_date(day(5));

        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.snapshot().date(), None);
    }

    #[test]
    fn test_lookups_use_latest_slice() {
        let mut store = create_two_day_store();
        // 6일에 BBB가 빠진 테이블을 덧붙이면 최근 스냅샷에서 사라진다
        store
            .append_day(&create_raw(&[(6, "000010", "AAA", 12)]))
            .unwrap();

        assert_eq!(store.lookup_name("000010").unwrap(), "AAA");
        assert!(matches!(
            store.lookup_name("000020").unwrap_err(),
            StockError::NotFound(_)
        ));
        assert_eq!(store.lookup_symbol("AAA").unwrap(), "000010");
    }
}

// ================================================================================================
// 소스 연동 테스트
// ================================================================================================

mod source_tests {
    use super::*;

    /// 고정 테이블을 돌려주는 테스트용 소스.
    struct FixedSource {
        raw: RawFrame,
    }

    #[async_trait]
    impl DailyQuoteSource for FixedSource {
        async fn fetch_daily(&self, _date: NaiveDate, _market: Market) -> Result<RawFrame> {
            Ok(self.raw.clone())
        }

        async fn fetch_recent(&self, _market: Market) -> Result<RawFrame> {
            Ok(self.raw.clone())
        }
    }

    #[tokio::test]
    async fn test_ingest_latest_appends_to_store() {
        let source = FixedSource {
            raw: create_raw(&[(6, "000010", "AAA", 12), (6, "000020", "BBB", 22)]),
        };

        let mut store = create_two_day_store();
        store.ingest_latest(&source, Market::All).await.unwrap();

        assert_eq!(store.len(), 6);
        assert_eq!(store.last_date().unwrap(), day(6));
        assert_eq!(store.snapshot().date(), Some(day(6)));
    }

    #[tokio::test]
    async fn test_snapshot_refresh_from_source() {
        let source = FixedSource {
            raw: create_raw(&[(6, "000010", "AAA", 12)]),
        };

        let mut snapshot = SnapshotStore::new();
        snapshot
            .refresh_from_source(&source, Market::All)
            .await
            .unwrap();

        assert_eq!(snapshot.date(), Some(day(6)));
        assert_eq!(snapshot.lookup_name("000010").unwrap(), "AAA");
    }
}
