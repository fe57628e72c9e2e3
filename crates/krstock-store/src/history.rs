//! (일자, 종목코드) 키 시계열 저장소.
//!
//! 전 종목 일별 시세를 하나의 키 테이블로 보관하고, 가장 최근 일자의
//! 슬라이스를 스냅샷으로 함께 유지합니다. 스냅샷은 테이블에서
//! 파생되는 읽기 전용 뷰이며, 테이블을 바꾸는 모든 연산이 끝난 뒤
//! 다시 계산됩니다.

use chrono::NaiveDate;
use tracing::{info, warn};

use krstock_core::domain::DailyQuoteSource;
use krstock_core::error::{Result, StockError};
use krstock_core::frame::{DailyKey, Frame, RawFrame, Value, ValueKind};
use krstock_core::types::Market;

use crate::merge::{self, UpdateReport};
use crate::snapshot::SnapshotStore;
use crate::{filter, window};

/// 일별 시세 시계열 저장소.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    frame: Frame<DailyKey>,
    snapshot: SnapshotStore,
}

impl HistoryStore {
    /// 빈 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    // === 변경 연산 ===
    // 구조적 에러(Schema/Validation/Parse)는 저장소를 바꾸지 않고
    // 중단됩니다.

    /// 테이블 전체를 교체합니다. 일자와 종목코드 컬럼이 모두 있어야
    /// 하며, 행은 (일자, 종목코드) 오름차순으로 정렬됩니다.
    pub fn set(&mut self, raw: &RawFrame) -> Result<()> {
        self.frame = Frame::from_raw(raw)?;
        self.refresh_snapshot();
        info!(rows = self.frame.len(), "시계열 테이블 교체 완료");
        Ok(())
    }

    /// 하루치(또는 여러 일자) 테이블을 덧붙입니다.
    ///
    /// 빈 저장소에서는 `set`과 같습니다. 이미 데이터가 있으면 들어온
    /// 테이블의 값 컬럼 구성이 기존과 같아야 하며(`Schema` 에러),
    /// 겹치는 키는 행 전체가 들어온 값으로 덮입니다.
    pub fn append_day(&mut self, raw: &RawFrame) -> Result<()> {
        if self.frame.is_empty() {
            return self.set(raw);
        }
        let income = Frame::<DailyKey>::from_raw(raw)?;

        let mut positions = Vec::with_capacity(self.frame.columns().len());
        for name in self.frame.columns() {
            match income.column_index(name) {
                Some(idx) => positions.push(idx),
                None => {
                    return Err(StockError::Schema(format!(
                        "들어온 테이블에 '{}' 컬럼이 없습니다. 컬럼 구성을 바꾸려면 upsert를 사용하세요",
                        name
                    )))
                }
            }
        }
        if income.columns().len() != positions.len() {
            return Err(StockError::Schema(
                "들어온 테이블에 기존에 없는 컬럼이 있습니다. 컬럼 구성을 바꾸려면 upsert를 사용하세요"
                    .to_string(),
            ));
        }

        let mut updated = self.frame.clone();
        for (key, row) in income.iter() {
            let values: Vec<Value> = positions.iter().map(|&i| row[i].clone()).collect();
            updated.insert(key.clone(), values)?;
        }
        self.frame = updated;
        self.refresh_snapshot();
        Ok(())
    }

    /// 지정한 일자의 행들을 삭제합니다. 해당 일자가 없으면 경고만
    /// 남기고 아무것도 하지 않습니다.
    pub fn delete_date(&mut self, date: NaiveDate) {
        if !self.frame.keys().any(|k| k.date == date) {
            warn!(%date, "삭제할 일자가 테이블에 없습니다");
            return;
        }
        self.frame.retain(|key, _| key.date != date);
        self.refresh_snapshot();
    }

    /// 키·컬럼 교집합 범위에서 셀을 들어온 값으로 덮어씁니다.
    pub fn field_update(&mut self, raw: &RawFrame) -> Result<UpdateReport> {
        let income = Frame::<DailyKey>::from_raw(raw)?;
        let (merged, report) = merge::update_with(&self.frame, &income);
        self.frame = merged;
        self.refresh_snapshot();
        Ok(report)
    }

    /// 겹치는 키의 행을 교체하고 새 키를 추가합니다. 들어온 테이블의
    /// 컬럼 구성이 달라도 되며, 결과는 컬럼 합집합입니다.
    pub fn upsert(&mut self, raw: &RawFrame) -> Result<()> {
        let income = Frame::<DailyKey>::from_raw(raw)?;
        self.frame = merge::upsert_with(&self.frame, &income)?;
        self.refresh_snapshot();
        Ok(())
    }

    /// 가장 최근 `days`개 일자의 행만 남깁니다.
    pub fn retain_recent(&mut self, days: usize) -> Result<()> {
        if self.frame.is_empty() {
            return Err(StockError::EmptyState(
                "빈 테이블에는 기간 축소를 적용할 수 없습니다".to_string(),
            ));
        }
        self.frame = window::recent_window(&self.frame, days);
        self.refresh_snapshot();
        Ok(())
    }

    /// `retain_recent`의 읽기 전용 짝. 저장소를 바꾸지 않고 좁힌
    /// 사본을 돌려줍니다.
    pub fn windowed(&self, days: usize) -> Result<Frame<DailyKey>> {
        if self.frame.is_empty() {
            return Err(StockError::EmptyState(
                "빈 테이블에는 기간 축소를 적용할 수 없습니다".to_string(),
            ));
        }
        Ok(window::recent_window(&self.frame, days))
    }

    /// 지정한 컬럼들을 목표 종류로 변환합니다. 테이블에 없는 컬럼은
    /// 건너뛰고, 변환 불가능한 셀은 `Parse` 에러로 중단됩니다.
    pub fn cast_columns(&mut self, mapping: &[(&str, ValueKind)]) -> Result<()> {
        self.frame = self.frame.cast_columns(mapping)?;
        self.refresh_snapshot();
        Ok(())
    }

    /// 행을 모두 비웁니다. 컬럼 구성은 유지하고 스냅샷도 비웁니다.
    pub fn clear(&mut self) {
        self.frame = Frame::new(self.frame.columns().to_vec());
        self.refresh_snapshot();
    }

    /// 소스에서 가장 최근 거래일 테이블을 받아 덧붙입니다.
    pub async fn ingest_latest(
        &mut self,
        source: &dyn DailyQuoteSource,
        market: Market,
    ) -> Result<()> {
        let raw = source.fetch_recent(market).await?;
        self.append_day(&raw)
    }

    fn refresh_snapshot(&mut self) {
        let (snap, date) = self.frame.latest_by_symbol();
        self.snapshot.replace_derived(snap, date);
    }

    // === 읽기 연산: 하루치 슬라이스 (종목코드 키) ===

    /// 지정한 일자의 하루치 테이블. 그 일자가 없으면 `NotFound`입니다.
    pub fn at_date(&self, date: NaiveDate) -> Result<Frame<String>> {
        let day = self.frame.day_by_symbol(date);
        if day.is_empty() {
            return Err(StockError::NotFound(format!("{} 일자 데이터", date)));
        }
        Ok(day)
    }

    /// 가장 최근 일자의 하루치 테이블.
    pub fn latest(&self) -> Result<Frame<String>> {
        let last = self
            .frame
            .last_date()
            .ok_or_else(|| StockError::EmptyState("테이블이 비어 있습니다".to_string()))?;
        Ok(self.frame.day_by_symbol(last))
    }

    /// 끝에서 `n`번째 일자의 하루치 테이블. 1이 가장 최근 일자입니다.
    pub fn days_back(&self, n: usize) -> Result<Frame<String>> {
        if self.frame.is_empty() {
            return Err(StockError::EmptyState("테이블이 비어 있습니다".to_string()));
        }
        let dates = self.frame.distinct_dates();
        if n == 0 || n > dates.len() {
            return Err(StockError::NotFound(format!("끝에서 {}번째 일자", n)));
        }
        Ok(self.frame.day_by_symbol(dates[dates.len() - n]))
    }

    // === 읽기 연산: 키 슬라이스 ((일자, 종목코드) 키) ===

    /// 지정한 일자의 행들.
    pub fn rows_at(&self, date: NaiveDate) -> Frame<DailyKey> {
        self.frame.filtered(|key, _| key.date == date)
    }

    /// 가장 최근 일자의 행들.
    pub fn latest_rows(&self) -> Result<Frame<DailyKey>> {
        let last = self
            .frame
            .last_date()
            .ok_or_else(|| StockError::EmptyState("테이블이 비어 있습니다".to_string()))?;
        Ok(self.frame.filtered(|key, _| key.date == last))
    }

    /// 지정한 일자 이후의 행들.
    pub fn after(&self, date: NaiveDate, inclusive: bool) -> Frame<DailyKey> {
        self.frame.filtered(|key, _| {
            if inclusive {
                key.date >= date
            } else {
                key.date > date
            }
        })
    }

    /// 지정한 일자 이전의 행들.
    pub fn before(&self, date: NaiveDate, inclusive: bool) -> Frame<DailyKey> {
        self.frame.filtered(|key, _| {
            if inclusive {
                key.date <= date
            } else {
                key.date < date
            }
        })
    }

    /// 두 일자 사이(양 끝 포함)의 행들.
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> Frame<DailyKey> {
        self.frame.filtered(|key, _| key.date >= from && key.date <= to)
    }

    /// 한 종목의 행들 (키 유지).
    pub fn by_symbol(&self, symbol: &str) -> Frame<DailyKey> {
        self.frame.filtered(|key, _| key.symbol == symbol)
    }

    /// 여러 종목의 행들.
    pub fn by_symbols<S: AsRef<str>>(&self, symbols: &[S]) -> Frame<DailyKey> {
        self.frame
            .filtered(|key, _| symbols.iter().any(|s| s.as_ref() == key.symbol))
    }

    /// 거래 대상 종목의 행들 (스팩·우선주 등 제외).
    pub fn tradable(&self) -> Frame<DailyKey> {
        filter::drop_untradable(&self.frame)
    }

    // === 읽기 연산: 단일 종목 시계열 (일자 키) ===

    /// 한 종목의 시계열.
    pub fn series(&self, symbol: &str) -> Frame<NaiveDate> {
        self.frame.symbol_series(symbol)
    }

    // === 읽기 연산: 스칼라 ===

    /// 존재하는 일자들 (오름차순, 중복 제거).
    pub fn dates(&self) -> Vec<NaiveDate> {
        self.frame.distinct_dates()
    }

    /// 가장 최근 일자.
    pub fn last_date(&self) -> Result<NaiveDate> {
        self.frame
            .last_date()
            .ok_or_else(|| StockError::EmptyState("테이블이 비어 있습니다".to_string()))
    }

    /// 전체 기간에 등장한 종목코드들 (오름차순, 중복 제거).
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.frame.keys().map(|k| k.symbol.clone()).collect();
        symbols.sort();
        symbols.dedup();
        symbols
    }

    /// 가장 최근 일자에 등장한 종목코드들.
    pub fn latest_symbols(&self) -> Result<Vec<String>> {
        if self.frame.is_empty() {
            return Err(StockError::EmptyState("테이블이 비어 있습니다".to_string()));
        }
        Ok(self.snapshot.symbols())
    }

    /// (일자, 종목코드)에 해당하는 행.
    pub fn row(&self, date: NaiveDate, symbol: &str) -> Option<&[Value]> {
        self.frame.get(&DailyKey::new(date, symbol))
    }

    /// 종목코드로 종목명을 조회합니다 (최근 일자 스냅샷 기준).
    pub fn lookup_name(&self, symbol: &str) -> Result<&str> {
        self.snapshot.lookup_name(symbol)
    }

    /// 여러 종목코드의 종목명을 조회합니다.
    pub fn lookup_names<I, S>(&self, symbols: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.snapshot.lookup_names(symbols)
    }

    /// 종목명으로 종목코드를 조회합니다.
    pub fn lookup_symbol(&self, name: &str) -> Result<&str> {
        self.snapshot.lookup_symbol(name)
    }

    /// 여러 종목명의 종목코드를 조회합니다.
    pub fn lookup_symbols<I, S>(&self, names: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.snapshot.lookup_symbols(names)
    }

    /// 보관 중인 시계열 테이블.
    pub fn frame(&self) -> &Frame<DailyKey> {
        &self.frame
    }

    /// 최근 일자 스냅샷.
    pub fn snapshot(&self) -> &SnapshotStore {
        &self.snapshot
    }

    /// 값 컬럼 이름 목록.
    pub fn columns(&self) -> &[String] {
        self.frame.columns()
    }

    /// 행 수.
    pub fn len(&self) -> usize {
        self.frame.len()
    }

    /// 행이 없는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.frame.is_empty()
    }
}
