//! 키 테이블 병합 알고리즘.
//!
//! 두 종류의 병합을 제공합니다:
//! - `update_with`: 키와 컬럼의 교집합 범위에서 셀만 덮어쓰는 갱신.
//!   들어온 테이블에만 있는 키/컬럼은 무시합니다.
//! - `upsert_with`: 충돌 키의 행을 통째로 교체하고 새 키를 추가하는
//!   업서트. 컬럼 합집합으로 스키마를 넓힐 수 있습니다.

use krstock_core::error::Result;
use krstock_core::frame::{Frame, FrameKey, Value};
use tracing::{info, warn};

/// `update_with`의 결과 요약.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateReport {
    /// 덮어쓴 키 수
    pub updated_keys: usize,
    /// 덮어쓴 컬럼 수
    pub updated_columns: usize,
    /// 기존 테이블에 없어 무시한 키 수
    pub ignored_keys: usize,
}

/// 키·컬럼 교집합 범위에서 기존 테이블의 셀을 들어온 값으로 덮어씁니다.
///
/// 공통 컬럼이 없거나 공통 키가 없으면 경고만 남기고 기존 테이블의
/// 사본을 그대로 돌려줍니다.
pub fn update_with<K: FrameKey>(base: &Frame<K>, income: &Frame<K>) -> (Frame<K>, UpdateReport) {
    let common: Vec<(usize, usize)> = base
        .columns()
        .iter()
        .enumerate()
        .filter_map(|(bi, name)| income.column_index(name).map(|ii| (bi, ii)))
        .collect();

    let ignored_keys = income.keys().filter(|k| !base.contains_key(*k)).count();
    if ignored_keys > 0 {
        warn!(ignored_keys, "기존 테이블에 없는 키는 무시합니다");
    }

    if common.is_empty() {
        warn!("공통 컬럼이 없어 갱신하지 않습니다");
        return (
            base.clone(),
            UpdateReport {
                ignored_keys,
                ..UpdateReport::default()
            },
        );
    }

    let mut merged = base.clone();
    let mut updated_keys = 0usize;
    for (key, income_row) in income.iter() {
        let Some(row) = merged.get_mut(key) else {
            continue;
        };
        for &(bi, ii) in &common {
            row[bi] = income_row[ii].clone();
        }
        updated_keys += 1;
    }

    if updated_keys == 0 {
        warn!("갱신할 공통 키가 없습니다");
        return (
            merged,
            UpdateReport {
                ignored_keys,
                ..UpdateReport::default()
            },
        );
    }

    let updated_columns = common.len();
    info!(updated_keys, updated_columns, "키 교집합 갱신 완료");
    (
        merged,
        UpdateReport {
            updated_keys,
            updated_columns,
            ignored_keys,
        },
    )
}

/// 충돌 키의 행을 들어온 행으로 교체하고 새 키를 추가합니다.
///
/// 결과 컬럼은 합집합입니다. 기존 컬럼 순서가 앞에 오고 새 컬럼이
/// 뒤에 붙으며, 어느 한쪽에 없던 셀은 `Null`이 됩니다. 기존 테이블이
/// 비어 있으면 들어온 테이블이 그대로 결과가 되고, 들어온 테이블이
/// 비어 있으면 경고만 남기고 기존 테이블을 돌려줍니다.
pub fn upsert_with<K: FrameKey>(base: &Frame<K>, income: &Frame<K>) -> Result<Frame<K>> {
    if base.is_empty() {
        return Ok(income.clone());
    }
    if income.is_empty() {
        warn!("빈 테이블로 업서트가 호출되어 기존 테이블을 그대로 둡니다");
        return Ok(base.clone());
    }

    let mut columns: Vec<String> = base.columns().to_vec();
    for name in income.columns() {
        if !columns.iter().any(|c| c == name) {
            columns.push(name.clone());
        }
    }
    let base_pos: Vec<Option<usize>> = columns.iter().map(|c| base.column_index(c)).collect();
    let income_pos: Vec<Option<usize>> = columns.iter().map(|c| income.column_index(c)).collect();

    let mut merged = Frame::new(columns);
    for (key, row) in base.iter() {
        if income.contains_key(key) {
            continue;
        }
        let values: Vec<Value> = base_pos
            .iter()
            .map(|p| p.map_or(Value::Null, |i| row[i].clone()))
            .collect();
        merged.insert(key.clone(), values)?;
    }
    for (key, row) in income.iter() {
        let values: Vec<Value> = income_pos
            .iter()
            .map(|p| p.map_or(Value::Null, |i| row[i].clone()))
            .collect();
        merged.insert(key.clone(), values)?;
    }
    Ok(merged)
}
