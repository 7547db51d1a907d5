//! 수집 통계 구조체.

use std::time::Duration;

use streamer_core::Attribute;

/// 수집 주기 1회 통계
#[derive(Debug, Clone)]
pub struct CycleStats {
    /// 수집 속성
    pub attribute: Attribute,
    /// 대상 심볼 수
    pub total: usize,
    /// 조회 성공 수
    pub success: usize,
    /// 조회 실패 수 (재시도 소진 또는 영구 에러)
    pub failed: usize,
    /// 저장된 행 수
    pub written: usize,
    /// 조회 소요 시간
    pub fetch_elapsed: Duration,
    /// 전체 소요 시간 (조회 + 저장)
    pub elapsed: Duration,
}

impl CycleStats {
    /// 새 통계 객체 생성
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            total: 0,
            success: 0,
            failed: 0,
            written: 0,
            fetch_elapsed: Duration::ZERO,
            elapsed: Duration::ZERO,
        }
    }

    /// 성공률 계산 (%)
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.success as f64 / self.total as f64) * 100.0
        }
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self) {
        tracing::info!(
            attribute = %self.attribute,
            total = self.total,
            success = self.success,
            failed = self.failed,
            written = self.written,
            success_rate = format!("{:.1}%", self.success_rate()),
            fetch_elapsed = format!("{:.2}s", self.fetch_elapsed.as_secs_f64()),
            elapsed = format!("{:.2}s", self.elapsed.as_secs_f64()),
            "수집 주기 완료"
        );
    }
}

/// 루프 종료 사유
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// 종료 신호
    Cancelled,
    /// 복구 불가 에러 (저장소 재시도 소진 등)
    Fatal(String),
}

/// 루프 전체 실행 결과
#[derive(Debug, Clone)]
pub struct LoopReport {
    pub attribute: Attribute,
    /// 완료된 주기 수 (조회 + 저장 모두 끝난 주기)
    pub cycles: u64,
    /// 마감 시간 초과로 건너뛴 주기 수
    pub missed_cycles: u64,
    /// 저장된 총 행 수
    pub rows_written: u64,
    /// 심볼 조회 실패 누적 수
    pub fetch_failures: u64,
    pub exit: LoopExit,
}

impl LoopReport {
    /// 새 리포트 생성
    pub fn new(attribute: Attribute) -> Self {
        Self {
            attribute,
            cycles: 0,
            missed_cycles: 0,
            rows_written: 0,
            fetch_failures: 0,
            exit: LoopExit::Cancelled,
        }
    }

    /// 주기 통계 누적
    pub fn record(&mut self, stats: &CycleStats) {
        self.cycles += 1;
        self.rows_written += stats.written as u64;
        self.fetch_failures += stats.failed as u64;
    }

    /// 비정상 종료 여부
    pub fn is_fatal(&self) -> bool {
        matches!(self.exit, LoopExit::Fatal(_))
    }

    /// 리포트 요약 로그 출력
    pub fn log_summary(&self) {
        match &self.exit {
            LoopExit::Cancelled => tracing::info!(
                attribute = %self.attribute,
                cycles = self.cycles,
                missed_cycles = self.missed_cycles,
                rows_written = self.rows_written,
                fetch_failures = self.fetch_failures,
                "루프 정상 종료"
            ),
            LoopExit::Fatal(reason) => tracing::error!(
                attribute = %self.attribute,
                cycles = self.cycles,
                missed_cycles = self.missed_cycles,
                rows_written = self.rows_written,
                fetch_failures = self.fetch_failures,
                reason = %reason,
                "루프 비정상 종료"
            ),
        }
    }
}
