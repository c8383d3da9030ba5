use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing_appender::non_blocking::WorkerGuard;

/// Метрики для LoggingHandle.
#[derive(Debug, Default)]
pub struct LoggingMetrics {
    /// Флаг активного shutdown
    pub shutdown_in_progress: AtomicBool,
    /// Кол-во flush операций
    pub flush_count: AtomicU64,
}

/// Handle для управления lifecycle логирования.
///
/// Держит guard фонового writer'а: пока handle жив, события пишутся; при
/// drop или [`shutdown`](Self::shutdown) буфер сбрасывается.
pub struct LoggingHandle {
    guard: Option<WorkerGuard>,
    /// Метрики логирования
    pub metrics: Arc<LoggingMetrics>,
    /// Timeout для flush при shutdown (по умолчанию 5 секунд)
    flush_timeout: Duration,
}

/// Статистика логирования.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingStats {
    pub flush_count: u64,
    pub shutdown_in_progress: bool,
}

impl LoggingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_flush(&self) {
        self.flush_count.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_flush_count(&self) -> u64 {
        self.flush_count.load(Ordering::Relaxed)
    }

    pub fn is_shutdown_in_progress(&self) -> bool {
        self.shutdown_in_progress.load(Ordering::Acquire)
    }

    fn start_shutdown(&self) {
        self.shutdown_in_progress.store(true, Ordering::Release);
    }
}

impl LoggingHandle {
    pub fn new(guard: Option<WorkerGuard>) -> Self {
        Self {
            guard,
            metrics: Arc::new(LoggingMetrics::new()),
            flush_timeout: Duration::from_secs(5),
        }
    }

    /// Устанавливает custom flush timeout.
    pub fn with_flush_timeout(
        mut self,
        timeout: Duration,
    ) -> Self {
        self.flush_timeout = timeout;
        self
    }

    /// Только учитывает запрос на flush в метриках, сам буфер не сбрасывает.
    ///
    /// У `tracing-appender` нет явного flush: буфер сбрасывается при drop
    /// guard'а, то есть в [`shutdown`](Self::shutdown) или при drop handle'а.
    pub fn flush(&self) {
        self.metrics.record_flush();
        tracing::debug!(
            flush_count = self.metrics.get_flush_count(),
            "Logging flush requested"
        );
    }

    /// Graceful shutdown: сбрасывает буфер и предупреждает, если это заняло
    /// дольше таймаута.
    pub fn shutdown(mut self) {
        self.metrics.start_shutdown();

        tracing::info!(
            total_flushes = self.metrics.get_flush_count(),
            timeout_secs = self.flush_timeout.as_secs(),
            "Initiating logging shutdown"
        );

        let start = Instant::now();
        drop(self.guard.take());
        let elapsed = start.elapsed();

        if elapsed > self.flush_timeout {
            eprintln!(
                "WARNING: Logging shutdown took {}ms (timeout: {}ms)",
                elapsed.as_millis(),
                self.flush_timeout.as_millis()
            );
        }
    }

    pub fn get_metrics(&self) -> LoggingStats {
        LoggingStats {
            flush_count: self.metrics.get_flush_count(),
            shutdown_in_progress: self.metrics.is_shutdown_in_progress(),
        }
    }

    pub fn has_guard(&self) -> bool {
        self.guard.is_some()
    }
}
