// ==========================================
// 库存覆盖分析引擎 - 阶段耗时统计
// ==========================================
// 开关:
// - Debug 默认开启；Release 默认关闭
// - `STOCK_COVER_PERF=1` 强制开启, `STOCK_COVER_PERF=0` 强制关闭
// ==========================================

use std::cell::Cell;
use std::sync::OnceLock;
use std::time::Instant;

static PERF_ENABLED: OnceLock<bool> = OnceLock::new();

thread_local! {
    static PERF_DEPTH: Cell<u32> = const { Cell::new(0) };
}

fn is_true(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 是否启用耗时统计（首次调用时读取环境变量）
pub fn perf_enabled() -> bool {
    *PERF_ENABLED.get_or_init(|| match std::env::var("STOCK_COVER_PERF") {
        Ok(v) => is_true(&v),
        Err(_) => cfg!(debug_assertions),
    })
}

/// 阶段耗时 Guard：drop 时记录 elapsed_ms（target = "perf"）
///
/// 使用方式：
/// ```ignore
/// let _perf = stock_cover::perf::PerfGuard::new("sales_aggregation");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    depth: u32,
    enabled: bool,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        let depth = PERF_DEPTH.with(|d| {
            let depth = d.get();
            d.set(depth.saturating_add(1));
            depth
        });
        Self {
            op,
            start: Instant::now(),
            depth,
            enabled: perf_enabled(),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));

        if !self.enabled {
            return;
        }

        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        tracing::info!(
            target: "perf",
            op = self.op,
            depth = self.depth,
            elapsed_ms,
            "done"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_true() {
        assert!(is_true(" YES "));
        assert!(is_true("1"));
        assert!(!is_true("off"));
    }

    #[test]
    fn test_nested_guards_track_depth() {
        let outer = PerfGuard::new("outer");
        {
            let inner = PerfGuard::new("inner");
            assert_eq!(inner.depth, outer.depth + 1);
        }
        let sibling = PerfGuard::new("sibling");
        assert_eq!(sibling.depth, outer.depth + 1);
    }
}
