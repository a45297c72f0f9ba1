//! 与运行环境相关的小工具：控制台日志、panic hook、计时。

#[cfg(target_arch = "wasm32")]
use web_sys::js_sys::Date;

/// 输出到浏览器控制台；非 wasm 目标（本地测试）下不输出。
pub fn log(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::log_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

pub fn warn(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&message.into());
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

#[cfg(feature = "console_error_panic_hook")]
pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

#[cfg(not(feature = "console_error_panic_hook"))]
pub fn set_panic_hook() {}

/// wasm32 下没有 `Instant`，改用浏览器时钟。
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    #[cfg(target_arch = "wasm32")]
    started_ms: f64,
    #[cfg(not(target_arch = "wasm32"))]
    started: std::time::Instant,
}

impl Stopwatch {
    #[cfg(target_arch = "wasm32")]
    pub fn start() -> Self {
        Self {
            started_ms: Date::now(),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn start() -> Self {
        Self {
            started: std::time::Instant::now(),
        }
    }

    #[cfg(target_arch = "wasm32")]
    pub fn elapsed_ms(&self) -> u64 {
        (Date::now() - self.started_ms).max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}
