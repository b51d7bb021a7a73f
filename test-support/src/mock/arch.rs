//! 架构相关操作的 Mock 实现

use std::cell::Cell;
use std::sync::Once;

use sync::ArchOps;

/// 中断使能位
const SIE: usize = 0x2;

/// 测试中可模拟的最大 CPU 数量
pub const MOCK_MAX_CPUS: usize = 8;

thread_local! {
    static CPU_ID: Cell<usize> = const { Cell::new(0) };
    static INTR_ENABLED: Cell<bool> = const { Cell::new(true) };
}

/// Mock 架构操作
///
/// 中断状态和 CPU ID 都是线程局部的，因此多个测试线程可以并行扮演不同 CPU，
/// 互不干扰。
pub struct MockArchOps;

impl MockArchOps {
    pub const fn new() -> Self {
        Self
    }
}

impl ArchOps for MockArchOps {
    unsafe fn read_and_disable_interrupts(&self) -> usize {
        if INTR_ENABLED.with(|e| e.replace(false)) {
            SIE
        } else {
            0
        }
    }

    unsafe fn restore_interrupts(&self, flags: usize) {
        INTR_ENABLED.with(|e| e.set(flags & SIE != 0));
    }

    fn sstatus_sie(&self) -> usize {
        SIE
    }

    fn cpu_id(&self) -> usize {
        CPU_ID.with(Cell::get)
    }

    fn max_cpu_count(&self) -> usize {
        MOCK_MAX_CPUS
    }
}

/// 全局 Mock 实例
pub static MOCK_ARCH_OPS: MockArchOps = MockArchOps::new();

static INSTALL: Once = Once::new();

/// 向 `sync` 注册 [`MOCK_ARCH_OPS`]，可重复调用
pub fn install() {
    INSTALL.call_once(|| {
        // SAFETY: Once 保证只注册一次
        unsafe { sync::register_arch_ops(&MOCK_ARCH_OPS) };
    });
}

/// 设置当前线程扮演的 CPU
pub fn set_cpu_id(cpu: usize) {
    assert!(cpu < MOCK_MAX_CPUS);
    CPU_ID.with(|c| c.set(cpu));
}

/// 当前线程（CPU）的本地中断是否处于启用状态
pub fn interrupts_enabled() -> bool {
    INTR_ENABLED.with(Cell::get)
}
