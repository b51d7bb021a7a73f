//! 不屏蔽中断的窄自旋锁
//!
//! 中断控制器在访问共享寄存器时使用这把锁。调用方（描述符锁的持有者或
//! 分发路径）已经处在关中断的上下文中，这里只需要跨 CPU 的互斥。
//!
//! 锁序：描述符锁 → 寄存器锁。寄存器锁只能在一次控制器操作内部获取并释放，
//! 不允许持有它回调分发器或管理接口。

use core::{
    hint,
    sync::atomic::{AtomicBool, Ordering},
};

use lock_api::{GuardSend, RawMutex};

/// 不触碰中断状态的原始自旋锁
///
/// 实现了 [`lock_api::RawMutex`]，通过 [`SpinMutexWithoutGuard`] 包装数据使用。
#[derive(Debug)]
pub struct RawSpinLockWithoutGuard {
    lock: AtomicBool,
}

impl RawSpinLockWithoutGuard {
    /// 创建一个未加锁的实例
    pub const fn new() -> Self {
        Self {
            lock: AtomicBool::new(false),
        }
    }
}

impl Default for RawSpinLockWithoutGuard {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: lock/unlock 通过 Acquire/Release 原子操作提供互斥
unsafe impl RawMutex for RawSpinLockWithoutGuard {
    #[allow(clippy::declare_interior_mutable_const)]
    const INIT: Self = Self::new();

    type GuardMarker = GuardSend;

    fn lock(&self) {
        while !self.try_lock() {
            while self.lock.load(Ordering::Relaxed) {
                hint::spin_loop();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.lock
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        self.lock.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.lock.load(Ordering::Relaxed)
    }
}

/// 用 [`RawSpinLockWithoutGuard`] 保护数据的互斥锁
pub type SpinMutexWithoutGuard<T> = lock_api::Mutex<RawSpinLockWithoutGuard, T>;

/// [`SpinMutexWithoutGuard`] 的 RAII 保护器
pub type SpinMutexWithoutGuardGuard<'a, T> =
    lock_api::MutexGuard<'a, RawSpinLockWithoutGuard, T>;
