//! 中断控制器抽象
//!
//! 每种硬件中断控制器实现一次 [`IrqController`]，描述符通过共享引用持有它。
//! 一个控制器实例通常服务多条中断线，所以每个操作都带上中断号。
//!
//! # 锁序
//!
//! 分发器和管理接口会在持有描述符锁时调用控制器操作。控制器若需要保护共享寄存器，
//! 使用更窄的 [`HwLock`]：它只在一次控制器调用内部获取和释放，
//! 绝不能持有它回调进入分发器或管理接口。

mod mask_register;
mod no_controller;

pub use mask_register::MaskRegisterController;
pub use no_controller::NoController;

use crate::error::{IrqError, IrqResult};

/// 控制器寄存器锁
pub type HwLock<T> = sync::SpinMutexWithoutGuard<T>;

/// CPU 位图，第 n 位表示 CPU n
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuMask(u64);

impl CpuMask {
    /// 空位图
    pub const EMPTY: CpuMask = CpuMask(0);

    /// 由原始位构造
    pub const fn from_bits(bits: u64) -> Self {
        CpuMask(bits)
    }

    /// 只包含一个 CPU 的位图；超出 64 的 CPU 得到空位图
    pub const fn from_cpu(cpu: usize) -> Self {
        if cpu < 64 { CpuMask(1 << cpu) } else { CpuMask(0) }
    }

    /// 原始位
    pub const fn bits(&self) -> u64 {
        self.0
    }

    /// 编号最小的 CPU
    pub fn first(&self) -> Option<usize> {
        if self.0 == 0 {
            None
        } else {
            Some(self.0.trailing_zeros() as usize)
        }
    }

    /// 是否包含指定 CPU
    pub fn contains(&self, cpu: usize) -> bool {
        cpu < 64 && self.0 & (1 << cpu) != 0
    }
}

/// 硬件中断控制器的能力集合
pub trait IrqController: Send + Sync {
    /// 控制器名字，仅用于诊断
    fn name(&self) -> &str;

    /// 开始服务一条线；返回 true 表示该线上已经锁存了一个挂起事件
    fn startup(&self, irq: usize) -> bool;

    /// 停止服务一条线
    fn shutdown(&self, irq: usize);

    /// 解除屏蔽
    fn enable(&self, irq: usize);

    /// 屏蔽
    fn disable(&self, irq: usize);

    /// 应答一次到达；即使该线没有处理程序也必须可以安全调用
    fn ack(&self, irq: usize);

    /// 一趟处理结束
    fn end(&self, irq: usize);

    /// 重新注入一个在屏蔽期间锁存的边沿事件；电平触发的控制器可以什么都不做
    fn resend(&self, _irq: usize) {}

    /// 把中断线的服务权迁移到 `cpus` 指定的 CPU
    fn set_affinity(&self, _irq: usize, _cpus: CpuMask) -> IrqResult<()> {
        Err(IrqError::NotSupported)
    }
}
