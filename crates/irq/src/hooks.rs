//! 中断核心依赖的外部协作者
//!
//! 熵池、软中断引擎和延时由平台代码提供，通过 [`IrqHooks`] 传入
//! [`Registry`](crate::Registry)。

/// 外部协作者接口
pub trait IrqHooks: Send + Sync {
    /// 向熵池贡献一次中断时序（仅对带 `SAMPLE_RANDOM` 的处理程序链调用）
    fn add_interrupt_randomness(&self, irq: usize);

    /// 通知下半部处理可能有工作要做；分发器不等待其完成
    fn raise_softirq(&self);

    /// 忙等指定毫秒数，仅用于自动探测的稳定窗口
    fn mdelay(&self, ms: u32);

    /// 等待其他 CPU 时的让步动作
    fn cpu_relax(&self) {
        core::hint::spin_loop();
    }
}

/// 什么也不做的协作者
///
/// 适用于没有熵池和软中断引擎的早期启动阶段；`mdelay` 立即返回。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHooks;

impl IrqHooks for NoopHooks {
    fn add_interrupt_randomness(&self, _irq: usize) {}

    fn raise_softirq(&self) {}

    fn mdelay(&self, _ms: u32) {}
}
