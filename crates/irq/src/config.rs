//! 中断核心配置常量

/// 自动探测第一阶段：等待长期挂起的中断自行出现（毫秒）
pub const PROBE_LONGSTANDING_MS: u32 = 20;

/// 自动探测的稳定窗口：等待目标设备拉起中断线（毫秒）
pub const PROBE_SETTLE_MS: u32 = 100;

/// `probe_irq_on` / `probe_irq_mask` 返回的位图宽度
///
/// 只有编号小于该值的中断线会出现在位图中，更高的线仍然参与探测，
/// 但只能通过 `probe_irq_off` 的返回值观察到。
pub const PROBE_MASK_WIDTH: usize = 32;

/// 单个 [`MaskRegisterController`](crate::MaskRegisterController) 能管理的中断线数
pub const MAX_CONTROLLER_LINES: usize = 64;

/// 单个 [`MaskRegisterController`](crate::MaskRegisterController) 能路由的 CPU 数
pub const MAX_CONTROLLER_CPUS: usize = 64;
