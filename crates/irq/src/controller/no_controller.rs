//! 默认的“无控制器”

use super::IrqController;

/// 启动时每条中断线默认挂接的控制器
///
/// 除 `ack` 以外都是空操作；`ack` 只记录一条“意外中断”诊断，从不 panic。
#[derive(Debug, Default, Clone, Copy)]
pub struct NoController;

impl IrqController for NoController {
    fn name(&self) -> &str {
        "none"
    }

    fn startup(&self, _irq: usize) -> bool {
        false
    }

    fn shutdown(&self, _irq: usize) {}

    fn enable(&self, _irq: usize) {}

    fn disable(&self, _irq: usize) {}

    fn ack(&self, irq: usize) {
        log::warn!("unexpected IRQ trap at vector {:#04x}", irq);
    }

    fn end(&self, _irq: usize) {}
}
