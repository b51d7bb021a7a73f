//! 每 CPU 屏蔽寄存器型中断控制器
//!
//! 这一族控制器为每个 CPU 提供一个屏蔽字（置位 = 屏蔽），另有一个锁存字记录
//! 已经拉起但尚未应答的中断线。每条线同一时刻只路由给一个“所有者” CPU，
//! 只有所有者的屏蔽字决定该线是否能投递。
//!
//! 寄存器内容存放在 [`HwLock`] 中：这就是与描述符锁分离的、更窄的硬件访问临界区。

use alloc::vec;
use alloc::vec::Vec;

use super::{CpuMask, HwLock, IrqController};
use crate::config::{MAX_CONTROLLER_CPUS, MAX_CONTROLLER_LINES};
use crate::error::{IrqError, IrqResult};

struct MaskRegs {
    /// 每个 CPU 一个屏蔽字
    mask: Vec<u64>,
    /// 锁存的挂起位
    latch: u64,
    /// 每条线的所有者 CPU
    owner: Vec<usize>,
}

/// 每 CPU 屏蔽寄存器型中断控制器
///
/// 服务中断号 `[base, base + nr_lines)`，启动时所有线都被屏蔽、归 CPU 0 所有。
pub struct MaskRegisterController {
    name: &'static str,
    base: usize,
    nr_lines: usize,
    nr_cpus: usize,
    regs: HwLock<MaskRegs>,
}

impl MaskRegisterController {
    /// 创建控制器
    ///
    /// `nr_lines` 不能超过 [`MAX_CONTROLLER_LINES`]，`nr_cpus` 必须在
    /// `1..=MAX_CONTROLLER_CPUS` 之内。
    pub fn new(name: &'static str, base: usize, nr_lines: usize, nr_cpus: usize) -> IrqResult<Self> {
        if nr_lines > MAX_CONTROLLER_LINES || nr_cpus == 0 || nr_cpus > MAX_CONTROLLER_CPUS {
            return Err(IrqError::InvalidArgument);
        }
        Ok(Self {
            name,
            base,
            nr_lines,
            nr_cpus,
            regs: HwLock::new(MaskRegs {
                mask: vec![u64::MAX; nr_cpus],
                latch: 0,
                owner: vec![0; nr_lines],
            }),
        })
    }

    /// 该控制器服务的第一个中断号
    pub fn base(&self) -> usize {
        self.base
    }

    /// 该控制器服务的中断线数量
    pub fn nr_lines(&self) -> usize {
        self.nr_lines
    }

    fn line(&self, irq: usize) -> Option<usize> {
        let line = irq.checked_sub(self.base)?;
        if line < self.nr_lines {
            Some(line)
        } else {
            log::warn!("{}: IRQ {} is not routed through this controller", self.name, irq);
            None
        }
    }

    fn set_masked(&self, irq: usize, masked: bool) {
        let Some(line) = self.line(irq) else {
            return;
        };
        let mut regs = self.regs.lock();
        let owner = regs.owner[line];
        if masked {
            regs.mask[owner] |= 1 << line;
        } else {
            regs.mask[owner] &= !(1 << line);
        }
    }

    /// 模拟硬件拉起一条中断线：置位锁存位
    ///
    /// 返回该事件此刻能否投递给所有者 CPU（即该线在所有者处未被屏蔽）。
    pub fn raise(&self, irq: usize) -> bool {
        let Some(line) = self.line(irq) else {
            return false;
        };
        let mut regs = self.regs.lock();
        regs.latch |= 1 << line;
        let owner = regs.owner[line];
        regs.mask[owner] & (1 << line) == 0
    }

    /// 中断线在指定 CPU 的屏蔽字中是否被屏蔽
    pub fn is_masked(&self, cpu: usize, irq: usize) -> bool {
        match self.line(irq) {
            Some(line) if cpu < self.nr_cpus => self.regs.lock().mask[cpu] & (1 << line) != 0,
            _ => true,
        }
    }

    /// 中断线是否有锁存的挂起事件
    pub fn is_latched(&self, irq: usize) -> bool {
        self.line(irq)
            .is_some_and(|line| self.regs.lock().latch & (1 << line) != 0)
    }

    /// 中断线当前的所有者 CPU
    pub fn owner(&self, irq: usize) -> Option<usize> {
        self.line(irq).map(|line| self.regs.lock().owner[line])
    }
}

impl IrqController for MaskRegisterController {
    fn name(&self) -> &str {
        self.name
    }

    fn startup(&self, irq: usize) -> bool {
        self.set_masked(irq, false);
        self.is_latched(irq)
    }

    fn shutdown(&self, irq: usize) {
        self.set_masked(irq, true);
    }

    fn enable(&self, irq: usize) {
        self.set_masked(irq, false);
    }

    fn disable(&self, irq: usize) {
        self.set_masked(irq, true);
    }

    /// 屏蔽并清除锁存位，处理结束后由 `end` 解除屏蔽
    fn ack(&self, irq: usize) {
        let Some(line) = self.line(irq) else {
            return;
        };
        let mut regs = self.regs.lock();
        let owner = regs.owner[line];
        regs.mask[owner] |= 1 << line;
        regs.latch &= !(1 << line);
    }

    fn end(&self, irq: usize) {
        self.set_masked(irq, false);
    }

    fn resend(&self, irq: usize) {
        if let Some(line) = self.line(irq) {
            self.regs.lock().latch |= 1 << line;
        }
    }

    /// 在旧所有者处屏蔽，迁移所有权；只有迁移前未被屏蔽时才在新所有者处解除屏蔽
    fn set_affinity(&self, irq: usize, cpus: CpuMask) -> IrqResult<()> {
        let line = self.line(irq).ok_or(IrqError::InvalidArgument)?;
        let Some(target) = cpus.first().filter(|&cpu| cpu < self.nr_cpus) else {
            log::warn!(
                "{}: no free controller slot for IRQ {} in cpu mask {:#x}",
                self.name,
                irq,
                cpus.bits()
            );
            return Err(IrqError::InvalidArgument);
        };

        let mut regs = self.regs.lock();
        let old = regs.owner[line];
        let was_unmasked = regs.mask[old] & (1 << line) == 0;
        regs.mask[old] |= 1 << line;
        regs.owner[line] = target;
        if was_unmasked {
            regs.mask[target] &= !(1 << line);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_bad_geometry() {
        assert!(MaskRegisterController::new("t", 0, MAX_CONTROLLER_LINES + 1, 1).is_err());
        assert!(MaskRegisterController::new("t", 0, 8, 0).is_err());
        assert!(MaskRegisterController::new("t", 0, 8, MAX_CONTROLLER_CPUS + 1).is_err());
    }

    #[test]
    fn test_lines_start_masked() {
        let ctrl = MaskRegisterController::new("t", 16, 8, 2).unwrap();
        assert!(ctrl.is_masked(0, 16));
        assert!(!ctrl.raise(16));
        assert!(ctrl.is_latched(16));
    }

    #[test]
    fn test_startup_reports_latched_event() {
        let ctrl = MaskRegisterController::new("t", 0, 8, 1).unwrap();
        assert!(!ctrl.startup(3));
        assert!(!ctrl.is_masked(0, 3));

        ctrl.shutdown(3);
        ctrl.raise(3);
        assert!(ctrl.startup(3));
    }

    #[test]
    fn test_ack_masks_and_clears_latch_end_unmasks() {
        let ctrl = MaskRegisterController::new("t", 0, 8, 1).unwrap();
        ctrl.startup(2);
        assert!(ctrl.raise(2));
        ctrl.ack(2);
        assert!(ctrl.is_masked(0, 2));
        assert!(!ctrl.is_latched(2));
        ctrl.end(2);
        assert!(!ctrl.is_masked(0, 2));
    }

    #[test]
    fn test_out_of_range_irq_is_ignored() {
        let ctrl = MaskRegisterController::new("t", 8, 4, 1).unwrap();
        ctrl.enable(2);
        ctrl.enable(12);
        assert!(ctrl.is_masked(0, 2));
        assert_eq!(ctrl.owner(12), None);
        assert!(!ctrl.raise(40));
    }

    #[test]
    fn test_affinity_moves_unmasked_line() {
        let ctrl = MaskRegisterController::new("t", 0, 8, 4).unwrap();
        ctrl.enable(5);
        ctrl.set_affinity(5, CpuMask::from_cpu(2)).unwrap();

        assert_eq!(ctrl.owner(5), Some(2));
        assert!(ctrl.is_masked(0, 5));
        assert!(!ctrl.is_masked(2, 5));
    }

    #[test]
    fn test_affinity_keeps_masked_line_masked() {
        let ctrl = MaskRegisterController::new("t", 0, 8, 4).unwrap();
        ctrl.set_affinity(5, CpuMask::from_bits(0b1100)).unwrap();

        assert_eq!(ctrl.owner(5), Some(2));
        assert!(ctrl.is_masked(0, 5));
        assert!(ctrl.is_masked(2, 5));
    }

    #[test]
    fn test_affinity_without_routable_cpu() {
        let ctrl = MaskRegisterController::new("t", 0, 8, 2).unwrap();
        assert_eq!(
            ctrl.set_affinity(1, CpuMask::from_cpu(5)),
            Err(IrqError::InvalidArgument)
        );
        assert_eq!(
            ctrl.set_affinity(1, CpuMask::EMPTY),
            Err(IrqError::InvalidArgument)
        );
        assert_eq!(ctrl.owner(1), Some(0));
    }
}
