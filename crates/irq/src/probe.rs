//! 中断自动探测
//!
//! 当驱动不知道设备连在哪条中断线上时，用两阶段探测从设备本身学习映射：
//!
//! ```ignore
//! let candidates = registry.probe_irq_on();
//! // 让设备产生一次中断
//! match registry.probe_irq_off(candidates) {
//!     ProbeOutcome::Found(irq) => { /* 设备在 irq 上 */ }
//!     _ => { /* 没找到或不唯一 */ }
//! }
//! ```
//!
//! 探测期间所有空闲线都被临时启动；稳定窗口内真正经过分发器的线会被清掉
//! `WAITING`，从而被识别为候选。0 号线不参与探测，因为 0 是“没找到”的哨兵值。

use core::sync::atomic::Ordering;

use crate::config::{PROBE_LONGSTANDING_MS, PROBE_MASK_WIDTH, PROBE_SETTLE_MS};
use crate::flags::IrqStatus;
use crate::registry::Registry;

/// 一次探测的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 没有任何线到达
    NotFound,
    /// 恰好一条线到达
    Found(usize),
    /// 多条线到达，携带到达的线数
    Ambiguous(usize),
}

impl ProbeOutcome {
    /// 传统的整数编码：0 表示没找到，正数为中断号，负数为候选线数取负
    pub fn as_raw(&self) -> isize {
        match *self {
            ProbeOutcome::NotFound => 0,
            ProbeOutcome::Found(irq) => irq as isize,
            ProbeOutcome::Ambiguous(count) => -(count as isize),
        }
    }
}

impl Registry {
    /// 开始一次自动探测
    ///
    /// 启动所有没有处理程序的线并等待稳定窗口，窗口内没有到达的线被剔除。
    /// 返回仍在候选中的线的位图，只覆盖前 [`PROBE_MASK_WIDTH`] 条线。
    /// 同一时刻只允许一次探测，后来者会等待前一次结束。
    pub fn probe_irq_on(&self) -> u32 {
        while self
            .probing
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            self.hooks.cpu_relax();
        }

        // 先启动一遍，让长期挂起的中断先冒出来
        for desc in self.descs().iter().skip(1).rev() {
            let inner = desc.lock();
            if inner.actions.is_empty() {
                inner.controller.startup(desc.irq());
            }
        }
        self.hooks.mdelay(PROBE_LONGSTANDING_MS);

        // 再次启动：上一阶段到达过的线可能已经把自己屏蔽了
        for desc in self.descs().iter().skip(1).rev() {
            let mut inner = desc.lock();
            if inner.actions.is_empty() {
                inner.status.insert(IrqStatus::AUTODETECT | IrqStatus::WAITING);
                if inner.controller.startup(desc.irq()) {
                    inner.status.insert(IrqStatus::PENDING);
                }
            }
        }
        self.hooks.mdelay(PROBE_SETTLE_MS);

        let mut mask = 0u32;
        for desc in self.descs() {
            let irq = desc.irq();
            let mut inner = desc.lock();
            if !inner.status.contains(IrqStatus::AUTODETECT) {
                continue;
            }
            if inner.status.contains(IrqStatus::WAITING) {
                // 窗口内没有到达，不是候选
                inner.status.remove(IrqStatus::AUTODETECT | IrqStatus::WAITING);
                inner.controller.shutdown(irq);
                continue;
            }
            if irq < PROBE_MASK_WIDTH {
                mask |= 1 << irq;
            }
        }
        log::debug!("probe_irq_on: candidates {:#010x}", mask);
        mask
    }

    /// 结束探测并给出唯一到达的线
    ///
    /// `_candidates` 是 `probe_irq_on` 的返回值，只为保持调用约定；
    /// 结果总是基于所有仍在探测中的线计算。
    pub fn probe_irq_off(&self, _candidates: u32) -> ProbeOutcome {
        let mut nr_found = 0;
        let mut first = 0;
        self.finish_probe(|irq, fired| {
            if fired {
                if nr_found == 0 {
                    first = irq;
                }
                nr_found += 1;
            }
        });

        let outcome = match nr_found {
            0 => ProbeOutcome::NotFound,
            1 => ProbeOutcome::Found(first),
            n => ProbeOutcome::Ambiguous(n),
        };
        log::debug!("probe_irq_off: {:?}", outcome);
        outcome
    }

    /// 结束探测并返回 `mask` 中到达过的线
    ///
    /// 与 [`Registry::probe_irq_off`] 二选一，用于需要观察多条候选线的驱动。
    pub fn probe_irq_mask(&self, mask: u32) -> u32 {
        let mut fired_mask = 0u32;
        self.finish_probe(|irq, fired| {
            if fired && irq < PROBE_MASK_WIDTH {
                fired_mask |= 1 << irq;
            }
        });
        fired_mask & mask
    }

    /// 关闭所有仍在探测中的线，对每条线回调 `(irq, 是否到达过)`，然后释放探测会话
    fn finish_probe(&self, mut visit: impl FnMut(usize, bool)) {
        for desc in self.descs() {
            let irq = desc.irq();
            let mut inner = desc.lock();
            if !inner.status.contains(IrqStatus::AUTODETECT) {
                continue;
            }
            visit(irq, !inner.status.contains(IrqStatus::WAITING));
            inner.status.remove(IrqStatus::AUTODETECT | IrqStatus::WAITING);
            inner.controller.shutdown(irq);
        }

        if !self.probing.swap(false, Ordering::Release) {
            log::warn!("probe: session ended without probe_irq_on");
        }
    }
}
