//! 中断分发
//!
//! 陷入层解码出中断号后，每次硬件到达调用一次 [`Registry::dispatch`]。
//!
//! 处理程序运行期间不持有描述符锁，`INPROGRESS` 代替锁保证同一条线同一时刻
//! 只有一个上下文在运行处理程序链：
//!
//! 1. 持锁：应答控制器，清除 `REPLAY`/`WAITING`，置 `PENDING`。
//! 2. 若线被屏蔽、已有其他上下文在处理或链为空，直接返回；`PENDING` 留给正在处理的上下文。
//! 3. 否则取链快照，清 `PENDING`、置 `INPROGRESS`，释放锁后完整运行一趟链。
//! 4. 重新持锁：若运行期间 `PENDING` 又被置位（边沿重放），清除后用同一快照再跑一趟。
//! 5. 清 `INPROGRESS`，未被屏蔽时调用控制器 `end`，释放锁后通知下半部。

use sync::IntrGuard;

use crate::action::IrqReturn;
use crate::desc::ActionChain;
use crate::flags::{IrqFlags, IrqStatus};
use crate::registry::Registry;

impl Registry {
    /// 分发一次硬件中断
    ///
    /// 返回值只用于统计：处理程序链运行过且至少一个处理程序报告已处理时返回
    /// [`IrqReturn::Handled`]，被屏蔽、推迟给其他 CPU 或无人认领时返回
    /// [`IrqReturn::NotHandled`]。
    pub fn dispatch(&self, irq: usize) -> IrqReturn {
        let Ok(desc) = self.desc(irq) else {
            log::warn!("unexpected IRQ trap at vector {:#04x}", irq);
            return IrqReturn::NotHandled;
        };
        let cpu = sync::cpu_id();

        let actions = {
            let mut inner = desc.lock();
            inner.count += 1;
            inner.controller.ack(irq);

            inner.status.remove(IrqStatus::REPLAY | IrqStatus::WAITING);
            inner.status.insert(IrqStatus::PENDING);

            // 被屏蔽或另一个上下文正在处理：PENDING 留给它去发现
            if inner
                .status
                .intersects(IrqStatus::DISABLED | IrqStatus::INPROGRESS)
                || inner.actions.is_empty()
            {
                return IrqReturn::NotHandled;
            }

            inner.status.remove(IrqStatus::PENDING);
            inner.status.insert(IrqStatus::INPROGRESS);
            inner.running_cpu = Some(cpu);
            inner.actions.clone()
        };

        let mut ret = IrqReturn::NotHandled;
        let mut inner = loop {
            if self.handle_irq_event(irq, &actions) == IrqReturn::Handled {
                ret = IrqReturn::Handled;
            }

            let mut inner = desc.lock();
            if !inner.status.contains(IrqStatus::PENDING) {
                break inner;
            }
            inner.status.remove(IrqStatus::PENDING);
        };

        inner.status.remove(IrqStatus::INPROGRESS);
        inner.running_cpu = None;
        if !inner.status.contains(IrqStatus::DISABLED) {
            inner.controller.end(irq);
        }
        drop(inner);

        self.hooks.raise_softirq();
        ret
    }

    /// 按注册顺序完整运行一趟处理程序链
    ///
    /// 链中任一处理程序要求严格投递时，整趟都在关本地中断下运行；
    /// 否则保持陷入层给定的中断状态。
    fn handle_irq_event(&self, irq: usize, actions: &ActionChain) -> IrqReturn {
        let flags = actions
            .iter()
            .fold(IrqFlags::empty(), |acc, action| acc | action.flags());
        let _intr_guard = flags
            .contains(IrqFlags::INTR_DISABLED)
            .then(IntrGuard::new);

        let mut ret = IrqReturn::NotHandled;
        for action in actions.iter() {
            if action.invoke(irq) == IrqReturn::Handled {
                ret = IrqReturn::Handled;
            }
        }

        if flags.contains(IrqFlags::SAMPLE_RANDOM) {
            self.hooks.add_interrupt_randomness(irq);
        }
        ret
    }
}
