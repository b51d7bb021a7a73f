//! 中断管理接口
//!
//! 驱动通过这些接口注册/注销处理程序、嵌套地屏蔽和解除屏蔽中断线、迁移亲和性。
//! 所有修改都在对应描述符的锁下完成；只有 [`Registry::disable_irq`]、
//! [`Registry::synchronize_irq`] 和 [`Registry::free_irq`] 会等待正在进行的分发结束。

use alloc::boxed::Box;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::action::{DevId, IrqAction, IrqHandler};
use crate::controller::CpuMask;
use crate::desc::IrqDesc;
use crate::error::{IrqError, IrqResult};
use crate::flags::{IrqFlags, IrqStatus};
use crate::registry::Registry;

impl Registry {
    /// 为中断线注册一个处理程序
    ///
    /// 线上已有处理程序时，只有新旧处理程序都带 `SHARED` 才能追加到链尾，否则返回 `Busy`。
    /// 链原本为空时，depth 归零、清除 `DISABLED` 并启动控制器。
    ///
    /// 只有链的增长是可失败的：新链的临时缓冲按 `try_reserve_exact` 预留，失败时返回
    /// `OutOfMemory`。处理程序节点、名字以及最终的 `Arc<[_]>` 链存储仍走全局分配器，
    /// 分配失败时按 `alloc` 的约定终止。
    pub fn request_irq<H>(
        &self,
        irq: usize,
        handler: H,
        flags: IrqFlags,
        name: &str,
        dev_id: DevId,
    ) -> IrqResult<()>
    where
        H: IrqHandler + 'static,
    {
        let desc = self.desc(irq)?;
        if flags.contains(IrqFlags::SHARED) && dev_id == DevId::NONE {
            log::warn!("request_irq: {} shares IRQ {} without a dev_id", name, irq);
        }

        let action = Arc::new(IrqAction::new(
            Box::new(handler),
            flags,
            String::from(name),
            dev_id,
        ));
        self.setup_irq(desc, action)?;
        log::debug!("request_irq: IRQ {} -> {} (flags {:?})", irq, name, flags);
        Ok(())
    }

    fn setup_irq(&self, desc: &IrqDesc, action: Arc<IrqAction>) -> IrqResult<()> {
        let irq = desc.irq();
        let mut inner = desc.lock();

        let shared = !inner.actions.is_empty();
        if shared && !(action.is_shared() && inner.actions.iter().all(|a| a.is_shared())) {
            return Err(IrqError::Busy);
        }

        let mut chain = Vec::new();
        chain
            .try_reserve_exact(inner.actions.len() + 1)
            .map_err(|_| IrqError::OutOfMemory)?;
        chain.extend(inner.actions.iter().cloned());
        chain.push(action);
        inner.actions = chain.into();

        if !shared {
            inner.depth = 0;
            inner
                .status
                .remove(IrqStatus::DISABLED | IrqStatus::AUTODETECT | IrqStatus::WAITING);
            if inner.controller.startup(irq) {
                // 启动时已锁存了一个事件：请求控制器重新注入
                inner.status.insert(IrqStatus::PENDING | IrqStatus::REPLAY);
                inner.controller.resend(irq);
            }
        }
        Ok(())
    }

    /// 注销 `dev_id` 对应的处理程序
    ///
    /// 找不到匹配的处理程序时只记录诊断。链变空后中断线回到 `DISABLED`、depth 为 1
    /// 并关闭控制器。返回前等待正在运行的处理程序链结束（从该链自身内部调用时除外）。
    pub fn free_irq(&self, irq: usize, dev_id: DevId) {
        let Ok(desc) = self.desc(irq) else {
            log::warn!("Trying to free IRQ {} which does not exist", irq);
            return;
        };

        let removed = {
            let mut inner = desc.lock();
            let Some(pos) = inner.actions.iter().position(|a| a.dev_id() == dev_id) else {
                drop(inner);
                log::warn!("Trying to free free IRQ {} (dev_id {:#x})", irq, dev_id.0);
                return;
            };

            let removed = inner.actions[pos].clone();
            let chain: Vec<_> = inner
                .actions
                .iter()
                .enumerate()
                .filter(|&(i, _)| i != pos)
                .map(|(_, a)| a.clone())
                .collect();
            inner.actions = chain.into();

            if inner.actions.is_empty() {
                inner.status.insert(IrqStatus::DISABLED);
                inner.depth = 1;
                inner.controller.shutdown(irq);
            }
            removed
        };

        self.wait_for_handlers(desc);
        log::debug!("free_irq: IRQ {} released by {}", irq, removed.name());
    }

    /// 屏蔽中断线，不等待正在进行的分发
    ///
    /// 可以嵌套；每次调用都需要一次 [`Registry::enable_irq`] 与之配对。
    pub fn disable_irq_nosync(&self, irq: usize) -> IrqResult<()> {
        let desc = self.desc(irq)?;
        let mut inner = desc.lock();
        if inner.depth == 0 {
            inner.status.insert(IrqStatus::DISABLED);
            inner.controller.disable(irq);
        }
        inner.depth += 1;
        Ok(())
    }

    /// 屏蔽中断线，并等待正在其他 CPU 上运行的处理程序链结束
    ///
    /// 从这条线自己的处理程序内部调用时不会等待。
    pub fn disable_irq(&self, irq: usize) -> IrqResult<()> {
        self.disable_irq_nosync(irq)?;
        self.synchronize_irq(irq)
    }

    /// 等待中断线当前的处理程序链运行结束
    pub fn synchronize_irq(&self, irq: usize) -> IrqResult<()> {
        let desc = self.desc(irq)?;
        self.wait_for_handlers(desc);
        Ok(())
    }

    fn wait_for_handlers(&self, desc: &IrqDesc) {
        let cpu = sync::cpu_id();
        loop {
            {
                let inner = desc.lock();
                if !inner.status.contains(IrqStatus::INPROGRESS) || inner.is_running_on(cpu) {
                    return;
                }
            }
            self.hooks.cpu_relax();
        }
    }

    /// 解除一层屏蔽
    ///
    /// depth 为 0 时只记录“不平衡”诊断。depth 从 1 归零时清除 `DISABLED`；
    /// 若屏蔽期间有事件到达（`PENDING` 且尚未 `REPLAY`），请求控制器重新注入。
    pub fn enable_irq(&self, irq: usize) -> IrqResult<()> {
        let desc = self.desc(irq)?;
        let mut inner = desc.lock();
        let depth = inner.depth;
        match depth {
            0 => {
                drop(inner);
                log::warn!("enable_irq: unbalanced enable for IRQ {}", irq);
            }
            1 => {
                inner.status.remove(IrqStatus::DISABLED);
                if inner.status & (IrqStatus::PENDING | IrqStatus::REPLAY) == IrqStatus::PENDING {
                    inner.status.insert(IrqStatus::REPLAY);
                    inner.controller.resend(irq);
                }
                inner.controller.enable(irq);
                inner.depth = 0;
            }
            _ => inner.depth -= 1,
        }
        Ok(())
    }

    /// 把中断线的服务权迁移到 `cpus` 指定的 CPU
    ///
    /// 迁移在描述符锁下由控制器原子完成。位图中编号最小的 CPU 必须存在。
    pub fn set_affinity(&self, irq: usize, cpus: CpuMask) -> IrqResult<()> {
        let desc = self.desc(irq)?;
        if cpus.first().is_none_or(|cpu| cpu >= sync::max_cpu_count()) {
            return Err(IrqError::InvalidArgument);
        }
        let mut inner = desc.lock();
        inner.controller.set_affinity(irq, cpus)?;
        inner.affinity = cpus;
        Ok(())
    }
}
