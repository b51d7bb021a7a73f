//! 中断描述符表
//!
//! [`Registry`] 为每条中断线持有一个 [`IrqDesc`]，中断号直接作为下标。
//! 表在启动时显式构造，通过共享引用交给分发器和管理接口，不存在隐式全局变量。

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::sync::atomic::AtomicBool;

use crate::controller::{IrqController, NoController};
use crate::desc::{IrqDesc, IrqLineState};
use crate::error::{IrqError, IrqResult};
use crate::hooks::IrqHooks;

/// 全部中断线的描述符表
pub struct Registry {
    descs: Box<[IrqDesc]>,
    pub(crate) hooks: Arc<dyn IrqHooks>,
    /// 自动探测会话标志，保证同一时刻只有一次探测
    pub(crate) probing: AtomicBool,
}

impl Registry {
    /// 创建 `nr_irqs` 条中断线，全部挂接 [`NoController`]
    pub fn new(nr_irqs: usize, hooks: Arc<dyn IrqHooks>) -> Self {
        let none: Arc<dyn IrqController> = Arc::new(NoController);
        let descs = (0..nr_irqs)
            .map(|irq| IrqDesc::new(irq, none.clone()))
            .collect();
        Self {
            descs,
            hooks,
            probing: AtomicBool::new(false),
        }
    }

    /// 中断线数量
    pub fn nr_irqs(&self) -> usize {
        self.descs.len()
    }

    /// 查找描述符，越界返回 `InvalidArgument`
    pub fn desc(&self, irq: usize) -> IrqResult<&IrqDesc> {
        self.descs.get(irq).ok_or(IrqError::InvalidArgument)
    }

    pub(crate) fn descs(&self) -> &[IrqDesc] {
        &self.descs
    }

    /// 为一条中断线挂接控制器
    ///
    /// 通常在启动阶段调用。线上已有处理程序时拒绝替换，返回 `Busy`。
    pub fn set_controller(&self, irq: usize, controller: Arc<dyn IrqController>) -> IrqResult<()> {
        let desc = self.desc(irq)?;
        let mut inner = desc.lock();
        if !inner.actions.is_empty() {
            return Err(IrqError::Busy);
        }
        inner.controller = controller;
        Ok(())
    }

    /// 读取一条中断线的状态快照
    pub fn line_state(&self, irq: usize) -> Option<IrqLineState> {
        self.descs.get(irq).map(IrqDesc::state)
    }
}
