//! 处理程序节点
//!
//! 每次成功的 `request_irq` 产生一个 [`IrqAction`]，由所属中断线的处理程序链独占持有，
//! 直到 `free_irq` 按 [`DevId`] 找到并摘除它。

use alloc::boxed::Box;
use alloc::string::String;
use core::fmt;

use crate::flags::IrqFlags;

/// 中断处理函数返回值
///
/// 仅用于统计：分发器据此区分“已处理”和“伪中断”，不影响控制流。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqReturn {
    /// 中断未被处理
    NotHandled,
    /// 中断已被处理
    Handled,
}

/// 处理程序的所有者标识
///
/// 对核心来说是不透明的值，`free_irq` 用它在共享链中定位要摘除的节点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DevId(pub usize);

impl DevId {
    /// 空标识；共享中断线上应当避免使用
    pub const NONE: DevId = DevId(0);
}

/// 中断处理程序
///
/// 同一条线的处理程序可能因重放而被连续调用多次，实现必须能容忍这种合并。
pub trait IrqHandler: Send + Sync {
    /// 处理一次中断
    fn handle(&self, irq: usize, dev_id: DevId) -> IrqReturn;
}

impl<F> IrqHandler for F
where
    F: Fn(usize, DevId) -> IrqReturn + Send + Sync,
{
    fn handle(&self, irq: usize, dev_id: DevId) -> IrqReturn {
        self(irq, dev_id)
    }
}

/// 一个已注册的处理程序
pub struct IrqAction {
    handler: Box<dyn IrqHandler>,
    flags: IrqFlags,
    name: String,
    dev_id: DevId,
}

impl IrqAction {
    pub(crate) fn new(
        handler: Box<dyn IrqHandler>,
        flags: IrqFlags,
        name: String,
        dev_id: DevId,
    ) -> Self {
        Self {
            handler,
            flags,
            name,
            dev_id,
        }
    }

    /// 注册时的标志
    pub fn flags(&self) -> IrqFlags {
        self.flags
    }

    /// 注册时的名字
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 所有者标识
    pub fn dev_id(&self) -> DevId {
        self.dev_id
    }

    /// 是否允许共享
    pub fn is_shared(&self) -> bool {
        self.flags.contains(IrqFlags::SHARED)
    }

    pub(crate) fn invoke(&self, irq: usize) -> IrqReturn {
        self.handler.handle(irq, self.dev_id)
    }
}

impl fmt::Debug for IrqAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IrqAction")
            .field("name", &self.name)
            .field("flags", &self.flags)
            .field("dev_id", &self.dev_id)
            .finish_non_exhaustive()
    }
}
