//! 中断线描述符

use alloc::sync::Arc;
use alloc::vec::Vec;

use sync::{SpinLock, SpinLockGuard};

use crate::action::IrqAction;
use crate::controller::{CpuMask, IrqController};
use crate::flags::IrqStatus;

/// 处理程序链
///
/// 链本身不可变，`request_irq`/`free_irq` 整体替换它；
/// 分发器取快照只需要增加一次引用计数。
pub(crate) type ActionChain = Arc<[Arc<IrqAction>]>;

/// 一条中断线的描述符
///
/// 描述符永不销毁，只会被清空；所有状态都在 `inner` 的锁下修改。
pub struct IrqDesc {
    irq: usize,
    inner: SpinLock<IrqDescInner>,
}

pub(crate) struct IrqDescInner {
    pub(crate) status: IrqStatus,
    /// disable 嵌套深度；`depth == 0` 当且仅当未设置 DISABLED
    pub(crate) depth: u32,
    pub(crate) actions: ActionChain,
    pub(crate) controller: Arc<dyn IrqController>,
    /// 正在运行处理程序链的 CPU，仅在 INPROGRESS 期间有值
    pub(crate) running_cpu: Option<usize>,
    /// 到达次数
    pub(crate) count: u64,
    pub(crate) affinity: CpuMask,
}

impl IrqDesc {
    /// 启动状态：DISABLED、depth 为 1、没有处理程序
    pub(crate) fn new(irq: usize, controller: Arc<dyn IrqController>) -> Self {
        Self {
            irq,
            inner: SpinLock::new(IrqDescInner {
                status: IrqStatus::DISABLED,
                depth: 1,
                actions: Arc::from(Vec::new()),
                controller,
                running_cpu: None,
                count: 0,
                affinity: CpuMask::EMPTY,
            }),
        }
    }

    /// 中断号
    pub fn irq(&self) -> usize {
        self.irq
    }

    pub(crate) fn lock(&self) -> SpinLockGuard<'_, IrqDescInner> {
        self.inner.lock()
    }

    /// 读取一份一致的状态快照
    pub fn state(&self) -> IrqLineState {
        let inner = self.lock();
        IrqLineState {
            status: inner.status,
            depth: inner.depth,
            nr_actions: inner.actions.len(),
            count: inner.count,
            controller: inner.controller.name().into(),
            affinity: inner.affinity,
        }
    }
}

impl IrqDescInner {
    /// 调用者是否就是正在运行这条线处理程序链的上下文
    pub(crate) fn is_running_on(&self, cpu: usize) -> bool {
        self.status.contains(IrqStatus::INPROGRESS) && self.running_cpu == Some(cpu)
    }
}

/// 中断线状态快照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrqLineState {
    /// 状态位
    pub status: IrqStatus,
    /// disable 嵌套深度
    pub depth: u32,
    /// 处理程序链长度
    pub nr_actions: usize,
    /// 到达次数
    pub count: u64,
    /// 控制器名字
    pub controller: alloc::string::String,
    /// 最近一次设置的亲和性
    pub affinity: CpuMask,
}
