//! 通用中断分发核心
//!
//! 该 crate 提供与硬件无关的中断处理机制：把中断号映射到处理程序链，
//! 跟踪每条线的屏蔽嵌套，在多 CPU 间串行化同一条线的投递，支持中断共享和自动探测。
//!
//! # 组件
//!
//! - [`IrqController`] - 每种硬件中断控制器实现一次的能力接口
//! - [`IrqAction`] - 一个已注册的处理程序
//! - [`IrqDesc`] - 一条中断线的描述符：状态位、depth、处理程序链和控制器
//! - [`Registry`] - 全部描述符组成的表，启动时显式构造
//! - 分发器 - [`Registry::dispatch`]，由陷入层每次硬件到达调用一次
//! - 管理接口 - `request_irq` / `free_irq` / `enable_irq` / `disable_irq` 等
//! - 自动探测 - [`Registry::probe_irq_on`] / [`Registry::probe_irq_off`]
//!
//! # 并发模型
//!
//! 每条线的状态只在该线描述符锁（关中断自旋锁）下修改，但处理程序运行期间从不持有它；
//! `INPROGRESS` 状态位保证同一条线同一时刻最多一个上下文在运行处理程序链，
//! 运行期间再次到达的事件通过 `PENDING` 交给正在运行的上下文重放。
//!
//! 控制器访问共享寄存器时使用更窄的 [`HwLock`]，锁序固定为“描述符锁 → 寄存器锁”。
//!
//! # 架构解耦
//!
//! - `sync::ArchOps`：本地中断屏蔽与当前 CPU ID，使用前必须注册
//! - [`IrqHooks`]：熵池、软中断、延时，构造 [`Registry`] 时传入

#![no_std]

extern crate alloc;

mod action;
pub mod config;
pub mod controller;
mod desc;
mod dispatch;
mod error;
mod flags;
mod hooks;
mod manage;
mod probe;
mod registry;

pub use action::{DevId, IrqAction, IrqHandler, IrqReturn};
pub use controller::{CpuMask, HwLock, IrqController, MaskRegisterController, NoController};
pub use desc::{IrqDesc, IrqLineState};
pub use error::{IrqError, IrqResult};
pub use flags::{IrqFlags, IrqStatus};
pub use hooks::{IrqHooks, NoopHooks};
pub use probe::ProbeOutcome;
pub use registry::Registry;
