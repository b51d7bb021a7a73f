//! 中断管理错误类型
//!
//! 管理接口的所有失败都在本地同步返回，可通过 [`IrqError::to_errno()`] 转换为系统调用错误码。
//! "不平衡"类问题（多余的 enable、重复的 free）只记录日志，不作为错误返回；
//! 探测结果见 [`ProbeOutcome`](crate::ProbeOutcome)。

use core::fmt;

/// 中断管理错误类型
///
/// 各错误码对应标准 POSIX errno 值。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrqError {
    /// 中断号越界或参数非法 (-EINVAL)
    InvalidArgument,
    /// 分配处理程序节点失败 (-ENOMEM)
    OutOfMemory,
    /// 中断线已被占用且不能共享 (-EBUSY)
    Busy,
    /// 控制器不支持该操作 (-ENOTSUP)
    NotSupported,
}

impl IrqError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            IrqError::OutOfMemory => -12,
            IrqError::Busy => -16,
            IrqError::InvalidArgument => -22,
            IrqError::NotSupported => -95,
        }
    }
}

impl fmt::Display for IrqError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            IrqError::InvalidArgument => "invalid argument",
            IrqError::OutOfMemory => "out of memory",
            IrqError::Busy => "interrupt line busy",
            IrqError::NotSupported => "operation not supported by controller",
        };
        f.write_str(msg)
    }
}

/// 中断管理接口的结果类型
pub type IrqResult<T> = Result<T, IrqError>;
