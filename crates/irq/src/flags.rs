//! 中断线状态位与处理程序标志

use bitflags::bitflags;

bitflags! {
    /// 中断线状态位
    ///
    /// 所有修改都在该线描述符锁的保护下进行。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqStatus: u32 {
        /// 某个执行上下文正在运行这条线的处理程序链
        const INPROGRESS = 1 << 0;
        /// 被 disable 屏蔽（depth > 0）
        const DISABLED   = 1 << 1;
        /// 有一次到达尚未被处理
        const PENDING    = 1 << 2;
        /// 已请求控制器重新注入挂起的事件，尚未再次到达
        const REPLAY     = 1 << 3;
        /// 正在参与自动探测
        const AUTODETECT = 1 << 4;
        /// 自动探测中，尚未观察到到达
        const WAITING    = 1 << 5;
    }
}

bitflags! {
    /// 注册处理程序时传入的标志
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct IrqFlags: u32 {
        /// 允许与其他同样可共享的处理程序共用一条线
        const SHARED        = 1 << 0;
        /// 每趟处理后向熵池贡献时序抖动
        const SAMPLE_RANDOM = 1 << 1;
        /// 严格投递：整趟处理程序链都在关本地中断的情况下运行
        const INTR_DISABLED = 1 << 2;
    }
}
