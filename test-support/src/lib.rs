//! 测试支持 crate
//!
//! 提供宿主机测试用的 Mock 实现：每个测试线程扮演一个 CPU，
//! 拥有独立的 CPU ID 和本地中断使能状态。

pub mod mock;

pub use mock::arch::{
    MOCK_ARCH_OPS, MOCK_MAX_CPUS, MockArchOps, install, interrupts_enabled, set_cpu_id,
};
