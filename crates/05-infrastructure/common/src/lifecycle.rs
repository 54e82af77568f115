//! 组件与容器生命周期

/// 组件生命周期类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Lifetime {
    /// 单例模式 - 整个容器生命周期内只创建一个实例
    #[default]
    Singleton,
    /// 瞬时模式 - 每次请求都创建新实例
    Transient,
}

impl Lifetime {
    /// 是否为单例
    pub fn is_singleton(self) -> bool {
        matches!(self, Self::Singleton)
    }
}

/// 容器生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// 未初始化
    #[default]
    Uninitialized,
    /// 初始化中
    Initializing,
    /// 运行中
    Running,
    /// 停止中
    Stopping,
    /// 已停止
    Stopped,
    /// 错误状态
    Error,
}

impl LifecycleState {
    /// 是否可以启动
    pub fn can_start(self) -> bool {
        matches!(self, Self::Uninitialized)
    }

    /// 是否处于运行中
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}
