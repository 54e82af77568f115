//! 组件角色定义

use std::fmt;

/// 组件角色
///
/// 标记组件在整个应用中的用途，容器内部组件会被排除在某些诊断之外。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    /// 应用组件，由使用者定义的业务组件
    #[default]
    Application,
    /// 支撑组件，较大配置中的辅助部分
    Support,
    /// 基础设施组件，容器内部使用，对最终用户不可见
    Infrastructure,
}

impl Role {
    /// 是否为基础设施组件
    pub fn is_infrastructure(self) -> bool {
        matches!(self, Self::Infrastructure)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Application => "application",
            Self::Support => "support",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(name)
    }
}
