//! 组件资格检查钩子

use di_abstractions::{Capabilities, ComponentInstance, HookContext, LifecycleHook};
use infrastructure_common::DependencyError;
use tracing::info;

/// 组件资格检查钩子在钩子链中的名称
pub const ELIGIBILITY_GUARD_NAME: &str = "componentEligibilityGuard";

/// 组件资格检查钩子
///
/// 在生命周期钩子尚未全部注册时创建的组件（通常是钩子实例化的副作用）
/// 无法被所有钩子处理，此钩子在这种情况下记录一条提示信息。
/// 只做观察，不修改组件，也不返回错误。
#[derive(Debug, Clone, Copy)]
pub struct ComponentEligibilityGuard {
    target_hook_count: usize,
}

impl ComponentEligibilityGuard {
    /// 创建资格检查钩子
    pub fn new(target_hook_count: usize) -> Self {
        Self { target_hook_count }
    }

    /// 目标钩子数量
    pub fn target_hook_count(&self) -> usize {
        self.target_hook_count
    }

    /// 组件是否错过了部分生命周期钩子
    pub fn is_ineligible(&self, component: &ComponentInstance, ctx: &HookContext<'_>) -> bool {
        !component.capabilities().contains(Capabilities::LIFECYCLE_HOOK)
            && !ctx.role().is_infrastructure()
            && ctx.hook_count < self.target_hook_count
    }
}

impl LifecycleHook for ComponentEligibilityGuard {
    fn after_initialization(
        &self,
        component: ComponentInstance,
        name: &str,
        ctx: &HookContext<'_>,
    ) -> Result<ComponentInstance, DependencyError> {
        if self.is_ineligible(&component, ctx) {
            info!(
                "组件 '{}' 的类型 [{}] 无法被所有生命周期钩子处理（例如：无法被自动代理）",
                name,
                component.type_info().full_name()
            );
        }
        Ok(component)
    }
}
