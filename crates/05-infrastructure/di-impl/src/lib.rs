//! # 依赖注入具体实现
//!
//! 提供容器启动期的后置处理器编排、生命周期钩子注册以及一个内存中的默认组件工厂。
//!
//! ## 主要类型
//!
//! - [`PostProcessorDelegate`] - 注册表/工厂后置处理与生命周期钩子注册
//! - [`OrderingResolver`] - 扩展排序
//! - [`ComponentEligibilityGuard`] - 检测错过部分生命周期钩子的组件
//! - [`ApplicationListenerDetector`] - 登记单例事件监听器
//! - [`DefaultComponentFactory`] - 默认组件工厂

pub mod factory;
pub mod guard;
pub mod listener;
pub mod ordering;
pub mod post_processors;

pub use factory::DefaultComponentFactory;
pub use guard::{ComponentEligibilityGuard, ELIGIBILITY_GUARD_NAME};
pub use listener::{ApplicationListenerDetector, ListenerRegistry, LISTENER_DETECTOR_NAME};
pub use ordering::OrderingResolver;
pub use post_processors::PostProcessorDelegate;
