//! # Infrastructure Common
//!
//! 这个 crate 提供了容器各层共用的基础类型和错误定义。
//!
//! ## 核心类型
//!
//! - [`Role`] - 组件角色（应用 / 支撑 / 基础设施）
//! - [`Lifetime`] - 组件生命周期
//! - [`LifecycleState`] - 容器运行状态
//! - [`TypeInfo`] - 类型信息
//! - [`DependencyError`] / [`InfrastructureError`] - 错误类型

pub mod component;
pub mod errors;
pub mod lifecycle;
pub mod metadata;

pub use component::*;
pub use errors::*;
pub use lifecycle::*;
pub use metadata::*;
