//! # 应用容器组合层
//!
//! 这个 crate 把组件工厂、后置处理器编排、配置加载和日志初始化组合成一个
//! 可以刷新和关闭的应用容器。
//!
//! ## 主要功能
//!
//! - **应用容器构建器**: 使用构建者模式组装组件定义和外部后置处理器
//! - **配置加载**: 从配置文件和环境变量加载容器配置
//! - **生命周期管理**: 刷新（后置处理、钩子注册、单例预创建）和关闭
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use infrastructure_composition::ApplicationContext;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut context = ApplicationContext::builder()
//!         .display_name("demo")
//!         .build()?;
//!
//!     context.refresh()?;
//!     let service = context.get::<String>("service")?;
//!     println!("服务: {}", service);
//!
//!     context.close()?;
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod context;


// 重新导出主要类型
pub use builder::{ApplicationContextBuilder, LoggingConfig};
pub use config::{ContextConfig, LoggingSettings, ENV_PREFIX};
pub use context::ApplicationContext;

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;
