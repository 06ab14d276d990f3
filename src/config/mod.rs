//! Configuration module

mod env;
pub mod resolver;
mod site;

pub use env::CmsEnv;
pub use resolver::{resolve, ConfigurationError, Credentials, ExecutionContext, ServiceDomain};
pub use site::SiteConfig;
