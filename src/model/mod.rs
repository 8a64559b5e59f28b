pub mod config;
pub mod intake;

pub use config::{Config, LimitConfig, ProviderConfig, ProviderKind};
pub use intake::{DrillResponse, IntakeMode, IntakeRequest, PrecedentMatch, SessionRecord};
