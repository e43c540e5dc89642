pub mod de;
pub mod registry;
pub mod subscription_models;
