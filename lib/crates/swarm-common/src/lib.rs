pub mod agent;
pub mod record;
pub mod registry;

pub use agent::{AgentNode, ConstraintDescriptor, ROOT_AGENT_NAME, TreeDocument};
pub use record::{DeployedAgent, DeploymentRecord, EncryptedBundle, WorkspaceInfo};
pub use registry::{Registry, RegistryObject};
