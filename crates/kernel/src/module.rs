use async_trait::async_trait;

/// Context provided to modules during initialization
pub struct InitCtx<'a> {
    pub settings: &'a crate::settings::Settings,
}

/// Lifecycle contract for every piece of process-wide client state.
///
/// Modules are initialized once when the application boots, started whenever a
/// session becomes active, and stopped on logout. A stopped module must be
/// startable again for the next session.
#[async_trait]
pub trait Module: Sync + Send {
    /// Unique name for this module
    fn name(&self) -> &'static str;

    /// Initialize the module with the provided context
    /// Called once during application startup
    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called at boot and again after every successful sign-in
    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Drop all session state held by the module
    /// Called on logout
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}
