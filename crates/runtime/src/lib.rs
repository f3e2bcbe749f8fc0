//! Runtime for the chatsync client: tracing setup, the REST baseline client,
//! the channel bridge, and the session event loop.

pub mod api;
pub mod channel;
pub mod driver;
pub mod session;

pub use api::{ConversationApi, HttpConversationApi};
pub use channel::{ChannelCommand, ForwardingChannel};
pub use driver::{run, SessionCommand, SessionInput};
pub use session::SyncSession;

pub mod telemetry {
    use anyhow::Result;
    use tracing::Level;
    use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

    pub fn init_tracing() -> Result<()> {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let subscriber = SubscriberBuilder::default()
            .with_max_level(Level::TRACE)
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .map_err(|error| anyhow::anyhow!("failed to set tracing subscriber: {error}"))
    }
}
