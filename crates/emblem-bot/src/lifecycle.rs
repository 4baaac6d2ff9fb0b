//! Bot lifecycle: everything between "the process started" and "commands
//! are being served".
//!
//! All user-facing behaviour is gated on an explicit state. The bot stays
//! `Unjoined` until a resume pass has verified membership, permissions and
//! the designated channel, and installed a fully realized rank registry.
//! Re-running resume once `Ready` is a no-op, so repeated ready events are
//! harmless.

use std::fs;

use async_trait::async_trait;
use emblem_client::{Channel, ClientError, Permissions, Server, User};
use emblem_core::{
    Colour, ColourFormatError, LiveRoles, RankRegistry, RealizeError, RoleCreator, RoleHandle,
    SnapshotError,
};
use emblem_store::{Store, StoreError};
use thiserror::Error;
use tracing::{error, info};

use crate::config::BotSettings;
use crate::platform::Platform;
use crate::texts::Texts;

/// Cache key holding the joined server's id.
const SERVER_KEY: &str = "server";
/// Cache key holding the registry snapshot.
const REGISTRY_KEY: &str = "registry";

/// Why a resume pass could not complete. None of these are fatal to the
/// process: the bot stays un-initialized and waits for a corrective event.
#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("not joined to any server")]
    NotJoined,

    #[error("missing the permission to {0}")]
    MissingPermission(&'static str),

    #[error("designated channel {0:?} not found")]
    ChannelNotFound(String),

    #[error("rank definition {path:?} could not be read")]
    DefinitionUnreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Definition(#[from] ColourFormatError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Realize(#[from] RealizeError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Platform(#[from] ClientError),
}

/// Lifecycle state.
pub enum BotState {
    Unjoined,
    Ready(Session),
}

/// Everything a successful resume resolves.
pub struct Session {
    pub server: Server,
    pub channel: Channel,
    pub registry: RankRegistry,
}

pub struct Bot<P: Platform> {
    pub(crate) platform: P,
    pub(crate) store: Store,
    pub(crate) texts: Texts,
    pub(crate) settings: BotSettings,
    pub(crate) state: BotState,
    pub(crate) me: Option<User>,
}

impl<P: Platform> Bot<P> {
    pub fn new(platform: P, store: Store, texts: Texts, settings: BotSettings) -> Self {
        Self { platform, store, texts, settings, state: BotState::Unjoined, me: None }
    }

    /// Seed the bot's own identity from the gateway `READY` payload.
    pub fn set_me(&mut self, user: User) {
        self.me = Some(user);
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, BotState::Ready(_))
    }

    async fn me(&mut self) -> Result<User, ClientError> {
        match &self.me {
            Some(user) => Ok(user.clone()),
            None => {
                let user = self.platform.current_user().await?;
                self.me = Some(user.clone());
                Ok(user)
            }
        }
    }

    /// The single lifecycle transition.
    ///
    /// Verifies membership, required permissions and the designated
    /// channel, installs the rank registry (snapshot preferred, definition
    /// file otherwise) and runs a realization pass over it. The snapshot
    /// is re-persisted whenever realization changed anything, so a crash
    /// mid-pass never loses roles that were already created.
    pub async fn resume(&mut self) -> Result<(), ResumeError> {
        if self.is_ready() {
            return Ok(());
        }

        let Some(server_id) = self.store.load::<String>(SERVER_KEY)? else {
            info!("no server joined yet, waiting for an invite");
            return Err(ResumeError::NotJoined);
        };

        let server = match self.platform.get_server(&server_id).await {
            Ok(server) => server,
            Err(err) if err.is_gone() => {
                error!("the joined server is gone, purging the cached identity");
                self.store.purge(SERVER_KEY)?;
                return Err(ResumeError::NotJoined);
            }
            Err(err) => return Err(err.into()),
        };

        let me = self.me().await?;
        let member = match self.platform.get_member(&server.id, &me.id).await {
            Ok(member) => member,
            Err(err) if err.is_gone() => {
                error!("no longer a member of the joined server, purging the cached identity");
                self.store.purge(SERVER_KEY)?;
                return Err(ResumeError::NotJoined);
            }
            Err(err) => return Err(err.into()),
        };

        let permissions = Permissions::from_bits_truncate(member.permissions);
        if !permissions.has(Permissions::SEND_MESSAGES) {
            return Err(ResumeError::MissingPermission("send messages"));
        }
        if !permissions.has(Permissions::MANAGE_ROLES) {
            return Err(ResumeError::MissingPermission("manage roles"));
        }

        let channel = self
            .platform
            .list_channels(&server.id)
            .await?
            .into_iter()
            .find(|channel| channel.name == self.settings.channel)
            .ok_or_else(|| ResumeError::ChannelNotFound(self.settings.channel.clone()))?;

        let live = LiveRoles::new(
            self.platform
                .list_roles(&server.id)
                .await?
                .into_iter()
                .map(|role| RoleHandle { id: role.id, name: role.name }),
        );

        let mut registry = match self.store.load::<Vec<serde_json::Value>>(REGISTRY_KEY)? {
            Some(records) => {
                info!(entries = records.len(), "restoring the rank registry from its snapshot");
                RankRegistry::from_snapshot(&records, &live)?
            }
            None => {
                let path = &self.settings.ranks_path;
                let text = fs::read_to_string(path).map_err(|source| {
                    ResumeError::DefinitionUnreadable { path: path.clone(), source }
                })?;
                let registry = RankRegistry::from_definition(&text)?;
                info!(ranks = registry.len(), path = %path, "loaded rank definitions");
                registry
            }
        };

        let creator = ServerRoles { platform: &self.platform, server_id: &server.id };
        let outcome = registry.realize_all(&creator).await;
        if outcome.changed {
            self.store.save(REGISTRY_KEY, &registry.to_snapshot())?;
        }
        if let Some(realize_error) = outcome.error {
            return Err(realize_error.into());
        }

        let preview: Vec<&str> = registry.iter().map(|entry| entry.name()).take(5).collect();
        info!(
            server = %server.name,
            channel = %channel.name,
            ranks = registry.len(),
            first = ?preview,
            "initialization complete"
        );
        self.state = BotState::Ready(Session { server, channel, registry });
        Ok(())
    }

    /// Record a fresh join and run a resume pass. Missing permissions on
    /// this path unwind the membership entirely (leave, then purge) so the
    /// bot never lingers somewhere it cannot operate.
    pub async fn on_server_join(&mut self, server_id: &str) -> Result<(), ResumeError> {
        self.store.save(SERVER_KEY, &server_id.to_owned())?;
        match self.resume().await {
            Err(ResumeError::MissingPermission(permission)) => {
                error!(permission, "cannot operate here, leaving the server");
                if let Err(leave_error) = self.platform.leave_server(server_id).await {
                    error!(error = %leave_error, "leaving the server failed");
                }
                self.store.purge(SERVER_KEY)?;
                Err(ResumeError::MissingPermission(permission))
            }
            other => other,
        }
    }

    /// Drop all per-server state after a kick or leave. Roles already
    /// created stay behind on the platform.
    pub fn on_server_remove(&mut self) -> Result<(), ResumeError> {
        info!("removed from the server; roles already created may still exist there");
        self.store.purge(SERVER_KEY)?;
        self.state = BotState::Unjoined;
        Ok(())
    }
}

/// Role creation scoped to one server, as handed to a realization pass.
struct ServerRoles<'a, P: Platform> {
    platform: &'a P,
    server_id: &'a str,
}

#[async_trait]
impl<P: Platform> RoleCreator for ServerRoles<'_, P> {
    async fn create_role(&self, name: &str, colour: Colour) -> anyhow::Result<String> {
        let role = self.platform.create_role(self.server_id, name, colour.as_rgb()).await?;
        Ok(role.id)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::platform::testing::MockPlatform;

    pub(crate) const TEMPLATES: &str = r#"
add_rank_response = "<@{user}> now has the {rank} rank"
remove_rank_response = "<@{user}> dropped the {rank} rank"
rank_not_found = "there is no rank called {rank}"
"#;

    pub(crate) struct Fixture {
        _dir: tempfile::TempDir,
        pub bot: Bot<MockPlatform>,
    }

    /// A bot over the given platform, with a fresh cache and the given
    /// rank definition written to disk.
    pub(crate) fn fixture(platform: MockPlatform, definition: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let ranks_path = dir.path().join("ranks.txt");
        std::fs::write(&ranks_path, definition).unwrap();
        let cache_dir = dir.path().join("cache");
        let store = Store::open(&cache_dir).unwrap();
        let settings = BotSettings {
            channel: "ranks".into(),
            cache_dir: cache_dir.display().to_string(),
            ranks_path: ranks_path.display().to_string(),
            texts_path: String::new(),
        };
        let texts = Texts::parse(TEMPLATES).unwrap();
        Fixture { _dir: dir, bot: Bot::new(platform, store, texts, settings) }
    }
}

#[cfg(test)]
mod tests {
    use emblem_client::Permissions;
    use serde_json::Value;

    use super::testing::fixture;
    use super::*;
    use crate::platform::testing::MockPlatform;

    #[tokio::test]
    async fn resume_without_a_cached_identity_reports_not_joined() {
        let mut fx = fixture(MockPlatform::joined(), "Red, #ff0000\n");
        assert!(matches!(fx.bot.resume().await, Err(ResumeError::NotJoined)));
        assert!(!fx.bot.is_ready());
    }

    #[tokio::test]
    async fn resume_purges_the_identity_when_the_server_is_gone() {
        let mut platform = MockPlatform::joined();
        platform.server = None; // kicked while offline
        let mut fx = fixture(platform, "Red, #ff0000\n");
        fx.bot.store.save("server", &"srv-1".to_owned()).unwrap();

        assert!(matches!(fx.bot.resume().await, Err(ResumeError::NotJoined)));
        assert_eq!(fx.bot.store.load::<String>("server").unwrap(), None);
    }

    #[tokio::test]
    async fn resume_names_the_missing_permission() {
        let mut platform = MockPlatform::joined();
        platform.permissions = Permissions::SEND_MESSAGES;
        let mut fx = fixture(platform, "Red, #ff0000\n");
        fx.bot.store.save("server", &"srv-1".to_owned()).unwrap();

        match fx.bot.resume().await {
            Err(ResumeError::MissingPermission(permission)) => {
                assert_eq!(permission, "manage roles");
            }
            other => panic!("expected MissingPermission, got {other:?}"),
        }

        let mut fx = {
            let mut platform = MockPlatform::joined();
            platform.permissions = Permissions::MANAGE_ROLES;
            fixture(platform, "Red, #ff0000\n")
        };
        fx.bot.store.save("server", &"srv-1".to_owned()).unwrap();
        match fx.bot.resume().await {
            Err(ResumeError::MissingPermission(permission)) => {
                assert_eq!(permission, "send messages");
            }
            other => panic!("expected MissingPermission, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resume_fails_when_the_designated_channel_is_missing() {
        let mut platform = MockPlatform::joined();
        platform.channels.retain(|channel| channel.name != "ranks");
        let mut fx = fixture(platform, "Red, #ff0000\n");
        fx.bot.store.save("server", &"srv-1".to_owned()).unwrap();

        match fx.bot.resume().await {
            Err(ResumeError::ChannelNotFound(channel)) => assert_eq!(channel, "ranks"),
            other => panic!("expected ChannelNotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn a_fresh_join_realizes_everything_and_persists_the_snapshot() {
        let mut fx = fixture(MockPlatform::joined(), "Red, #ff0000\nBlue, None\n");
        fx.bot.on_server_join("srv-1").await.unwrap();

        assert!(fx.bot.is_ready());
        assert_eq!(*fx.bot.platform.created.lock().unwrap(), ["Red", "Blue"]);

        let snapshot: Vec<Value> = fx.bot.store.load("registry").unwrap().unwrap();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|record| record["type"] == "realized"));

        let BotState::Ready(session) = &fx.bot.state else { unreachable!() };
        assert_eq!(session.registry.lookup("Red").unwrap().grantable_role(), Some("role-1"));
    }

    #[tokio::test]
    async fn resume_is_idempotent_once_ready() {
        let mut fx = fixture(MockPlatform::joined(), "Red, #ff0000\n");
        fx.bot.on_server_join("srv-1").await.unwrap();
        fx.bot.resume().await.unwrap();
        fx.bot.resume().await.unwrap();
        assert_eq!(fx.bot.platform.created.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn a_join_without_permissions_unwinds_the_membership() {
        let mut platform = MockPlatform::joined();
        platform.permissions = Permissions::empty();
        let mut fx = fixture(platform, "Red, #ff0000\n");

        assert!(matches!(
            fx.bot.on_server_join("srv-1").await,
            Err(ResumeError::MissingPermission(_))
        ));
        assert_eq!(*fx.bot.platform.left.lock().unwrap(), ["srv-1"]);
        assert_eq!(fx.bot.store.load::<String>("server").unwrap(), None);
        assert!(!fx.bot.is_ready());
    }

    #[tokio::test]
    async fn resume_prefers_the_snapshot_and_creates_no_roles() {
        let platform = MockPlatform::joined();
        platform.roles.lock().unwrap().push(emblem_client::Role {
            id: "role-77".into(),
            name: "Red".into(),
            color: Some(0xFF0000),
        });
        let mut fx = fixture(platform, "Red, #ff0000\n");
        fx.bot.store.save("server", &"srv-1".to_owned()).unwrap();
        fx.bot
            .store
            .save(
                "registry",
                &vec![serde_json::json!({"type": "realized", "name": "Red", "role_id": "role-77"})],
            )
            .unwrap();

        fx.bot.resume().await.unwrap();
        assert!(fx.bot.platform.created.lock().unwrap().is_empty());

        let BotState::Ready(session) = &fx.bot.state else { unreachable!() };
        assert_eq!(session.registry.lookup("Red").unwrap().grantable_role(), Some("role-77"));
    }

    #[tokio::test]
    async fn a_broken_definition_aborts_initialization() {
        let mut fx = fixture(MockPlatform::joined(), "Red, #ff0000\nLoud, #1000000\n");
        match fx.bot.on_server_join("srv-1").await {
            Err(ResumeError::Definition(error)) => assert_eq!(error.line, 2),
            other => panic!("expected a definition error, got {other:?}"),
        }
        assert!(!fx.bot.is_ready());
        // Nothing was realized, nothing was persisted.
        assert!(fx.bot.platform.created.lock().unwrap().is_empty());
        assert_eq!(fx.bot.store.load::<Vec<Value>>("registry").unwrap(), None);
    }

    #[tokio::test]
    async fn leaving_drops_state_and_purges_the_identity() {
        let mut fx = fixture(MockPlatform::joined(), "Red, #ff0000\n");
        fx.bot.on_server_join("srv-1").await.unwrap();
        assert!(fx.bot.is_ready());

        fx.bot.on_server_remove().unwrap();
        assert!(!fx.bot.is_ready());
        assert_eq!(fx.bot.store.load::<String>("server").unwrap(), None);
    }
}
