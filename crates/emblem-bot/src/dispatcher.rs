//! Message routing once the bot is initialized.
//!
//! Everything here is a no-op until the lifecycle reaches `Ready`: no
//! command is served from a half-initialized bot. Unknown ranks answer
//! with a templated reply, never an error.

use emblem_client::{ClientError, Message};
use emblem_core::parse_command;
use tracing::debug;

use crate::lifecycle::{Bot, BotState};
use crate::platform::Platform;

impl<P: Platform> Bot<P> {
    /// Handle a chat message.
    ///
    /// The bot's own messages and messages outside the designated channel
    /// are ignored, as is anything that does not parse as a command.
    pub async fn on_message(&self, message: &Message) -> Result<(), ClientError> {
        let BotState::Ready(session) = &self.state else {
            return Ok(());
        };
        if self.me.as_ref().is_some_and(|me| me.id == message.author_id) {
            return Ok(());
        }
        if message.channel_id != session.channel.id {
            return Ok(());
        }
        let Some(command) = parse_command(&message.content) else {
            return Ok(());
        };

        let reply = match session.registry.lookup(&command.rank) {
            Some(entry) => match entry.grantable_role() {
                Some(role_id) => {
                    if command.add {
                        self.platform
                            .add_member_role(&session.server.id, &message.author_id, role_id)
                            .await?;
                        self.texts.rank_added(&message.author_id, &command.rank)
                    } else {
                        self.platform
                            .remove_member_role(&session.server.id, &message.author_id, role_id)
                            .await?;
                        self.texts.rank_removed(&message.author_id, &command.rank)
                    }
                }
                None => {
                    // Groups and dangling entries have no single role to
                    // grant, so they answer like an unknown rank.
                    debug!(rank = %command.rank, "entry has no grantable role");
                    self.texts.rank_not_found(&command.rank)
                }
            },
            None => self.texts.rank_not_found(&command.rank),
        };
        self.platform.send_message(&session.channel.id, &reply).await?;
        Ok(())
    }
}
