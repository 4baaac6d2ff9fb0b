//! What the bot needs from the platform, as one capability trait.
//!
//! The trait mirrors the REST surface the bot actually drives, nothing
//! more. [`RestClient`] is the production implementation; tests substitute
//! a scripted one.

use async_trait::async_trait;
use emblem_client::{Channel, ClientError, Member, Message, RestClient, Role, Server, User};

#[async_trait]
pub trait Platform: Send + Sync {
    async fn current_user(&self) -> Result<User, ClientError>;

    async fn get_server(&self, server_id: &str) -> Result<Server, ClientError>;

    async fn list_channels(&self, server_id: &str) -> Result<Vec<Channel>, ClientError>;

    async fn list_roles(&self, server_id: &str) -> Result<Vec<Role>, ClientError>;

    async fn get_member(&self, server_id: &str, user_id: &str) -> Result<Member, ClientError>;

    async fn create_role(
        &self,
        server_id: &str,
        name: &str,
        color: Option<u32>,
    ) -> Result<Role, ClientError>;

    async fn add_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError>;

    async fn remove_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError>;

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message, ClientError>;

    async fn leave_server(&self, server_id: &str) -> Result<(), ClientError>;
}

#[async_trait]
impl Platform for RestClient {
    async fn current_user(&self) -> Result<User, ClientError> {
        RestClient::current_user(self).await
    }

    async fn get_server(&self, server_id: &str) -> Result<Server, ClientError> {
        RestClient::get_server(self, server_id).await
    }

    async fn list_channels(&self, server_id: &str) -> Result<Vec<Channel>, ClientError> {
        RestClient::list_channels(self, server_id).await
    }

    async fn list_roles(&self, server_id: &str) -> Result<Vec<Role>, ClientError> {
        RestClient::list_roles(self, server_id).await
    }

    async fn get_member(&self, server_id: &str, user_id: &str) -> Result<Member, ClientError> {
        RestClient::get_member(self, server_id, user_id).await
    }

    async fn create_role(
        &self,
        server_id: &str,
        name: &str,
        color: Option<u32>,
    ) -> Result<Role, ClientError> {
        RestClient::create_role(self, server_id, name, color).await
    }

    async fn add_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError> {
        RestClient::add_member_role(self, server_id, user_id, role_id).await
    }

    async fn remove_member_role(
        &self,
        server_id: &str,
        user_id: &str,
        role_id: &str,
    ) -> Result<(), ClientError> {
        RestClient::remove_member_role(self, server_id, user_id, role_id).await
    }

    async fn send_message(&self, channel_id: &str, content: &str) -> Result<Message, ClientError> {
        RestClient::send_message(self, channel_id, content).await
    }

    async fn leave_server(&self, server_id: &str) -> Result<(), ClientError> {
        RestClient::leave_server(self, server_id).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use emblem_client::Permissions;

    use super::*;

    /// Scripted platform for lifecycle and dispatcher tests.
    pub(crate) struct MockPlatform {
        pub me: User,
        /// `None` makes every server lookup answer 404, as the platform
        /// does after a kick.
        pub server: Option<Server>,
        pub permissions: Permissions,
        pub channels: Vec<Channel>,
        pub roles: Mutex<Vec<Role>>,
        /// `(user_id, role_id, added)` per add/remove call.
        pub grants: Mutex<Vec<(String, String, bool)>>,
        /// `(channel_id, content)` per sent message.
        pub sent: Mutex<Vec<(String, String)>>,
        pub left: Mutex<Vec<String>>,
        pub created: Mutex<Vec<String>>,
    }

    impl MockPlatform {
        /// A platform where the bot is a member with all it needs.
        pub fn joined() -> Self {
            Self {
                me: User { id: "bot-1".into(), username: "emblem".into() },
                server: Some(Server {
                    id: "srv-1".into(),
                    name: "Testing Grounds".into(),
                    owner_id: None,
                }),
                permissions: Permissions::SEND_MESSAGES | Permissions::MANAGE_ROLES,
                channels: vec![
                    Channel {
                        id: "chan-1".into(),
                        name: "general".into(),
                        server_id: Some("srv-1".into()),
                    },
                    Channel {
                        id: "chan-2".into(),
                        name: "ranks".into(),
                        server_id: Some("srv-1".into()),
                    },
                ],
                roles: Mutex::new(Vec::new()),
                grants: Mutex::new(Vec::new()),
                sent: Mutex::new(Vec::new()),
                left: Mutex::new(Vec::new()),
                created: Mutex::new(Vec::new()),
            }
        }
    }

    fn gone() -> ClientError {
        ClientError::Api { status: 404, message: "not found".into() }
    }

    #[async_trait]
    impl Platform for MockPlatform {
        async fn current_user(&self) -> Result<User, ClientError> {
            Ok(self.me.clone())
        }

        async fn get_server(&self, server_id: &str) -> Result<Server, ClientError> {
            match &self.server {
                Some(server) if server.id == server_id => Ok(server.clone()),
                _ => Err(gone()),
            }
        }

        async fn list_channels(&self, _server_id: &str) -> Result<Vec<Channel>, ClientError> {
            Ok(self.channels.clone())
        }

        async fn list_roles(&self, _server_id: &str) -> Result<Vec<Role>, ClientError> {
            Ok(self.roles.lock().unwrap().clone())
        }

        async fn get_member(&self, _server_id: &str, user_id: &str) -> Result<Member, ClientError> {
            Ok(Member {
                user_id: user_id.into(),
                nickname: None,
                roles: Vec::new(),
                permissions: self.permissions.bits(),
            })
        }

        async fn create_role(
            &self,
            _server_id: &str,
            name: &str,
            color: Option<u32>,
        ) -> Result<Role, ClientError> {
            let mut roles = self.roles.lock().unwrap();
            let role = Role { id: format!("role-{}", roles.len() + 1), name: name.into(), color };
            roles.push(role.clone());
            self.created.lock().unwrap().push(name.into());
            Ok(role)
        }

        async fn add_member_role(
            &self,
            _server_id: &str,
            user_id: &str,
            role_id: &str,
        ) -> Result<(), ClientError> {
            self.grants.lock().unwrap().push((user_id.into(), role_id.into(), true));
            Ok(())
        }

        async fn remove_member_role(
            &self,
            _server_id: &str,
            user_id: &str,
            role_id: &str,
        ) -> Result<(), ClientError> {
            self.grants.lock().unwrap().push((user_id.into(), role_id.into(), false));
            Ok(())
        }

        async fn send_message(
            &self,
            channel_id: &str,
            content: &str,
        ) -> Result<Message, ClientError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push((channel_id.into(), content.into()));
            Ok(Message {
                id: format!("msg-{}", sent.len()),
                channel_id: channel_id.into(),
                author_id: self.me.id.clone(),
                content: content.into(),
            })
        }

        async fn leave_server(&self, server_id: &str) -> Result<(), ClientError> {
            self.left.lock().unwrap().push(server_id.into());
            Ok(())
        }
    }
}
