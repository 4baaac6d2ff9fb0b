//! The rank model: everything a member can self-assign.
//!
//! A rank starts out as a plain definition and is upgraded in place once
//! the platform role backing it exists. The upgrade replaces the variant,
//! so a rank that already has its role can never be realized a second
//! time. Groups bundle ranks that are realized together, with or without
//! an ordering guarantee.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tracing::{debug, warn};

use crate::colour::Colour;
use crate::error::RealizeError;

/// Capability handed to a realization pass. Wraps the platform's
/// role-creation call and returns the new role's id.
#[async_trait]
pub trait RoleCreator: Send + Sync {
    async fn create_role(&self, name: &str, colour: Colour) -> anyhow::Result<String>;
}

/// A live platform role a persisted rank was re-bound to. Looked up fresh
/// from the platform's current role set on every load, never owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleHandle {
    pub id: String,
    pub name: String,
}

/// The platform's current role set, used to re-bind persisted role ids.
#[derive(Debug, Clone, Default)]
pub struct LiveRoles {
    by_id: HashMap<String, RoleHandle>,
}

impl LiveRoles {
    pub fn new(roles: impl IntoIterator<Item = RoleHandle>) -> Self {
        Self {
            by_id: roles.into_iter().map(|role| (role.id.clone(), role)).collect(),
        }
    }

    pub fn get(&self, role_id: &str) -> Option<&RoleHandle> {
        self.by_id.get(role_id)
    }
}

/// An assignable rank that has no platform role yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rank {
    pub name: String,
    pub colour: Colour,
}

impl Rank {
    pub fn new(name: impl Into<String>, colour: Colour) -> Self {
        Self { name: name.into(), colour }
    }
}

/// A rank bound to a platform role id.
///
/// The id is persisted; whether the role still exists is re-checked against
/// the live role set on load. External edits can delete the role out from
/// under us, in which case the handle is absent and the rank cannot be
/// granted until the registry is redefined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealizedRank {
    pub name: String,
    pub role_id: String,
    role: Option<RoleHandle>,
}

impl RealizedRank {
    /// A rank whose role was created just now.
    pub fn bound(name: String, role_id: String) -> Self {
        let role = RoleHandle { id: role_id.clone(), name: name.clone() };
        Self { name, role_id, role: Some(role) }
    }

    /// A rank restored from a snapshot, re-bound against the live role set.
    /// A missing role yields a dangling entry, not a failure.
    pub fn rehydrated(name: String, role_id: String, live: &LiveRoles) -> Self {
        let role = live.get(&role_id).cloned();
        if role.is_none() {
            warn!(rank = %name, role = %role_id, "persisted role no longer exists on the platform");
        }
        Self { name, role_id, role }
    }

    /// The live role handle, absent when the platform no longer has it.
    pub fn role(&self) -> Option<&RoleHandle> {
        self.role.as_ref()
    }
}

/// Ranks realized together with no ordering guarantee between members.
#[derive(Debug, Clone, PartialEq)]
pub struct UnorderedRankGroup {
    pub name: String,
    pub members: Vec<Ranklike>,
}

/// Ranks realized strictly in definition order. The `realized` flag is
/// persisted with the group so a finished group never re-runs its pass.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedRankGroup {
    pub name: String,
    pub members: Vec<Ranklike>,
    pub realized: bool,
}

/// Any entry the registry can hold.
#[derive(Debug, Clone, PartialEq)]
pub enum Ranklike {
    Rank(Rank),
    Realized(RealizedRank),
    Unordered(UnorderedRankGroup),
    Ordered(OrderedRankGroup),
}

impl Ranklike {
    pub fn name(&self) -> &str {
        match self {
            Self::Rank(rank) => &rank.name,
            Self::Realized(rank) => &rank.name,
            Self::Unordered(group) => &group.name,
            Self::Ordered(group) => &group.name,
        }
    }

    /// The platform role id commands grant or revoke. Present only for an
    /// individual realized rank whose role still exists.
    pub fn grantable_role(&self) -> Option<&str> {
        match self {
            Self::Realized(rank) => rank.role().map(|_| rank.role_id.as_str()),
            _ => None,
        }
    }

    /// Create the platform roles backing this entry, upgrading realized
    /// members in place. Idempotent: already-realized state is never
    /// touched again. Returns whether anything changed.
    ///
    /// Boxed because groups recurse into their members.
    pub fn realize<'a>(
        &'a mut self,
        creator: &'a dyn RoleCreator,
    ) -> BoxFuture<'a, Result<bool, RealizeError>> {
        Box::pin(async move {
            match self {
                Self::Rank(rank) => {
                    let name = rank.name.clone();
                    let colour = rank.colour;
                    let role_id = creator
                        .create_role(&name, colour)
                        .await
                        .map_err(|source| RealizeError { name: name.clone(), source })?;
                    debug!(rank = %name, role = %role_id, colour = %colour, "platform role created");
                    *self = Self::Realized(RealizedRank::bound(name, role_id));
                    Ok(true)
                }
                Self::Realized(_) => Ok(false),
                Self::Unordered(group) => group.realize(creator).await,
                Self::Ordered(group) => group.realize(creator).await,
            }
        })
    }
}

impl UnorderedRankGroup {
    /// Members are independent: one failing does not stop the others, and
    /// nothing is rolled back (role creation is not reversible without an
    /// explicit deletion, which never happens automatically). The first
    /// error is surfaced once the whole pass ran.
    async fn realize(&mut self, creator: &dyn RoleCreator) -> Result<bool, RealizeError> {
        let mut changed = false;
        let mut first_error = None;
        for member in &mut self.members {
            match member.realize(creator).await {
                Ok(member_changed) => changed |= member_changed,
                Err(error) => {
                    warn!(group = %self.name, error = %error, "group member failed to realize");
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            None => Ok(changed),
            Some(error) => Err(error),
        }
    }
}

impl OrderedRankGroup {
    /// Members are realized strictly in sequence; each platform round-trip
    /// completes before the next starts, so role creation order matches
    /// definition order. A failure stops the sequence and leaves the flag
    /// clear: members created so far stay realized and the next pass
    /// resumes behind them.
    async fn realize(&mut self, creator: &dyn RoleCreator) -> Result<bool, RealizeError> {
        if self.realized {
            return Ok(false);
        }
        for member in &mut self.members {
            member.realize(creator).await?;
        }
        // The flag itself is persisted state, so flipping it counts as a
        // change even when every member already had its role.
        self.realized = true;
        Ok(true)
    }
}
