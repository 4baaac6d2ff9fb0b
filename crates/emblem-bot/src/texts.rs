//! Response templates.
//!
//! Replies are not hard-coded: a TOML document maps message ids to format
//! strings with named `{user}` / `{rank}` placeholders, so a community can
//! reword the bot without recompiling it. The ids the bot replies with are
//! validated at load time, not at the first reply.

use std::collections::HashMap;

use thiserror::Error;

pub const ADD_RANK_RESPONSE: &str = "add_rank_response";
pub const REMOVE_RANK_RESPONSE: &str = "remove_rank_response";
pub const RANK_NOT_FOUND: &str = "rank_not_found";

#[derive(Debug, Error)]
pub enum TextsError {
    #[error("template document is not valid TOML: {0}")]
    Toml(#[from] Box<toml::de::Error>),

    #[error("missing required template {0:?}")]
    Missing(&'static str),
}

/// The loaded reply templates.
#[derive(Debug, Clone)]
pub struct Texts {
    add_rank: String,
    remove_rank: String,
    rank_not_found: String,
}

impl Texts {
    pub fn parse(doc: &str) -> Result<Self, TextsError> {
        let map: HashMap<String, String> = toml::from_str(doc).map_err(Box::new)?;
        let take = |id: &'static str| map.get(id).cloned().ok_or(TextsError::Missing(id));
        Ok(Self {
            add_rank: take(ADD_RANK_RESPONSE)?,
            remove_rank: take(REMOVE_RANK_RESPONSE)?,
            rank_not_found: take(RANK_NOT_FOUND)?,
        })
    }

    pub fn rank_added(&self, user: &str, rank: &str) -> String {
        render(&self.add_rank, user, rank)
    }

    pub fn rank_removed(&self, user: &str, rank: &str) -> String {
        render(&self.remove_rank, user, rank)
    }

    pub fn rank_not_found(&self, rank: &str) -> String {
        render(&self.rank_not_found, "", rank)
    }
}

fn render(template: &str, user: &str, rank: &str) -> String {
    template.replace("{user}", user).replace("{rank}", rank)
}
