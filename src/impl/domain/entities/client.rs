use std::collections::HashMap;

pub type ClientId = i64;

/// A client's identifier is already decrypted by the time it reaches this
/// crate; credential encryption is an external collaborator's concern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub id: ClientId,
    pub identifier: String,
    pub external_ids: HashMap<String, String>,
}

impl Client {
    pub fn external_id(&self, system: &str) -> Option<&str> {
        self.external_ids.get(system).map(String::as_str)
    }
}
