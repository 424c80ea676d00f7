//! In-process client store.
//!
//! # Responsibility
//! - Serve the `ClientStore` contract from an ordered map, without SQLite.
//! - Mirror SQLite semantics for identifier generation and `LIKE` matching.
//!
//! # Invariants
//! - Map keys equal the `id` of the stored client.
//! - Generated identifiers never reuse a value handed out before, even after
//!   deletes (same as `AUTOINCREMENT`).
//! - Once `ClientId::MAX` has been stored, generation fails with
//!   `IdSpaceExhausted`; explicit identifiers are still accepted.
//! - Not `Sync`; single-threaded use only.

use crate::model::client::{Client, ClientId, Timestamp};
use crate::repo::client_repo::{ClientStore, RepoError, RepoResult};
use log::info;
use regex::{Regex, RegexBuilder};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

/// Client store kept entirely in memory.
#[derive(Debug)]
pub struct MemoryClientStore {
    clients: RefCell<BTreeMap<ClientId, Client>>,
    /// `None` once the identifier space is used up.
    next_id: Cell<Option<ClientId>>,
}

impl Default for MemoryClientStore {
    fn default() -> Self {
        Self {
            clients: RefCell::new(BTreeMap::new()),
            next_id: Cell::new(Some(1)),
        }
    }
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn filter(&self, predicate: impl Fn(&Client) -> bool) -> Vec<Client> {
        self.clients
            .borrow()
            .values()
            .filter(|client| predicate(client))
            .cloned()
            .collect()
    }

    fn remove_where(&self, predicate: impl Fn(&Client) -> bool) -> usize {
        let mut clients = self.clients.borrow_mut();
        let before = clients.len();
        clients.retain(|_, client| !predicate(client));
        before - clients.len()
    }
}

impl ClientStore for MemoryClientStore {
    fn save(&self, client: &Client) -> RepoResult<ClientId> {
        client.validate()?;
        let mut clients = self.clients.borrow_mut();

        let cpf_taken = clients
            .values()
            .any(|stored| stored.cpf == client.cpf && stored.id != client.id);
        if cpf_taken {
            return Err(RepoError::DuplicateCpf(client.cpf.clone()));
        }

        let id = match client.id {
            Some(id) => id,
            None => self.next_id.get().ok_or(RepoError::IdSpaceExhausted)?,
        };
        if let Some(next) = self.next_id.get() {
            if id >= next {
                self.next_id.set(id.checked_add(1));
            }
        }

        clients.insert(
            id,
            Client {
                id: Some(id),
                ..client.clone()
            },
        );
        info!("event=client_save module=repo status=ok store=memory client_id={id}");
        Ok(id)
    }

    fn find_by_id(&self, id: ClientId) -> RepoResult<Option<Client>> {
        Ok(self.clients.borrow().get(&id).cloned())
    }

    fn exists_by_id(&self, id: ClientId) -> RepoResult<bool> {
        Ok(self.clients.borrow().contains_key(&id))
    }

    fn find_all(&self) -> RepoResult<Vec<Client>> {
        Ok(self.clients.borrow().values().cloned().collect())
    }

    fn count(&self) -> RepoResult<u64> {
        Ok(self.clients.borrow().len() as u64)
    }

    fn delete_by_id(&self, id: ClientId) -> RepoResult<()> {
        if self.clients.borrow_mut().remove(&id).is_none() {
            return Err(RepoError::NotFound(id));
        }
        info!("event=client_delete module=repo status=ok store=memory by=id client_id={id}");
        Ok(())
    }

    fn delete(&self, client: &Client) -> RepoResult<()> {
        let Some(id) = client.id else {
            return Ok(());
        };

        let removed = usize::from(self.clients.borrow_mut().remove(&id).is_some());
        info!("event=client_delete module=repo status=ok store=memory by=entity client_id={id} removed={removed}");
        Ok(())
    }

    fn delete_all(&self) -> RepoResult<usize> {
        let removed = std::mem::take(&mut *self.clients.borrow_mut()).len();
        info!("event=client_delete module=repo status=ok store=memory by=all removed={removed}");
        Ok(removed)
    }

    fn find_by_cpf(&self, cpf: &str) -> RepoResult<Option<Client>> {
        Ok(self
            .clients
            .borrow()
            .values()
            .find(|client| client.cpf == cpf)
            .cloned())
    }

    fn delete_by_cpf(&self, cpf: &str) -> RepoResult<usize> {
        let removed = self.remove_where(|client| client.cpf == cpf);
        info!("event=client_delete module=repo status=ok store=memory by=cpf removed={removed}");
        Ok(removed)
    }

    fn find_by_cpf_like(&self, pattern: &str) -> RepoResult<Vec<Client>> {
        let matcher = like_matcher(pattern)?;
        Ok(self.filter(|client| matcher.is_match(&client.cpf)))
    }

    fn find_by_name(&self, name: &str) -> RepoResult<Vec<Client>> {
        Ok(self.filter(|client| client.name == name))
    }

    fn find_by_income_greater_than(&self, threshold: f64) -> RepoResult<Vec<Client>> {
        Ok(self.filter(|client| client.income > threshold))
    }

    fn find_by_income_less_than(&self, threshold: f64) -> RepoResult<Vec<Client>> {
        Ok(self.filter(|client| client.income < threshold))
    }

    fn find_by_income_between(&self, low: f64, high: f64) -> RepoResult<Vec<Client>> {
        Ok(self.filter(|client| low <= client.income && client.income <= high))
    }

    fn delete_by_income_greater_than(&self, threshold: f64) -> RepoResult<usize> {
        let removed = self.remove_where(|client| client.income > threshold);
        info!("event=client_delete module=repo status=ok store=memory by=income_gt removed={removed}");
        Ok(removed)
    }

    fn find_by_birth_date_between(
        &self,
        start: Timestamp,
        end: Timestamp,
    ) -> RepoResult<Vec<Client>> {
        Ok(self.filter(|client| (start..=end).contains(&client.birth_date)))
    }
}

/// Compiles a SQL `LIKE` pattern into an anchored regex.
///
/// SQLite folds ASCII case only; the regex folds Unicode case, which only
/// differs for non-ASCII input.
fn like_matcher(pattern: &str) -> RepoResult<Regex> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push('^');
    let mut literal = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut literal))),
        }
    }
    source.push('$');

    RegexBuilder::new(&source)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map_err(|err| RepoError::InvalidPattern {
            pattern: pattern.to_string(),
            message: err.to_string(),
        })
}
