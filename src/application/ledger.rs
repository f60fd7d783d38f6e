//! Per-actor account registry with lazy hydration from storage.
//!
//! Each actor's `Account` lives behind its own async mutex, so executions
//! for one actor are strictly serialized while unrelated actors proceed
//! concurrently. The map handing out those mutexes is a short-held
//! `std::sync::RwLock` and is never held across an await.

use crate::domain::repositories::{PositionRepository, WalletRepository};
use crate::domain::trading::account::Account;
use crate::domain::trading::types::ActorId;
use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, RwLock};
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::info;

type AccountCell = Arc<Mutex<Option<Account>>>;

pub struct Ledger {
    wallets: Arc<dyn WalletRepository>,
    positions: Arc<dyn PositionRepository>,
    initial_cash: Decimal,
    accounts: RwLock<HashMap<ActorId, AccountCell>>,
}

/// Exclusive hold on one actor's account for the duration of one
/// execute/snapshot. Dropping it releases the actor.
pub struct AccountGuard {
    guard: OwnedMutexGuard<Option<Account>>,
}

impl Deref for AccountGuard {
    type Target = Account;

    fn deref(&self) -> &Account {
        self.guard.as_ref().expect("account hydrated before guard handed out")
    }
}

impl DerefMut for AccountGuard {
    fn deref_mut(&mut self) -> &mut Account {
        self.guard.as_mut().expect("account hydrated before guard handed out")
    }
}

impl Ledger {
    pub fn new(
        wallets: Arc<dyn WalletRepository>,
        positions: Arc<dyn PositionRepository>,
        initial_cash: Decimal,
    ) -> Self {
        Self {
            wallets,
            positions,
            initial_cash,
            accounts: RwLock::new(HashMap::new()),
        }
    }

    /// Locks the actor's account, loading it from storage on first touch.
    /// A previously unseen actor gets a wallet seeded with the configured
    /// initial cash, persisted before the guard is handed out.
    pub async fn lock(&self, actor_id: ActorId) -> Result<AccountGuard> {
        let cell = self.cell(actor_id);
        let mut guard = cell.lock_owned().await;
        if guard.is_none() {
            *guard = Some(self.hydrate(actor_id).await?);
        }
        Ok(AccountGuard { guard })
    }

    fn cell(&self, actor_id: ActorId) -> AccountCell {
        if let Some(cell) = self
            .accounts
            .read()
            .expect("account map lock poisoned")
            .get(&actor_id)
        {
            return cell.clone();
        }
        self.accounts
            .write()
            .expect("account map lock poisoned")
            .entry(actor_id)
            .or_insert_with(|| Arc::new(Mutex::new(None)))
            .clone()
    }

    async fn hydrate(&self, actor_id: ActorId) -> Result<Account> {
        match self
            .wallets
            .load(actor_id)
            .await
            .context("load wallet for hydration")?
        {
            Some(wallet) => {
                let positions = self
                    .positions
                    .load_for_actor(actor_id)
                    .await
                    .context("load positions for hydration")?;
                Ok(Account {
                    wallet,
                    positions: positions.into_iter().map(|p| (p.code.clone(), p)).collect(),
                })
            }
            None => {
                let account = Account::new(actor_id, self.initial_cash);
                self.wallets
                    .save(&account.wallet)
                    .await
                    .context("persist seeded wallet")?;
                info!(actor_id, cash = %self.initial_cash, "seeded wallet for new actor");
                Ok(account)
            }
        }
    }
}
