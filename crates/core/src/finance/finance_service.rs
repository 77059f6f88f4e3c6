use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

use super::finance_model::{
    BillReminder, Budget, Category, GoldPrice, GoldTransaction, GoldWallet, Liability,
    LiabilityPayment, NewSchedule, SavingsGoal, SavingsTransaction, Schedule, Transaction,
    UserProfile, Wallet,
};
use crate::collections::{
    Collection, CollectionStoreTrait, Record, CURRENT_GOLD_PRICE_ID, USER_PROFILE_ID,
};
use crate::errors::{DatabaseError, Error, Result};
use crate::seed::default_seed;
use crate::utils::{generate_id, time_utils::now_timestamp};

/// Attempts made by `add_schedule` before giving up on id collisions.
const ADD_ATTEMPTS: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct FacadeOptions {
    /// When set, an empty `wallets` or `categories` read returns the default
    /// starter records (without persisting them). Covers stores created by
    /// builds that did not seed on upgrade.
    pub fallback_defaults_on_empty: bool,
}

/// Typed API over the collection store: one `get_*`/`save_*` pair per
/// collection, singleton fallbacks, and schedule CRUD.
///
/// `save_*` replaces the whole collection with the given list.
pub struct FinanceService {
    store: Arc<dyn CollectionStoreTrait>,
    options: FacadeOptions,
}

impl FinanceService {
    pub fn new(store: Arc<dyn CollectionStoreTrait>) -> Self {
        Self::with_options(store, FacadeOptions::default())
    }

    pub fn with_options(store: Arc<dyn CollectionStoreTrait>, options: FacadeOptions) -> Self {
        FinanceService { store, options }
    }

    pub fn generate_id(&self) -> String {
        generate_id()
    }

    /// Every record of `collection` as `T`. A record that cannot be read is
    /// an error rather than being left out, since a later `save_*` would
    /// otherwise delete it.
    async fn load<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let records = self.store.get_all(collection).await?;
        records
            .into_iter()
            .map(|record| {
                let id = record.id().unwrap_or_default().to_string();
                record.into_model::<T>().map_err(|e| {
                    warn!("Unreadable {} record '{}': {}", collection, id, e);
                    Error::Database(DatabaseError::InvalidRecord(format!(
                        "{}/{}: {}",
                        collection, id, e
                    )))
                })
            })
            .collect()
    }

    async fn save<T: Serialize>(&self, collection: Collection, items: &[T]) -> Result<bool> {
        let records = items
            .iter()
            .map(Record::from_model)
            .collect::<Result<Vec<_>>>()?;
        debug!("Saving {} record(s) to '{}'", records.len(), collection);
        self.store.replace_all(collection, records).await
    }

    async fn load_or_defaults<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>> {
        let items = self.load(collection).await?;
        if !items.is_empty() || !self.options.fallback_defaults_on_empty {
            return Ok(items);
        }
        default_seed(collection)
            .into_iter()
            .map(Record::into_model)
            .collect()
    }

    // Wallets

    pub async fn get_wallets(&self) -> Result<Vec<Wallet>> {
        self.load_or_defaults(Collection::Wallets).await
    }

    pub async fn save_wallets(&self, wallets: &[Wallet]) -> Result<bool> {
        self.save(Collection::Wallets, wallets).await
    }

    // Categories

    pub async fn get_categories(&self) -> Result<Vec<Category>> {
        self.load_or_defaults(Collection::Categories).await
    }

    pub async fn save_categories(&self, categories: &[Category]) -> Result<bool> {
        self.save(Collection::Categories, categories).await
    }

    pub async fn get_category_by_id(&self, id: &str) -> Result<Option<Category>> {
        self.store
            .get_by_id(Collection::Categories, id)
            .await?
            .map(Record::into_model)
            .transpose()
    }

    // Transactions

    pub async fn get_transactions(&self) -> Result<Vec<Transaction>> {
        self.load(Collection::Transactions).await
    }

    pub async fn save_transactions(&self, transactions: &[Transaction]) -> Result<bool> {
        self.save(Collection::Transactions, transactions).await
    }

    // Budgets

    pub async fn get_budgets(&self) -> Result<Vec<Budget>> {
        self.load(Collection::Budgets).await
    }

    pub async fn save_budgets(&self, budgets: &[Budget]) -> Result<bool> {
        self.save(Collection::Budgets, budgets).await
    }

    // Gold

    pub async fn get_gold_wallets(&self) -> Result<Vec<GoldWallet>> {
        self.load(Collection::GoldWallets).await
    }

    pub async fn save_gold_wallets(&self, wallets: &[GoldWallet]) -> Result<bool> {
        self.save(Collection::GoldWallets, wallets).await
    }

    pub async fn get_gold_transactions(&self) -> Result<Vec<GoldTransaction>> {
        self.load(Collection::GoldTransactions).await
    }

    pub async fn save_gold_transactions(&self, transactions: &[GoldTransaction]) -> Result<bool> {
        self.save(Collection::GoldTransactions, transactions).await
    }

    /// The stored gold price, or [`GoldPrice::fallback`] when none is stored.
    pub async fn get_gold_price(&self) -> Result<GoldPrice> {
        match self
            .store
            .get_by_id(Collection::CurrentGoldPrice, CURRENT_GOLD_PRICE_ID)
            .await?
        {
            Some(record) => record.into_model(),
            None => Ok(GoldPrice::fallback()),
        }
    }

    /// Upserts the gold price singleton and stamps `lastUpdate`.
    pub async fn save_gold_price(&self, price: GoldPrice) -> Result<GoldPrice> {
        let price = GoldPrice {
            id: CURRENT_GOLD_PRICE_ID.to_string(),
            last_update: Some(now_timestamp()),
            ..price
        };
        let record = Record::from_model(&price)?;
        self.store
            .put(Collection::CurrentGoldPrice, record)
            .await?
            .into_model()
    }

    // Liabilities

    pub async fn get_liabilities(&self) -> Result<Vec<Liability>> {
        self.load(Collection::Liabilities).await
    }

    pub async fn save_liabilities(&self, liabilities: &[Liability]) -> Result<bool> {
        self.save(Collection::Liabilities, liabilities).await
    }

    pub async fn get_liability_payments(&self) -> Result<Vec<LiabilityPayment>> {
        self.load(Collection::LiabilityPayments).await
    }

    pub async fn save_liability_payments(&self, payments: &[LiabilityPayment]) -> Result<bool> {
        self.save(Collection::LiabilityPayments, payments).await
    }

    // Savings & bills

    pub async fn get_savings_goals(&self) -> Result<Vec<SavingsGoal>> {
        self.load(Collection::SavingsGoals).await
    }

    pub async fn save_savings_goals(&self, goals: &[SavingsGoal]) -> Result<bool> {
        self.save(Collection::SavingsGoals, goals).await
    }

    pub async fn get_savings_transactions(&self) -> Result<Vec<SavingsTransaction>> {
        self.load(Collection::SavingsTransactions).await
    }

    pub async fn save_savings_transactions(
        &self,
        transactions: &[SavingsTransaction],
    ) -> Result<bool> {
        self.save(Collection::SavingsTransactions, transactions)
            .await
    }

    pub async fn get_bill_reminders(&self) -> Result<Vec<BillReminder>> {
        self.load(Collection::BillReminders).await
    }

    pub async fn save_bill_reminders(&self, reminders: &[BillReminder]) -> Result<bool> {
        self.save(Collection::BillReminders, reminders).await
    }

    // Schedules

    pub async fn get_schedules(&self) -> Result<Vec<Schedule>> {
        self.load(Collection::Schedules).await
    }

    pub async fn save_schedules(&self, schedules: &[Schedule]) -> Result<bool> {
        self.save(Collection::Schedules, schedules).await
    }

    /// Stores a new schedule under a generated id, stamping `createdAt`.
    pub async fn add_schedule(&self, new_schedule: NewSchedule) -> Result<Schedule> {
        let created_at = now_timestamp();
        let mut attempt = 1;
        loop {
            let schedule = new_schedule
                .clone()
                .into_schedule(self.generate_id(), created_at.clone());
            let record = Record::from_model(&schedule)?;
            match self.store.add(Collection::Schedules, record).await {
                Ok(stored) => return stored.into_model(),
                Err(e) if e.is_duplicate_key() && attempt < ADD_ATTEMPTS => {
                    warn!("Schedule id '{}' collided, retrying", schedule.id);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub async fn get_schedule(&self, id: &str) -> Result<Option<Schedule>> {
        self.store
            .get_by_id(Collection::Schedules, id)
            .await?
            .map(Record::into_model)
            .transpose()
    }

    /// Shallow-merges `patch` into the stored schedule. Fails with `NotFound`
    /// when the schedule does not exist.
    pub async fn update_schedule(&self, id: &str, patch: Record) -> Result<Schedule> {
        self.store
            .update(Collection::Schedules, id, patch)
            .await?
            .into_model()
    }

    pub async fn delete_schedule(&self, id: &str) -> Result<bool> {
        self.store.delete(Collection::Schedules, id).await
    }

    // User profile

    /// The stored profile, or an unnamed default profile.
    pub async fn get_user_profile(&self) -> Result<UserProfile> {
        match self
            .store
            .get_by_id(Collection::UserProfile, USER_PROFILE_ID)
            .await?
        {
            Some(record) => record.into_model(),
            None => Ok(UserProfile::default()),
        }
    }

    pub async fn save_user_profile(&self, name: &str) -> Result<UserProfile> {
        let profile = UserProfile {
            name: name.to_string(),
            created_at: Some(now_timestamp()),
            ..UserProfile::default()
        };
        self.store
            .put(Collection::UserProfile, Record::from_model(&profile)?)
            .await?
            .into_model()
    }
}
