//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `wallets` - Wallet state (key: user_id)
//! - `wallet_txns` - Append-only wallet transaction log (key: txn_id)
//! - `transactions` - Legacy flat transaction records (key: txn_id)
//! - `campaigns` - Campaign state (key: campaign_id)
//! - `holdings` - Investor holdings (key: campaign_id || investor_id)
//! - `revenue` - Revenue events (key: campaign_id || event_id)
//! - `distributions` - Distribution runs (key: distribution_id)
//! - `indices` - Secondary indices for per-user and per-campaign lookups
//!
//! Keying wallets on `user_id` and holdings on the `(campaign, investor)`
//! pair makes the one-wallet-per-user and one-holding-per-pair invariants
//! structural rather than checked.

use crate::{
    error::{Error, Result},
    types::{
        Campaign, CampaignId, Distribution, Holding, RevenueEvent, Transaction, UserId, Wallet,
        WalletTransaction,
    },
    Config,
};
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;
use uuid::Uuid;

/// Column family names
const CF_WALLETS: &str = "wallets";
const CF_WALLET_TXNS: &str = "wallet_txns";
const CF_TRANSACTIONS: &str = "transactions";
const CF_CAMPAIGNS: &str = "campaigns";
const CF_HOLDINGS: &str = "holdings";
const CF_REVENUE: &str = "revenue";
const CF_DISTRIBUTIONS: &str = "distributions";
const CF_INDICES: &str = "indices";

/// Index key tags (first byte of composite index keys)
const IDX_WALLET_TXN: u8 = 1;
const IDX_TRANSACTION: u8 = 2;
const IDX_DISTRIBUTION: u8 = 3;

/// Storage wrapper for RocksDB
pub struct Storage {
    db: Arc<DB>,
}

impl Storage {
    /// Open or create database
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        // Tuning from config
        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WALLETS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_WALLET_TXNS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_TRANSACTIONS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_CAMPAIGNS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_HOLDINGS, Self::cf_options_state()),
            ColumnFamilyDescriptor::new(CF_REVENUE, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_DISTRIBUTIONS, Self::cf_options_log()),
            ColumnFamilyDescriptor::new(CF_INDICES, Self::cf_options_indices()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!("Opened RocksDB at {:?}", path);

        Ok(Self { db: Arc::new(db) })
    }

    // Column family options

    fn cf_options_log() -> Options {
        let mut opts = Options::default();
        // Append-mostly data compresses well
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_state() -> Options {
        let mut opts = Options::default();
        // State is frequently read, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_options_indices() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Wallet operations

    /// Get wallet, if one has been created for the user
    pub fn get_wallet(&self, user_id: UserId) -> Result<Option<Wallet>> {
        let cf = self.cf_handle(CF_WALLETS)?;
        match self.db.get_cf(cf, user_id.as_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Stage a wallet write into a batch
    pub fn stage_wallet(&self, batch: &mut WriteBatch, wallet: &Wallet) -> Result<()> {
        let cf = self.cf_handle(CF_WALLETS)?;
        batch.put_cf(cf, wallet.user_id.as_bytes(), bincode::serialize(wallet)?);
        Ok(())
    }

    /// Put wallet (single, unbatched)
    pub fn put_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_wallet(&mut batch, wallet)?;
        self.commit(batch)
    }

    // Wallet transaction operations

    /// Get wallet transaction by ID
    pub fn get_wallet_txn(&self, txn_id: Uuid) -> Result<WalletTransaction> {
        let cf = self.cf_handle(CF_WALLET_TXNS)?;
        let value = self
            .db
            .get_cf(cf, txn_id.as_bytes())?
            .ok_or_else(|| Error::TransactionNotFound(txn_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Stage a wallet transaction write (entry plus user index)
    pub fn stage_wallet_txn(&self, batch: &mut WriteBatch, txn: &WalletTransaction) -> Result<()> {
        let cf = self.cf_handle(CF_WALLET_TXNS)?;
        batch.put_cf(cf, txn.id.as_bytes(), bincode::serialize(txn)?);

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key(IDX_WALLET_TXN, txn.user_id.as_bytes(), txn.id);
        batch.put_cf(cf_indices, &key, []);
        Ok(())
    }

    /// Put wallet transaction (single, unbatched)
    pub fn put_wallet_txn(&self, txn: &WalletTransaction) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_wallet_txn(&mut batch, txn)?;
        self.commit(batch)
    }

    /// Get all wallet transactions for a user (via index, insertion order)
    pub fn wallet_txns_for(&self, user_id: UserId) -> Result<Vec<WalletTransaction>> {
        let ids = self.scan_index(IDX_WALLET_TXN, user_id.as_bytes())?;
        ids.into_iter().map(|id| self.get_wallet_txn(id)).collect()
    }

    // Legacy transaction operations

    /// Get legacy transaction by ID
    pub fn get_transaction(&self, txn_id: Uuid) -> Result<Transaction> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        let value = self
            .db
            .get_cf(cf, txn_id.as_bytes())?
            .ok_or_else(|| Error::TransactionNotFound(txn_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Stage a legacy transaction write (record plus user index)
    pub fn stage_transaction(&self, batch: &mut WriteBatch, txn: &Transaction) -> Result<()> {
        let cf = self.cf_handle(CF_TRANSACTIONS)?;
        batch.put_cf(cf, txn.id.as_bytes(), bincode::serialize(txn)?);

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key(IDX_TRANSACTION, txn.user_id.as_bytes(), txn.id);
        batch.put_cf(cf_indices, &key, []);
        Ok(())
    }

    /// Get all legacy transactions for a user (via index)
    pub fn transactions_for(&self, user_id: UserId) -> Result<Vec<Transaction>> {
        let ids = self.scan_index(IDX_TRANSACTION, user_id.as_bytes())?;
        ids.into_iter().map(|id| self.get_transaction(id)).collect()
    }

    // Campaign operations

    /// Get campaign by ID
    pub fn get_campaign(&self, campaign_id: CampaignId) -> Result<Campaign> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        let value = self
            .db
            .get_cf(cf, campaign_id.as_bytes())?
            .ok_or_else(|| Error::CampaignNotFound(campaign_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Stage a campaign write
    pub fn stage_campaign(&self, batch: &mut WriteBatch, campaign: &Campaign) -> Result<()> {
        let cf = self.cf_handle(CF_CAMPAIGNS)?;
        batch.put_cf(cf, campaign.id.as_bytes(), bincode::serialize(campaign)?);
        Ok(())
    }

    /// Put campaign (single, unbatched)
    pub fn put_campaign(&self, campaign: &Campaign) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_campaign(&mut batch, campaign)?;
        self.commit(batch)
    }

    // Holding operations

    /// Get a holding for the (campaign, investor) pair
    pub fn get_holding(
        &self,
        campaign_id: CampaignId,
        investor_id: UserId,
    ) -> Result<Option<Holding>> {
        let cf = self.cf_handle(CF_HOLDINGS)?;
        let key = Self::pair_key(campaign_id, investor_id.as_uuid());
        match self.db.get_cf(cf, &key)? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    /// Stage a holding write
    pub fn stage_holding(&self, batch: &mut WriteBatch, holding: &Holding) -> Result<()> {
        let cf = self.cf_handle(CF_HOLDINGS)?;
        let key = Self::pair_key(holding.campaign_id, holding.investor_id.as_uuid());
        batch.put_cf(cf, &key, bincode::serialize(holding)?);
        Ok(())
    }

    /// Put holding (single, unbatched)
    pub fn put_holding(&self, holding: &Holding) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_holding(&mut batch, holding)?;
        self.commit(batch)
    }

    /// Get all holdings for a campaign (prefix scan)
    pub fn holdings_for_campaign(&self, campaign_id: CampaignId) -> Result<Vec<Holding>> {
        self.scan_prefix(CF_HOLDINGS, campaign_id.as_bytes())
    }

    /// Get all holdings owned by an investor (full scan over holdings)
    pub fn holdings_for_investor(&self, investor_id: UserId) -> Result<Vec<Holding>> {
        let cf = self.cf_handle(CF_HOLDINGS)?;
        let mut holdings = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_, value) = item?;
            let holding: Holding = bincode::deserialize(&value)?;
            if holding.investor_id == investor_id {
                holdings.push(holding);
            }
        }
        Ok(holdings)
    }

    // Revenue event operations

    /// Get revenue event by campaign and ID
    pub fn get_revenue_event(
        &self,
        campaign_id: CampaignId,
        event_id: Uuid,
    ) -> Result<RevenueEvent> {
        let cf = self.cf_handle(CF_REVENUE)?;
        let key = Self::pair_key(campaign_id, event_id);
        let value = self
            .db
            .get_cf(cf, &key)?
            .ok_or_else(|| Error::EventNotFound(event_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Stage a revenue event write
    pub fn stage_revenue_event(&self, batch: &mut WriteBatch, event: &RevenueEvent) -> Result<()> {
        let cf = self.cf_handle(CF_REVENUE)?;
        let key = Self::pair_key(event.campaign_id, event.id);
        batch.put_cf(cf, &key, bincode::serialize(event)?);
        Ok(())
    }

    /// Put revenue event (single, unbatched)
    pub fn put_revenue_event(&self, event: &RevenueEvent) -> Result<()> {
        let mut batch = WriteBatch::default();
        self.stage_revenue_event(&mut batch, event)?;
        self.commit(batch)
    }

    /// Get all revenue events for a campaign (prefix scan)
    pub fn revenue_events_for(&self, campaign_id: CampaignId) -> Result<Vec<RevenueEvent>> {
        self.scan_prefix(CF_REVENUE, campaign_id.as_bytes())
    }

    // Distribution operations

    /// Get distribution by ID
    pub fn get_distribution(&self, distribution_id: Uuid) -> Result<Distribution> {
        let cf = self.cf_handle(CF_DISTRIBUTIONS)?;
        let value = self
            .db
            .get_cf(cf, distribution_id.as_bytes())?
            .ok_or_else(|| Error::DistributionNotFound(distribution_id.to_string()))?;
        Ok(bincode::deserialize(&value)?)
    }

    /// Stage a distribution write (record plus campaign index)
    pub fn stage_distribution(
        &self,
        batch: &mut WriteBatch,
        distribution: &Distribution,
    ) -> Result<()> {
        let cf = self.cf_handle(CF_DISTRIBUTIONS)?;
        batch.put_cf(
            cf,
            distribution.id.as_bytes(),
            bincode::serialize(distribution)?,
        );

        let cf_indices = self.cf_handle(CF_INDICES)?;
        let key = Self::index_key(
            IDX_DISTRIBUTION,
            distribution.campaign_id.as_bytes(),
            distribution.id,
        );
        batch.put_cf(cf_indices, &key, []);
        Ok(())
    }

    /// Get all distributions for a campaign (via index)
    pub fn distributions_for(&self, campaign_id: CampaignId) -> Result<Vec<Distribution>> {
        let ids = self.scan_index(IDX_DISTRIBUTION, campaign_id.as_bytes())?;
        ids.into_iter().map(|id| self.get_distribution(id)).collect()
    }

    // Batch commit

    /// Commit a batch atomically: either every staged write lands or none do
    pub fn commit(&self, batch: WriteBatch) -> Result<()> {
        self.db.write(batch)?;
        Ok(())
    }

    // Key helpers

    /// 32-byte composite key: campaign_id || uuid
    fn pair_key(campaign_id: CampaignId, id: Uuid) -> [u8; 32] {
        let mut key = [0u8; 32];
        key[..16].copy_from_slice(campaign_id.as_bytes());
        key[16..].copy_from_slice(id.as_bytes());
        key
    }

    /// 33-byte index key: tag || owner (16) || id (16)
    fn index_key(tag: u8, owner: &[u8; 16], id: Uuid) -> [u8; 33] {
        let mut key = [0u8; 33];
        key[0] = tag;
        key[1..17].copy_from_slice(owner);
        key[17..].copy_from_slice(id.as_bytes());
        key
    }

    /// Scan an index range, extracting the trailing UUID of each key
    fn scan_index(&self, tag: u8, owner: &[u8; 16]) -> Result<Vec<Uuid>> {
        let cf = self.cf_handle(CF_INDICES)?;
        let mut prefix = Vec::with_capacity(17);
        prefix.push(tag);
        prefix.extend_from_slice(owner);

        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(&prefix, Direction::Forward));

        let mut ids = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(&prefix) {
                break;
            }
            let id_bytes: [u8; 16] = key[17..33]
                .try_into()
                .map_err(|_| Error::Storage("Malformed index key".to_string()))?;
            ids.push(Uuid::from_bytes(id_bytes));
        }
        Ok(ids)
    }

    /// Scan a column family for all values under a key prefix
    fn scan_prefix<T: serde::de::DeserializeOwned>(
        &self,
        cf_name: &str,
        prefix: &[u8],
    ) -> Result<Vec<T>> {
        let cf = self.cf_handle(cf_name)?;
        let iter = self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward));

        let mut values = Vec::new();
        for item in iter {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            values.push(bincode::deserialize(&value)?);
        }
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Currency, FundingStatus, TxnKind};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use tempfile::TempDir;

    fn test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.data_dir = temp_dir.path().to_path_buf();
        (Storage::open(&config).unwrap(), temp_dir)
    }

    fn test_campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: CampaignId::generate(),
            artist_id: UserId::generate(),
            title: "First EP".to_string(),
            currency: Currency::INR,
            target_amount: Decimal::from(10000),
            partition_price: Decimal::from(100),
            revenue_share_pct: Decimal::from(40),
            total_partitions: 100,
            min_partitions_per_user: 1,
            amount_raised: Decimal::ZERO,
            funding_status: FundingStatus::Live,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_storage_open() {
        let (storage, _temp) = test_storage();
        assert!(storage.db.cf_handle(CF_WALLETS).is_some());
        assert!(storage.db.cf_handle(CF_HOLDINGS).is_some());
    }

    #[test]
    fn test_wallet_roundtrip() {
        let (storage, _temp) = test_storage();
        let user = UserId::generate();

        assert!(storage.get_wallet(user).unwrap().is_none());

        let wallet = Wallet::new(user);
        storage.put_wallet(&wallet).unwrap();

        let retrieved = storage.get_wallet(user).unwrap().unwrap();
        assert_eq!(retrieved.user_id, user);
        assert_eq!(retrieved.balance, Decimal::ZERO);
    }

    #[test]
    fn test_wallet_txns_indexed_by_user() {
        let (storage, _temp) = test_storage();
        let user = UserId::generate();
        let other = UserId::generate();

        for _ in 0..3 {
            let txn = WalletTransaction::completed(
                user,
                TxnKind::Deposit,
                Decimal::from(100),
                Decimal::ZERO,
                Decimal::from(100),
                "deposit",
                None,
            );
            storage.put_wallet_txn(&txn).unwrap();
        }
        let txn = WalletTransaction::completed(
            other,
            TxnKind::Deposit,
            Decimal::from(50),
            Decimal::ZERO,
            Decimal::from(50),
            "deposit",
            None,
        );
        storage.put_wallet_txn(&txn).unwrap();

        assert_eq!(storage.wallet_txns_for(user).unwrap().len(), 3);
        assert_eq!(storage.wallet_txns_for(other).unwrap().len(), 1);
    }

    #[test]
    fn test_holding_pair_key_uniqueness() {
        let (storage, _temp) = test_storage();
        let campaign = CampaignId::generate();
        let investor = UserId::generate();

        let mut holding = Holding::new(campaign, investor, 10);
        storage.put_holding(&holding).unwrap();

        // Second write for the same pair overwrites rather than duplicating
        holding.partitions_owned = 25;
        storage.put_holding(&holding).unwrap();

        let holdings = storage.holdings_for_campaign(campaign).unwrap();
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].partitions_owned, 25);
    }

    #[test]
    fn test_revenue_prefix_scan_scoped_to_campaign() {
        let (storage, _temp) = test_storage();
        let campaign_a = CampaignId::generate();
        let campaign_b = CampaignId::generate();

        for _ in 0..2 {
            let event =
                RevenueEvent::new(campaign_a, "spotify", Decimal::from(500), Currency::INR);
            storage.put_revenue_event(&event).unwrap();
        }
        let event = RevenueEvent::new(campaign_b, "spotify", Decimal::from(900), Currency::INR);
        storage.put_revenue_event(&event).unwrap();

        assert_eq!(storage.revenue_events_for(campaign_a).unwrap().len(), 2);
        assert_eq!(storage.revenue_events_for(campaign_b).unwrap().len(), 1);
    }

    #[test]
    fn test_atomic_batch_commit() {
        let (storage, _temp) = test_storage();
        let campaign = test_campaign();
        let investor = UserId::generate();

        let mut batch = WriteBatch::default();
        storage.stage_campaign(&mut batch, &campaign).unwrap();
        storage
            .stage_holding(&mut batch, &Holding::new(campaign.id, investor, 5))
            .unwrap();
        let wallet = Wallet::new(investor);
        storage.stage_wallet(&mut batch, &wallet).unwrap();
        storage.commit(batch).unwrap();

        assert_eq!(storage.get_campaign(campaign.id).unwrap().title, "First EP");
        assert!(storage.get_holding(campaign.id, investor).unwrap().is_some());
        assert!(storage.get_wallet(investor).unwrap().is_some());
    }

    #[test]
    fn test_campaign_not_found() {
        let (storage, _temp) = test_storage();
        let result = storage.get_campaign(CampaignId::generate());
        assert!(matches!(result, Err(Error::CampaignNotFound(_))));
    }
}
