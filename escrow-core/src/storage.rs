//! Storage layer using RocksDB
//!
//! # Column Families
//!
//! - `deals` - Deal records (key: big-endian deal id)
//! - `payments` - Escrow payment records (key: big-endian payment id)
//! - `profiles` - Trust profiles (key: account id bytes)
//! - `meta` - Identifier counters (key: counter name)
//!
//! Every mutating operation commits through a single `WriteBatch`, so a
//! deal and its paired payment (and the counters that named them) are
//! either all visible or none of them are.
//!
//! The database runs in the default single-threaded column-family mode;
//! the single-writer actor already serializes all access, and this mode
//! keeps `cf_handle` returning borrowed `&ColumnFamily` handles.

use crate::{
    error::{Error, Result},
    types::{AccountId, Deal, DealId, Payment, PaymentId, TrustProfile},
    Config,
};
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::sync::Arc;

/// Column family names
const CF_DEALS: &str = "deals";
const CF_PAYMENTS: &str = "payments";
const CF_PROFILES: &str = "profiles";
const CF_META: &str = "meta";

/// Counter keys in the meta column family
const KEY_DEAL_COUNTER: &[u8] = b"deal_id_counter";
const KEY_PAYMENT_COUNTER: &[u8] = b"payment_id_counter";

/// First identifier handed out by either counter
pub const FIRST_ID: u64 = 1;

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

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_DEALS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_PAYMENTS, Self::cf_options_records()),
            ColumnFamilyDescriptor::new(CF_PROFILES, Self::cf_options_profiles()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(path = ?path, "Opened escrow RocksDB");

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options_records() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_profiles() -> Options {
        let mut opts = Options::default();
        // Profiles are read on every rating, use LZ4 for speed
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }

    fn cf_handle(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", name)))
    }

    // Counter operations

    /// Next deal identifier (not yet allocated)
    pub fn deal_counter(&self) -> Result<u64> {
        self.read_counter(KEY_DEAL_COUNTER)
    }

    /// Next payment identifier (not yet allocated)
    pub fn payment_counter(&self) -> Result<u64> {
        self.read_counter(KEY_PAYMENT_COUNTER)
    }

    fn read_counter(&self, key: &[u8]) -> Result<u64> {
        let cf = self.cf_handle(CF_META)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                    Error::InvariantViolation("Counter value is not 8 bytes".to_string())
                })?;
                Ok(u64::from_be_bytes(arr))
            }
            None => Ok(FIRST_ID),
        }
    }

    // Deal operations

    /// Get deal by ID
    pub fn get_deal(&self, deal_id: DealId) -> Result<Option<Deal>> {
        let cf = self.cf_handle(CF_DEALS)?;
        match self.db.get_cf(cf, deal_id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Payment operations

    /// Get payment by ID
    pub fn get_payment(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        let cf = self.cf_handle(CF_PAYMENTS)?;
        match self.db.get_cf(cf, payment_id.to_be_bytes())? {
            Some(value) => Ok(Some(bincode::deserialize(&value)?)),
            None => Ok(None),
        }
    }

    // Profile operations

    /// Get trust profile, zero profile if the account has never been rated
    pub fn get_profile(&self, account: &AccountId) -> Result<TrustProfile> {
        let cf = self.cf_handle(CF_PROFILES)?;
        match self.db.get_cf(cf, account.as_bytes())? {
            Some(value) => Ok(bincode::deserialize(&value)?),
            None => Ok(TrustProfile::default()),
        }
    }

    // Atomic commits (one WriteBatch per operation)

    /// Commit a newly opened deal: deal + paired payment + both counters
    pub fn commit_deal_open(&self, deal: &Deal, payment: &Payment) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_deals = self.cf_handle(CF_DEALS)?;
        batch.put_cf(cf_deals, deal.deal_id.to_be_bytes(), bincode::serialize(deal)?);

        let cf_payments = self.cf_handle(CF_PAYMENTS)?;
        batch.put_cf(
            cf_payments,
            payment.payment_id.to_be_bytes(),
            bincode::serialize(payment)?,
        );

        let cf_meta = self.cf_handle(CF_META)?;
        batch.put_cf(cf_meta, KEY_DEAL_COUNTER, (deal.deal_id + 1).to_be_bytes());
        batch.put_cf(
            cf_meta,
            KEY_PAYMENT_COUNTER,
            (payment.payment_id + 1).to_be_bytes(),
        );

        self.db.write(batch)?;

        tracing::debug!(
            deal_id = deal.deal_id,
            payment_id = payment.payment_id,
            value = deal.value,
            "Deal opened"
        );

        Ok(())
    }

    /// Commit a payment completion: settled payment + completed deal
    pub fn commit_payment_complete(&self, payment: &Payment, deal: &Deal) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_payments = self.cf_handle(CF_PAYMENTS)?;
        batch.put_cf(
            cf_payments,
            payment.payment_id.to_be_bytes(),
            bincode::serialize(payment)?,
        );

        let cf_deals = self.cf_handle(CF_DEALS)?;
        batch.put_cf(cf_deals, deal.deal_id.to_be_bytes(), bincode::serialize(deal)?);

        self.db.write(batch)?;

        tracing::debug!(
            payment_id = payment.payment_id,
            deal_id = deal.deal_id,
            amount = payment.amount,
            "Payment completed"
        );

        Ok(())
    }

    /// Commit a rating: rated deal + updated trust profile
    pub fn commit_rating(
        &self,
        deal: &Deal,
        rated: &AccountId,
        profile: &TrustProfile,
    ) -> Result<()> {
        let mut batch = WriteBatch::default();

        let cf_deals = self.cf_handle(CF_DEALS)?;
        batch.put_cf(cf_deals, deal.deal_id.to_be_bytes(), bincode::serialize(deal)?);

        let cf_profiles = self.cf_handle(CF_PROFILES)?;
        batch.put_cf(cf_profiles, rated.as_bytes(), bincode::serialize(profile)?);

        self.db.write(batch)?;

        tracing::debug!(
            deal_id = deal.deal_id,
            rated = %rated,
            cumulative_score = profile.cumulative_score,
            deal_count = profile.deal_count,
            "Rating recorded"
        );

        Ok(())
    }

    // Statistics

    /// Get storage statistics
    pub fn get_stats(&self) -> Result<StorageStats> {
        let cf_deals = self.cf_handle(CF_DEALS)?;
        let cf_payments = self.cf_handle(CF_PAYMENTS)?;
        let cf_profiles = self.cf_handle(CF_PROFILES)?;

        let mut profile_count = 0u64;
        let iter = self.db.iterator_cf(cf_profiles, IteratorMode::Start);
        for item in iter {
            item?;
            profile_count += 1;
        }

        Ok(StorageStats {
            total_deals: self.approximate_count(cf_deals)?,
            total_payments: self.approximate_count(cf_payments)?,
            total_profiles: profile_count,
        })
    }

    fn approximate_count(&self, cf: &ColumnFamily) -> Result<u64> {
        let prop = self
            .db
            .property_int_value_cf(cf, "rocksdb.estimate-num-keys")?
            .unwrap_or(0);

        Ok(prop)
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Number of deals ever opened
    pub total_deals: u64,
    /// Number of payments ever created
    pub total_payments: u64,
    /// Number of accounts with a rated deal
    pub total_profiles: u64,
}
