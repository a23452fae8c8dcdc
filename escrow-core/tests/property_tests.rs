//! Property-based tests for escrow ledger invariants
//!
//! These tests use proptest to verify critical invariants:
//! - Identifier density: successful creations get dense, increasing ids
//! - Guard atomicity: rejected calls mutate nothing
//! - Trust aggregation: Σ(ratings) and rated-deal counts are exact
//! - No double spend: a payment settles at most once

use escrow_core::{
    AccountId, BlockCounter, Config, DealState, Error, Escrow, InMemoryBank, TrustProfile,
};
use proptest::prelude::*;
use std::sync::Arc;
use tempfile::TempDir;

/// Strategy for generating valid deal values
fn value_strategy() -> impl Strategy<Value = u64> {
    1u64..1_000_000_000
}

/// Strategy for generating valid ratings
fn rating_strategy() -> impl Strategy<Value = u32> {
    1u32..=100
}

/// Create test escrow ledger with temp directory
async fn create_test_escrow(bank: Arc<InMemoryBank>) -> (Escrow, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let config = Config {
        data_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };

    let heights = Arc::new(BlockCounter::new(1));
    let escrow = Escrow::open(config, bank, heights).await.unwrap();
    (escrow, temp_dir)
}

fn alice() -> AccountId {
    AccountId::new("alice")
}

fn bob() -> AccountId {
    AccountId::new("bob")
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// Property: valid deals are accepted with dense increasing ids
    #[test]
    fn prop_valid_deals_get_dense_ids(values in prop::collection::vec(value_strategy(), 1..10)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;

            for (i, value) in values.iter().enumerate() {
                let deal_id = escrow
                    .initiate_deal(alice(), bob(), *value)
                    .await
                    .unwrap();
                prop_assert_eq!(deal_id, i as u64 + 1);

                let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
                prop_assert_eq!(deal.state, DealState::Open);
                prop_assert_eq!(deal.value, *value);
                prop_assert_eq!(deal.trust_score, None);

                let payment = escrow.payment_info(deal.payment_id).await.unwrap().unwrap();
                prop_assert!(!payment.is_complete);
                prop_assert_eq!(payment.amount, *value);
            }

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: self deals always fail, regardless of value
    #[test]
    fn prop_self_deal_always_rejected(value in 0u64..1_000_000_000) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;

            let result = escrow.initiate_deal(alice(), alice(), value).await;
            prop_assert!(matches!(result, Err(Error::SelfDeal)));

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: the admin is never a valid counterparty
    #[test]
    fn prop_admin_counterparty_always_rejected(value in value_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;

            let admin = escrow.config().admin.clone();
            let result = escrow.initiate_deal(alice(), admin, value).await;
            prop_assert!(matches!(result, Err(Error::InvalidUser(_))));

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: rejected creations never burn an identifier
    #[test]
    fn prop_rejections_burn_no_ids(valid_count in 1usize..8) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;
            let admin = escrow.config().admin.clone();

            for i in 0..valid_count {
                // Invalid attempts between every valid creation
                let _ = escrow.initiate_deal(alice(), alice(), 100).await;
                let _ = escrow.initiate_deal(alice(), admin.clone(), 100).await;
                let _ = escrow.initiate_deal(alice(), bob(), 0).await;

                let deal_id = escrow.initiate_deal(alice(), bob(), 100).await.unwrap();
                prop_assert_eq!(deal_id, i as u64 + 1);
            }

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: trust aggregation is the exact sum and count of ratings
    #[test]
    fn prop_trust_aggregation_exact(ratings in prop::collection::vec(rating_strategy(), 1..8)) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let bank = Arc::new(InMemoryBank::new());
            bank.credit(&alice(), u64::MAX / 2);
            let (escrow, _temp) = create_test_escrow(bank).await;

            for rating in &ratings {
                let deal_id = escrow.initiate_deal(alice(), bob(), 100).await.unwrap();
                let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
                escrow.complete_payment(alice(), deal.payment_id).await.unwrap();
                escrow.rate_counterparty(bob(), deal_id, *rating).await.unwrap();
            }

            let profile = escrow.trust_profile(alice()).await.unwrap();
            let expected: u64 = ratings.iter().map(|r| u64::from(*r)).sum();
            prop_assert_eq!(profile.cumulative_score, expected);
            prop_assert_eq!(profile.deal_count, ratings.len() as u64);

            // The rated side accrues nothing
            let counter_profile = escrow.trust_profile(bob()).await.unwrap();
            prop_assert_eq!(counter_profile, TrustProfile::default());

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }

    /// Property: a payment settles at most once, whatever the value
    #[test]
    fn prop_no_double_transfer(value in value_strategy()) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let bank = Arc::new(InMemoryBank::new());
            bank.credit(&alice(), value);
            let (escrow, _temp) = create_test_escrow(bank.clone()).await;

            let deal_id = escrow.initiate_deal(alice(), bob(), value).await.unwrap();
            let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();

            escrow.complete_payment(alice(), deal.payment_id).await.unwrap();
            let result = escrow.complete_payment(alice(), deal.payment_id).await;
            prop_assert!(matches!(result, Err(Error::AlreadyComplete(_))));

            prop_assert_eq!(bank.balance(&alice()), 0);
            prop_assert_eq!(bank.balance(&bob()), value);

            escrow.shutdown().await.unwrap();
            Ok(())
        })?;
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_deal_lifecycle() {
        let bank = Arc::new(InMemoryBank::new());
        bank.credit(&alice(), 1500);
        let (escrow, _temp) = create_test_escrow(bank.clone()).await;

        // Alice opens a deal with Bob for 1000
        let deal_id = escrow.initiate_deal(alice(), bob(), 1000).await.unwrap();
        assert_eq!(deal_id, 1);

        let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
        assert_eq!(deal.payment_id, 1);
        assert_eq!(deal.state, DealState::Open);

        // Alice settles the escrow payment
        escrow.complete_payment(alice(), 1).await.unwrap();
        assert_eq!(bank.balance(&alice()), 500);
        assert_eq!(bank.balance(&bob()), 1000);

        let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
        assert_eq!(deal.state, DealState::Complete);

        // Bob rates Alice
        escrow.rate_counterparty(bob(), deal_id, 5).await.unwrap();

        let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
        assert_eq!(deal.trust_score, Some(5));

        let profile = escrow.trust_profile(alice()).await.unwrap();
        assert_eq!(profile.cumulative_score, 5);
        assert_eq!(profile.deal_count, 1);

        escrow.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_address_profile_is_zero() {
        let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;

        let profile = escrow
            .trust_profile(AccountId::new("never-seen-address"))
            .await
            .unwrap();
        assert_eq!(profile.cumulative_score, 0);
        assert_eq!(profile.deal_count, 0);

        escrow.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_stranger_cannot_complete_or_rate() {
        let bank = Arc::new(InMemoryBank::new());
        bank.credit(&alice(), 1000);
        let (escrow, _temp) = create_test_escrow(bank.clone()).await;

        let carol = AccountId::new("carol");

        let deal_id = escrow.initiate_deal(alice(), bob(), 1000).await.unwrap();
        let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();

        let result = escrow.complete_payment(carol.clone(), deal.payment_id).await;
        assert!(matches!(result, Err(Error::NoAuth(_))));

        escrow.complete_payment(alice(), deal.payment_id).await.unwrap();

        let result = escrow.rate_counterparty(carol, deal_id, 5).await;
        assert!(matches!(result, Err(Error::NotAuthorized(_))));

        let profile = escrow.trust_profile(alice()).await.unwrap();
        assert_eq!(profile, TrustProfile::default());

        escrow.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_deal_and_payment_counters_are_independent_but_aligned() {
        let (escrow, _temp) = create_test_escrow(Arc::new(InMemoryBank::new())).await;

        for i in 1..=3u64 {
            let deal_id = escrow
                .initiate_deal(alice(), AccountId::new(format!("peer-{}", i)), 100)
                .await
                .unwrap();
            assert_eq!(deal_id, i);

            let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
            assert_eq!(deal.payment_id, i);

            let payment = escrow.payment_info(i).await.unwrap().unwrap();
            assert_eq!(payment.deal_id, deal_id);
        }

        escrow.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_ratings_from_many_counterparties_aggregate() {
        let bank = Arc::new(InMemoryBank::new());
        bank.credit(&alice(), 10_000);
        let (escrow, _temp) = create_test_escrow(bank).await;

        let ratings = [3u32, 5, 4];
        for (i, rating) in ratings.iter().enumerate() {
            let peer = AccountId::new(format!("peer-{}", i));
            let deal_id = escrow
                .initiate_deal(alice(), peer.clone(), 100)
                .await
                .unwrap();
            let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
            escrow.complete_payment(alice(), deal.payment_id).await.unwrap();
            escrow.rate_counterparty(peer, deal_id, *rating).await.unwrap();
        }

        let profile = escrow.trust_profile(alice()).await.unwrap();
        assert_eq!(profile.cumulative_score, 12);
        assert_eq!(profile.deal_count, 3);

        escrow.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_metrics_track_outcomes() {
        let bank = Arc::new(InMemoryBank::new());
        bank.credit(&alice(), 1000);
        let (escrow, _temp) = create_test_escrow(bank).await;

        let deal_id = escrow.initiate_deal(alice(), bob(), 1000).await.unwrap();
        let _ = escrow.initiate_deal(alice(), alice(), 1000).await;

        let deal = escrow.deal_info(deal_id).await.unwrap().unwrap();
        escrow.complete_payment(alice(), deal.payment_id).await.unwrap();
        escrow.rate_counterparty(bob(), deal_id, 4).await.unwrap();

        // A refused host transfer is not a guard rejection
        let broke_deal = escrow.initiate_deal(alice(), bob(), 9999).await.unwrap();
        let broke = escrow.deal_info(broke_deal).await.unwrap().unwrap();
        let result = escrow.complete_payment(alice(), broke.payment_id).await;
        assert!(matches!(result, Err(Error::Transfer(_))));

        let metrics = escrow.metrics();
        assert_eq!(metrics.deals_opened.get(), 2);
        assert_eq!(metrics.payments_completed.get(), 1);
        assert_eq!(metrics.ratings_recorded.get(), 1);
        assert_eq!(metrics.rejections.get(), 1);

        escrow.shutdown().await.unwrap();
    }
}
