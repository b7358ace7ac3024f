//! The judging loop end to end: offers, choices, exhaustion, and the
//! per-judge no-repeat constraint, all over the real JSON store.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::TempDir;

use rp_core::error::RankError;
use rp_core::models::PairKey;
use rp_core::traits::RankStore;
use rp_service::{EngineConfig, RankingService};
use rp_storage_json::JsonStore;

async fn service_in(dir: &TempDir) -> RankingService<JsonStore> {
    let store = JsonStore::open(dir.path()).await.expect("open store");
    RankingService::with_rng(store, EngineConfig::default(), StdRng::seed_from_u64(99))
}

#[tokio::test]
async fn one_item_is_not_enough() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    svc.add_item("lonely", None).await.unwrap();

    let err = svc.request_pair("@judge").await.unwrap_err();
    assert!(matches!(err, RankError::InsufficientItems(1)));
    assert_eq!(svc.remaining_pairs("@judge").await.unwrap(), 0);
}

#[tokio::test]
async fn even_match_transfers_sixteen_points() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    svc.add_item("espresso", None).await.unwrap();
    svc.add_item("cappuccino", None).await.unwrap();

    svc.request_pair("@judge").await.unwrap();
    let outcome = svc.submit_choice("@judge", "1").await.unwrap();

    assert_eq!(outcome.winner.rating, 1516.0);
    assert_eq!(outcome.loser.rating, 1484.0);
    assert_eq!(outcome.winner.comparison_count, 1);

    let board = svc.leaderboard().await.unwrap();
    assert_eq!(board[0].rating, 1516.0);
    assert_eq!(board[1].rating, 1484.0);
}

#[tokio::test]
async fn three_items_exhaust_after_three_votes() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    for name in ["ramen", "pho", "udon"] {
        svc.add_item(name, None).await.unwrap();
    }

    let mut seen = Vec::new();
    for expected_remaining in [3usize, 2, 1] {
        let offer = svc.request_pair("@judge").await.unwrap();
        assert_eq!(offer.remaining, expected_remaining);

        let key = PairKey::new(offer.item_a.id, offer.item_b.id);
        assert!(!seen.contains(&key), "pair offered twice to one judge");
        seen.push(key);

        svc.submit_choice("@judge", "2").await.unwrap();
    }

    let err = svc.request_pair("@judge").await.unwrap_err();
    assert!(matches!(err, RankError::PairsExhausted));
    assert_eq!(svc.remaining_pairs("@judge").await.unwrap(), 0);
    assert_eq!(svc.store().all_votes().await.unwrap().len(), 3);
}

#[tokio::test]
async fn invalid_choice_keeps_the_same_pair_on_offer() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    svc.add_item("cats", None).await.unwrap();
    svc.add_item("dogs", None).await.unwrap();

    let offer = svc.request_pair("@judge").await.unwrap();
    let offered = PairKey::new(offer.item_a.id, offer.item_b.id);

    let err = svc.submit_choice("@judge", "3").await.unwrap_err();
    assert!(matches!(err, RankError::InvalidChoice(_)));

    // Same pair, same session, still answerable.
    let again = svc.request_pair("@judge").await.unwrap();
    assert_eq!(PairKey::new(again.item_a.id, again.item_b.id), offered);
    svc.submit_choice("@judge", "1").await.unwrap();
}

#[tokio::test]
async fn judges_have_independent_histories() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    svc.add_item("red", None).await.unwrap();
    svc.add_item("blue", None).await.unwrap();

    svc.request_pair("@first").await.unwrap();
    svc.submit_choice("@first", "1").await.unwrap();
    assert!(matches!(
        svc.request_pair("@first").await.unwrap_err(),
        RankError::PairsExhausted
    ));

    // A second judge still gets the pair.
    let offer = svc.request_pair("@second").await.unwrap();
    assert_eq!(offer.remaining, 1);
}

#[tokio::test]
async fn skip_is_answerable_and_never_repeats_history() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    for name in ["a", "b", "c", "d"] {
        svc.add_item(name, None).await.unwrap();
    }

    svc.request_pair("@judge").await.unwrap();
    let offer = svc.skip_current_offer("@judge").await.unwrap();

    // The skipped pair was never voted, so nothing was consumed.
    assert_eq!(offer.remaining, 6);
    svc.submit_choice("@judge", "1").await.unwrap();
    assert_eq!(svc.remaining_pairs("@judge").await.unwrap(), 5);
}

#[tokio::test]
async fn stale_session_reports_not_found_and_recovers() {
    let dir = TempDir::new().unwrap();
    let svc = service_in(&dir).await;
    svc.add_item("a", None).await.unwrap();
    svc.add_item("b", None).await.unwrap();

    // A session left behind pointing at items that no longer exist.
    svc.store()
        .save_session(rp_core::models::VotingSession {
            judge_id: "@judge".into(),
            item_a_id: uuid::Uuid::now_v7(),
            item_b_id: uuid::Uuid::now_v7(),
        })
        .await
        .unwrap();

    let err = svc.submit_choice("@judge", "1").await.unwrap_err();
    assert!(matches!(err, RankError::NotFound(kind, _) if kind == "item"));

    // Session was cleared; selection restarts cleanly.
    assert!(svc.store().get_session("@judge").await.unwrap().is_none());
    let offer = svc.request_pair("@judge").await.unwrap();
    assert_eq!(offer.remaining, 1);
}

#[tokio::test]
async fn two_judges_vote_concurrently() {
    let dir = TempDir::new().unwrap();
    let svc = std::sync::Arc::new(service_in(&dir).await);
    for name in ["w", "x", "y", "z"] {
        svc.add_item(name, None).await.unwrap();
    }

    let mut handles = Vec::new();
    for judge in ["@left", "@right"] {
        let svc = svc.clone();
        handles.push(tokio::spawn(async move {
            loop {
                match svc.request_pair(judge).await {
                    Ok(_) => {
                        svc.submit_choice(judge, "1").await.expect("submit");
                    }
                    Err(RankError::PairsExhausted) => break,
                    Err(err) => panic!("unexpected error: {err}"),
                }
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // 4 items → 6 pairs per judge, every one recorded exactly once.
    assert_eq!(svc.store().all_votes().await.unwrap().len(), 12);
    assert_eq!(svc.remaining_pairs("@left").await.unwrap(), 0);
    assert_eq!(svc.remaining_pairs("@right").await.unwrap(), 0);

    // Zero-sum overall: total rating mass is unchanged.
    let total: f64 = svc
        .leaderboard()
        .await
        .unwrap()
        .iter()
        .map(|i| i.rating)
        .sum();
    assert!((total - 4.0 * 1500.0).abs() < 1e-6);
}
