mod harness;

use futures::future::join_all;
use guard_service::mock::sample_event;
use guard_service::Admission;
use guard_store::GuardStore;
use guard_util::{
	Chain, EventId, EventProof, EventStatus, PaymentTransaction, TransactionStatus,
	TransactionType,
};
use harness::GuardHarness;
use std::sync::Arc;

fn candidate(tx_id: &str, event_id: &EventId) -> PaymentTransaction {
	PaymentTransaction::new(
		tx_id,
		Some(event_id.clone()),
		TransactionType::Payment,
		Chain::Cardano,
		tx_id.as_bytes().to_vec(),
		3,
	)
}

async fn harness_with_event() -> Result<(GuardHarness, EventId), anyhow::Error> {
	let harness = GuardHarness::new();
	let trigger = sample_event("lock-1", Chain::Ergo, Chain::Cardano, 100);
	let event_id = trigger.event_id();
	harness.events.insert_event(trigger, EventProof::default()).await?;
	Ok((harness, event_id))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_candidates_leave_one_active() -> Result<(), anyhow::Error> {
	let (harness, event_id) = harness_with_event().await?;
	let ledger = harness.ledger.clone();

	let tasks = (0..32).rev().map(|i| {
		let ledger = Arc::clone(&ledger);
		let tx = candidate(&format!("{i:04}"), &event_id);
		tokio::spawn(async move { ledger.insert(tx).await })
	});
	for result in join_all(tasks).await {
		result??;
	}

	let txs = harness.store.event_transactions(&event_id).await?;
	let active: Vec<_> = txs.iter().filter(|tx| tx.is_active()).collect();
	assert_eq!(active.len(), 1);
	// every arrival order converges to the lowest id that got admitted
	assert_eq!(active[0].tx_id, "0000");
	let event = harness.store.get_event(&event_id).await?.unwrap();
	assert_eq!(event.status, EventStatus::InPayment);
	Ok(())
}

#[tokio::test]
async fn test_lowest_id_wins_in_any_order() -> Result<(), anyhow::Error> {
	for order in [["a1", "b2"], ["b2", "a1"]] {
		let (harness, event_id) = harness_with_event().await?;
		for tx_id in order {
			harness.ledger.insert(candidate(tx_id, &event_id)).await?;
		}
		let active = harness
			.store
			.active_transactions_by_key(&candidate("a1", &event_id).admission_key())
			.await?;
		assert_eq!(active.len(), 1, "order {order:?}");
		assert_eq!(active[0].tx_id, "a1", "order {order:?}");
	}
	Ok(())
}

#[tokio::test]
async fn test_signed_transaction_is_never_superseded() -> Result<(), anyhow::Error> {
	let (harness, event_id) = harness_with_event().await?;
	harness.ledger.insert(candidate("5", &event_id)).await?;
	harness.machine.mark_in_sign("5").await?;
	harness.machine.update_with_signed_tx("5", b"signed".to_vec()).await?;

	let outcome = harness.ledger.insert(candidate("3", &event_id)).await?;
	assert_eq!(
		outcome.admission,
		Admission::Discarded { active: "5".to_string(), status: TransactionStatus::Signed }
	);
	assert!(outcome.transitions.is_empty());
	assert!(harness.store.get_transaction("3").await?.is_none());
	assert_eq!(
		harness.store.get_transaction("5").await?.unwrap().status,
		TransactionStatus::Signed
	);
	Ok(())
}
