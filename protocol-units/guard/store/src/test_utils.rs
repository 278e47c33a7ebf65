use guard_util::{
	Amount, Chain, ConfirmedEvent, EventId, EventProof, EventStatus, EventTrigger,
	PaymentTransaction, TransactionType,
};

pub fn confirmed_event(
	source_tx_id: &str,
	height: u64,
	amount: u64,
	from_chain: Chain,
	to_chain: Chain,
) -> ConfirmedEvent {
	let trigger = EventTrigger {
		source_tx_id: source_tx_id.to_string(),
		from_chain,
		to_chain,
		from_address: "from".to_string(),
		to_address: "to".to_string(),
		amount: Amount::from(amount),
		bridge_fee: Amount::ZERO,
		network_fee: Amount::ZERO,
		source_chain_token_id: "source-token".to_string(),
		target_chain_token_id: "target-token".to_string(),
		wids: vec!["w1".to_string()],
		height,
		source_block_id: String::new(),
		source_chain_height: 0,
	};
	ConfirmedEvent::new(trigger, EventProof(vec![1, 2, 3]), EventStatus::PendingPayment)
}

pub fn transaction(
	tx_id: &str,
	event_id: Option<&EventId>,
	tx_type: TransactionType,
) -> PaymentTransaction {
	PaymentTransaction::new(tx_id, event_id.cloned(), tx_type, Chain::Ergo, vec![0xab], 3)
}
