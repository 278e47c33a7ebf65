use guard_util::{Amount, Chain, ConfirmedEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
	#[default]
	Ascending,
	Descending,
}

/// Filter and page over events, ordered by trigger height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventQuery {
	pub from_chain: Option<Chain>,
	pub to_chain: Option<Chain>,
	pub min_amount: Option<Amount>,
	pub max_amount: Option<Amount>,
	pub sort: SortOrder,
	pub offset: usize,
	pub limit: usize,
}

impl Default for EventQuery {
	fn default() -> Self {
		EventQuery {
			from_chain: None,
			to_chain: None,
			min_amount: None,
			max_amount: None,
			sort: SortOrder::Ascending,
			offset: 0,
			limit: 100,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventPage {
	pub items: Vec<ConfirmedEvent>,
	/// Number of matching events before paging.
	pub total: usize,
}

impl EventQuery {
	pub fn matches(&self, event: &ConfirmedEvent) -> bool {
		let trigger = &event.event;
		self.from_chain.map_or(true, |chain| trigger.from_chain == chain)
			&& self.to_chain.map_or(true, |chain| trigger.to_chain == chain)
			&& self.min_amount.map_or(true, |min| trigger.amount >= min)
			&& self.max_amount.map_or(true, |max| trigger.amount <= max)
	}

	pub fn apply(&self, events: Vec<ConfirmedEvent>) -> EventPage {
		let mut items: Vec<ConfirmedEvent> =
			events.into_iter().filter(|event| self.matches(event)).collect();
		items.sort_by(|a, b| a.event.height.cmp(&b.event.height).then_with(|| a.id.cmp(&b.id)));
		if self.sort == SortOrder::Descending {
			items.reverse();
		}
		let total = items.len();
		let items = items.into_iter().skip(self.offset).take(self.limit).collect();
		EventPage { items, total }
	}
}
