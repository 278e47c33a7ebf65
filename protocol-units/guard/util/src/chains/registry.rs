use crate::chains::adapter::{AdapterError, AdapterResult, ChainAdapter};
use crate::types::Chain;
use std::collections::HashMap;
use std::sync::Arc;

/// Adapters keyed by chain, built once at startup.
#[derive(Clone, Default)]
pub struct ChainRegistry {
	adapters: HashMap<Chain, Arc<dyn ChainAdapter>>,
}

impl ChainRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_adapter(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
		self.register(adapter);
		self
	}

	/// Registers an adapter, returning the one it replaced.
	pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) -> Option<Arc<dyn ChainAdapter>> {
		self.adapters.insert(adapter.chain(), adapter)
	}

	pub fn get(&self, chain: Chain) -> AdapterResult<Arc<dyn ChainAdapter>> {
		self.adapters.get(&chain).cloned().ok_or(AdapterError::UnknownChain(chain))
	}

	pub fn bridge(&self) -> AdapterResult<Arc<dyn ChainAdapter>> {
		self.get(Chain::BRIDGE)
	}

	pub fn chains(&self) -> impl Iterator<Item = Chain> + '_ {
		self.adapters.keys().copied()
	}
}

impl std::fmt::Debug for ChainRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChainRegistry").field("chains", &self.adapters.keys()).finish()
	}
}
