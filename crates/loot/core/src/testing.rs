//! Shared stubs for the crate's unit tests.

use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::RngCore;

use crate::condition::LootCondition;
use crate::context::LootContext;
use crate::entry::{LootChoice, LootEntry};
use crate::error::GenerateError;
use crate::item::ItemStack;
use crate::number::LootNumber;

/// An RNG that replays a fixed script of `u64` values.
///
/// Draws beyond the script panic, so a test pins down exactly how many draws
/// the code under test performs.
pub struct ScriptRng {
    values: VecDeque<u64>,
}

impl ScriptRng {
    pub fn new(values: Vec<u64>) -> Self {
        Self {
            values: values.into(),
        }
    }
}

impl RngCore for ScriptRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.values
            .pop_front()
            .expect("ScriptRng ran out of scripted values")
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// A number provider that always evaluates to the same integer.
pub struct FixedNumber(pub i64);

impl LootNumber for FixedNumber {
    fn get_int(&self, _context: &mut LootContext) -> Result<i64, GenerateError> {
        Ok(self.0)
    }

    fn get_double(&self, _context: &mut LootContext) -> Result<f64, GenerateError> {
        Ok(self.0 as f64)
    }
}

/// A condition with a fixed result that counts how often it was evaluated.
pub struct CountingCondition {
    result: bool,
    evaluations: AtomicUsize,
}

impl CountingCondition {
    pub fn new(result: bool) -> Self {
        Self {
            result,
            evaluations: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }
}

impl LootCondition for CountingCondition {
    fn test(&self, _context: &mut LootContext) -> Result<bool, GenerateError> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(self.result)
    }
}

/// Reads the evaluation count back out of a boxed [`CountingCondition`].
pub fn calls(condition: &dyn LootCondition) -> usize {
    let any: &dyn Any = condition;
    any.downcast_ref::<CountingCondition>()
        .expect("not a CountingCondition")
        .calls()
}

/// A condition that always fails.
pub struct FailCondition;

impl LootCondition for FailCondition {
    fn test(&self, _context: &mut LootContext) -> Result<bool, GenerateError> {
        Ok(false)
    }
}

/// An entry with a fixed list of weighted single-item choices, counting how
/// often its choices were requested.
pub struct StubEntry {
    choices: Vec<(&'static str, u64)>,
    requests: AtomicUsize,
}

impl StubEntry {
    /// One choice of weight one per item id.
    pub fn new(items: &[&'static str]) -> Self {
        Self::weighted(&items.iter().map(|&id| (id, 1)).collect::<Vec<_>>())
    }

    pub fn weighted(choices: &[(&'static str, u64)]) -> Self {
        Self {
            choices: choices.to_vec(),
            requests: AtomicUsize::new(0),
        }
    }

    /// An entry that never offers a choice.
    pub fn empty() -> Self {
        Self::weighted(&[])
    }

    pub fn calls(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }
}

impl LootEntry for StubEntry {
    fn request_choices<'a>(
        &'a self,
        _context: &mut LootContext,
    ) -> Result<Vec<Box<dyn LootChoice + 'a>>, GenerateError> {
        self.requests.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .choices
            .iter()
            .map(|&(id, weight)| Box::new(StubChoice { id, weight }) as Box<dyn LootChoice>)
            .collect())
    }
}

struct StubChoice {
    id: &'static str,
    weight: u64,
}

impl LootChoice for StubChoice {
    fn weight(&self, _context: &mut LootContext) -> Result<u64, GenerateError> {
        Ok(self.weight)
    }

    fn generate(&self, _context: &mut LootContext) -> Result<Vec<ItemStack>, GenerateError> {
        Ok(vec![ItemStack::of(self.id)])
    }
}
