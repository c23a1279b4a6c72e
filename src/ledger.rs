// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Fortune Market Simulation - Holder Ledger
//
// Per-wallet balances in first-seen order, the derived top-holder view and
// the bounded set of recently active traders.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::types::{TopHolder, WalletBalance};

// ---------------------------------------------------------------------------
// Credit outcome
// ---------------------------------------------------------------------------

/// Result of crediting a wallet under the balance cap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Credit {
    /// Full amount credited.
    Full(f64),
    /// Amount cut down so the wallet lands exactly on the cap.
    Clamped { requested: f64, credited: f64 },
    /// Wallet already sits at the cap; nothing credited.
    Saturated,
}

impl Credit {
    pub fn credited(&self) -> f64 {
        match *self {
            Credit::Full(amount) => amount,
            Credit::Clamped { credited, .. } => credited,
            Credit::Saturated => 0.0,
        }
    }
}

/// How many tokens a wallet holding `balance` may still receive.
pub fn cap_headroom(balance: f64, max_tokens: f64) -> f64 {
    (max_tokens - balance).max(0.0)
}

// ---------------------------------------------------------------------------
// HolderLedger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HolderLedger {
    /// Insertion order is the tie-break order for equal balances.
    entries: Vec<(String, WalletBalance)>,
    index: HashMap<String, usize>,
}

impl HolderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }

    pub fn get(&self, wallet: &str) -> Option<&WalletBalance> {
        self.index.get(wallet).map(|&i| &self.entries[i].1)
    }

    pub fn balance_of(&self, wallet: &str) -> f64 {
        self.get(wallet).map_or(0.0, |w| w.balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &WalletBalance)> {
        self.entries.iter().map(|(w, b)| (w.as_str(), b))
    }

    /// Seed a wallet with an opening balance. Replaces an existing entry in place.
    pub fn seed(&mut self, wallet: String, entry: WalletBalance) {
        match self.index.get(&wallet) {
            Some(&i) => self.entries[i].1 = entry,
            None => {
                self.index.insert(wallet.clone(), self.entries.len());
                self.entries.push((wallet, entry));
            }
        }
    }

    /// Credit `amount` tokens, never letting the balance pass `max_tokens`.
    /// A new wallet records `tx_hash`/`time` as its first buy.
    pub fn credit(
        &mut self,
        wallet: &str,
        amount: f64,
        max_tokens: f64,
        tx_hash: &str,
        time: i64,
    ) -> Credit {
        let headroom = cap_headroom(self.balance_of(wallet), max_tokens);
        let credit = if headroom <= 0.0 {
            Credit::Saturated
        } else if amount > headroom {
            Credit::Clamped { requested: amount, credited: headroom }
        } else {
            Credit::Full(amount)
        };
        if credit == Credit::Saturated {
            return credit;
        }

        match self.index.get(wallet) {
            Some(&i) => self.entries[i].1.balance += credit.credited(),
            None => self.seed(
                wallet.to_string(),
                WalletBalance {
                    balance: credit.credited(),
                    first_buy_tx_hash: tx_hash.to_string(),
                    first_buy_time: time,
                },
            ),
        }
        credit
    }

    /// The `limit` largest balances, descending; equal balances keep first-seen order.
    pub fn top_holders(&self, limit: usize, total_supply: f64) -> Vec<TopHolder> {
        let mut order: Vec<usize> = (0..self.entries.len()).collect();
        order.sort_by(|&a, &b| self.entries[b].1.balance.total_cmp(&self.entries[a].1.balance));
        order
            .into_iter()
            .take(limit)
            .map(|i| {
                let (wallet, entry) = &self.entries[i];
                TopHolder {
                    wallet: wallet.clone(),
                    balance: entry.balance,
                    supply_percent: entry.balance / total_supply * 100.0,
                    first_buy_tx_hash: Some(entry.first_buy_tx_hash.clone()),
                    first_buy_time: Some(entry.first_buy_time),
                }
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// ActiveTraders - bounded FIFO set
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveTraders {
    capacity: usize,
    order: VecDeque<String>,
    members: HashSet<String>,
}

impl ActiveTraders {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, wallet: &str) -> bool {
        self.members.contains(wallet)
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.members.clear();
    }

    /// Re-inserting a member is a no-op and does not refresh its position.
    pub fn insert(&mut self, wallet: &str) {
        if self.members.contains(wallet) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(wallet.to_string());
        self.members.insert(wallet.to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
