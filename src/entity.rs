use alloy_primitives::Address;
use serde::Serialize;
use std::fmt;

/// Distribution phase. Phase 1 is the claim contract, phase 2 the direct wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Phase {
    Claim = 1,
    Distribution = 2,
}

impl Phase {
    pub fn as_i64(self) -> i64 {
        self as i64
    }

    pub fn from_i64(value: i64) -> Option<Self> {
        match value {
            1 => Some(Phase::Claim),
            2 => Some(Phase::Distribution),
            _ => None,
        }
    }

    pub fn token_kind(self) -> TokenKind {
        match self {
            Phase::Claim => TokenKind::W0g,
            Phase::Distribution => TokenKind::Native,
        }
    }
}

/// Token symbol credited by a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    /// Wrapped token paid out by the claim contract.
    #[serde(rename = "W0G")]
    W0g,
    /// Native chain value sent by the distribution wallet.
    #[serde(rename = "0G")]
    Native,
}

impl TokenKind {
    pub fn symbol(self) -> &'static str {
        match self {
            TokenKind::W0g => "W0G",
            TokenKind::Native => "0G",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "W0G" => Some(TokenKind::W0g),
            "0G" => Some(TokenKind::Native),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    ClaimContract,
    DistributionWallet,
}

impl EntityKind {
    pub fn label(self) -> &'static str {
        match self {
            EntityKind::ClaimContract => "claim",
            EntityKind::DistributionWallet => "distribution",
        }
    }
}

/// One of the two fixed on-chain addresses whose activity is tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchedEntity {
    /// Token transfers into the claim contract. The log-level sender must be
    /// one of `accepted_senders`; the claimant is the transaction sender.
    ClaimContract {
        address: Address,
        token: Address,
        accepted_senders: Vec<Address>,
    },
    /// Outgoing native-value transactions sent by the distribution wallet.
    DistributionWallet { address: Address },
}

impl WatchedEntity {
    /// Claim contract entity. The contract itself is always an accepted sender.
    pub fn claim_contract(address: Address, token: Address, admin: Address) -> Self {
        WatchedEntity::ClaimContract {
            address,
            token,
            accepted_senders: vec![address, admin],
        }
    }

    pub fn distribution_wallet(address: Address) -> Self {
        WatchedEntity::DistributionWallet { address }
    }

    pub fn address(&self) -> Address {
        match self {
            WatchedEntity::ClaimContract { address, .. } => *address,
            WatchedEntity::DistributionWallet { address } => *address,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            WatchedEntity::ClaimContract { .. } => EntityKind::ClaimContract,
            WatchedEntity::DistributionWallet { .. } => EntityKind::DistributionWallet,
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            WatchedEntity::ClaimContract { .. } => Phase::Claim,
            WatchedEntity::DistributionWallet { .. } => Phase::Distribution,
        }
    }
}
