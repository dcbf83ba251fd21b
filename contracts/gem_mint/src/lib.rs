#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod rewards;
pub mod typed_data;

pub mod constants {
    pub const TOKEN_NAME: &str = "GemMint";
    pub const TOKEN_SYMBOL: &str = "GEM";
    /// Version tag bound into the permit domain separator.
    pub const PERMIT_VERSION: &str = "1";

    pub const DECIMALS: u8 = 18;
    pub const ONE_TOKEN: u128 = 1_000_000_000_000_000_000;

    pub const INITIAL_SUPPLY: u128 = 10_000_000 * ONE_TOKEN;
    pub const MAX_SUPPLY: u128 = 20_000_000 * ONE_TOKEN;

    // ── Initial allocation (basis points of the initial supply) ──────────
    pub const BPS_DENOMINATOR: u128 = 10_000;
    pub const REWARDS_POOL_BPS: u128 = 2_500;
    pub const ICO_PRESALE_BPS: u128 = 2_000;
    pub const LIQUIDITY_POOL_BPS: u128 = 1_500;
    pub const DEVELOPMENT_BPS: u128 = 1_500;
    pub const TEAM_BPS: u128 = 1_000;
    pub const MARKETING_BPS: u128 = 1_000;
    /// Reserves take the remainder, rounding dust included.
    pub const RESERVES_BPS: u128 = 500;
}

/// # GemMint: Loyalty Token Engine
///
/// **Role:** capped fungible-token ledger with a loyalty-rewards engine and
/// signature-based allowances.
///
/// ```text
///   external call
///        │
///        ▼
///   ┌────────────┐   ┌────────────┐   ┌────────────────┐
///   │ AccessGate │──►│   Ledger   │──►│ RewardsEngine  │
///   │ owner/pause│   │ mint/xfer  │   │ accrual hook   │
///   └────────────┘   └────────────┘   └────────────────┘
///
///   permit() ──► DelegatedAuthorization ──► allowance only
/// ```
///
/// ## Reward cycle
/// - Every non-zero transfer credits the sender with 1% of the amount as
///   *accrued reward* (bookkeeping, never minted).
/// - Transfers to a registered partner also add the amount to the sender's
///   *monthly partner spend*.
/// - Once a month the owner calls `distribute_monthly_bonus_rewards`, which
///   tops up accrued rewards by the spend tier's bonus percentage and
///   advances the snapshot clock, then `clear_monthly_data` to start the
///   next month.
/// - `reward_user` converts credit into real tokens by moving them out of the
///   rewards pool allocation. Supply never grows outside `mint`.
///
/// ## Lifecycle
/// The constructor only fixes the supply caps. `initialize` (deployer only,
/// exactly once) assigns the owner, seeds the allocation accounts and
/// computes the permit domain separator.
#[ink::contract]
mod gem_mint {
    use crate::constants::*;
    use crate::rewards;
    use crate::typed_data::{self, PermitMessage};
    use ink::prelude::collections::BTreeMap;
    use ink::prelude::string::String;
    use ink::prelude::vec::Vec;
    use ink::storage::Mapping;

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct GemMint {
        // ── Supply ────────────────────────────────────────────────────────
        /// Immutable ceiling, fixed by the constructor.
        max_supply: Balance,
        /// Seeded across the allocation accounts by `initialize`.
        initial_supply: Balance,
        total_supply: Balance,

        // ── Ledger ────────────────────────────────────────────────────────
        balances: Mapping<AccountId, Balance>,
        allowances: Mapping<(AccountId, AccountId), Balance>,

        // ── Access control ────────────────────────────────────────────────
        /// Deployer until `initialize` hands control to the real owner.
        owner: AccountId,
        paused: bool,
        initialized: bool,

        // ── Rewards engine ────────────────────────────────────────────────
        /// Funding account for `reward_user`.
        rewards_pool: AccountId,
        partners: Mapping<AccountId, bool>,
        monthly_partner_spending: Mapping<AccountId, Balance>,
        rewards_balance: Mapping<AccountId, Balance>,
        /// Number of completed bonus distributions.
        snapshot_id: u64,

        // ── Delegated authorisation ───────────────────────────────────────
        nonces: Mapping<AccountId, u64>,
        chain_id: u64,
        domain_separator: [u8; 32],
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct Transfer {
        #[ink(topic)]
        from: Option<AccountId>,
        #[ink(topic)]
        to: Option<AccountId>,
        value: Balance,
    }

    #[ink(event)]
    pub struct Approval {
        #[ink(topic)]
        owner: AccountId,
        #[ink(topic)]
        spender: AccountId,
        value: Balance,
    }

    /// Accrual hook outcome for a non-zero transfer.
    #[ink(event)]
    pub struct TransferWithReward {
        #[ink(topic)]
        from: AccountId,
        #[ink(topic)]
        to: AccountId,
        value: Balance,
        reward: Balance,
        partner: bool,
    }

    /// Emitted once per bonus distribution. `id` is the snapshot that just
    /// closed, i.e. the clock value before the increment.
    #[ink(event)]
    pub struct SnapshotCreated {
        id: u64,
    }

    #[ink(event)]
    pub struct MonthlyDataCleared {
        accounts: u32,
    }

    #[ink(event)]
    pub struct UserRewarded {
        #[ink(topic)]
        account: AccountId,
        amount: Balance,
    }

    #[ink(event)]
    pub struct PartnerAdded {
        #[ink(topic)]
        partner: AccountId,
    }

    #[ink(event)]
    pub struct PartnerRemoved {
        #[ink(topic)]
        partner: AccountId,
    }

    #[ink(event)]
    pub struct OwnershipTransferred {
        #[ink(topic)]
        previous_owner: Option<AccountId>,
        #[ink(topic)]
        new_owner: AccountId,
    }

    #[ink(event)]
    pub struct Paused {
        account: AccountId,
    }

    #[ink(event)]
    pub struct Unpaused {
        account: AccountId,
    }

    #[ink(event)]
    pub struct Initialized {
        #[ink(topic)]
        owner: AccountId,
        rewards_pool: AccountId,
        initial_supply: Balance,
    }

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        /// Caller is not the contract owner.
        NotOwner,
        /// Recovered permit signer differs from the claimed owner, or the
        /// signature is malformed.
        InvalidSignature,
        /// Mint would push total supply above the maximum supply.
        ExceedsMaxSupply,
        /// Sender's balance is insufficient.
        InsufficientBalance,
        /// Spender's allowance is insufficient.
        InsufficientAllowance,
        PartnerAlreadyExists,
        PartnerDoesNotExist,
        /// `initialize` has already run.
        AlreadyInitialized,
        /// `initialize` has not run yet.
        NotInitialized,
        AlreadyPaused,
        NotPaused,
        /// Permit deadline is in the past.
        PermitExpired,
        /// Rewards pool holds less than the requested reward.
        InsufficientRewardsPoolBalance,
        /// Transfers are disabled while paused.
        TokenTransferWhilePaused,
        /// The zero account was supplied where a real account is required.
        InvalidAddress,
        /// An arithmetic operation overflowed.
        Overflow,
    }

    /// Accounts that receive the initial supply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub struct Allocation {
        pub rewards_pool: AccountId,
        pub ico_presale: AccountId,
        pub liquidity_pool: AccountId,
        pub development: AccountId,
        pub team: AccountId,
        pub marketing: AccountId,
        pub reserves: AccountId,
    }

    impl Allocation {
        fn accounts(&self) -> [AccountId; 7] {
            [
                self.rewards_pool,
                self.ico_presale,
                self.liquidity_pool,
                self.development,
                self.team,
                self.marketing,
                self.reserves,
            ]
        }

        /// Splits `supply` by the allocation table. Reserves absorb the
        /// rounding dust so the shares always sum to `supply`.
        fn shares(&self, supply: Balance) -> Result<[(AccountId, Balance); 7], Error> {
            let portion = |bps: u128| -> Result<Balance, Error> {
                supply
                    .checked_mul(bps)
                    .map(|scaled| scaled / BPS_DENOMINATOR)
                    .ok_or(Error::Overflow)
            };

            let rewards_pool = portion(REWARDS_POOL_BPS)?;
            let ico_presale = portion(ICO_PRESALE_BPS)?;
            let liquidity_pool = portion(LIQUIDITY_POOL_BPS)?;
            let development = portion(DEVELOPMENT_BPS)?;
            let team = portion(TEAM_BPS)?;
            let marketing = portion(MARKETING_BPS)?;

            let distributed = [ico_presale, liquidity_pool, development, team, marketing]
                .iter()
                .try_fold(rewards_pool, |acc, share| acc.checked_add(*share))
                .ok_or(Error::Overflow)?;
            let reserves = supply.checked_sub(distributed).ok_or(Error::Overflow)?;

            Ok([
                (self.rewards_pool, rewards_pool),
                (self.ico_presale, ico_presale),
                (self.liquidity_pool, liquidity_pool),
                (self.development, development),
                (self.team, team),
                (self.marketing, marketing),
                (self.reserves, reserves),
            ])
        }
    }

    /// Reward bookkeeping computed before a transfer mutates anything.
    struct Accrual {
        reward: Balance,
        rewards_balance: Balance,
        partner_spend: Option<Balance>,
    }

    fn zero_account() -> AccountId {
        AccountId::from([0u8; 32])
    }

    fn account_bytes(account: &AccountId) -> [u8; 32] {
        let raw: &[u8; 32] = account.as_ref();
        *raw
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl GemMint {
        // ---------------------------------------------------------------------
        // Constructors
        // ---------------------------------------------------------------------

        /// Deploy with the default caps (`MAX_SUPPLY`, `INITIAL_SUPPLY`).
        #[ink(constructor)]
        pub fn new() -> Self {
            Self::with_caps(MAX_SUPPLY, INITIAL_SUPPLY)
        }

        /// Deploy with custom caps. Both are immutable afterwards.
        ///
        /// # Errors
        /// - [`Error::ExceedsMaxSupply`]: `initial_supply > max_supply`.
        #[ink(constructor)]
        pub fn with_supply(max_supply: Balance, initial_supply: Balance) -> Result<Self, Error> {
            if initial_supply > max_supply {
                return Err(Error::ExceedsMaxSupply);
            }
            Ok(Self::with_caps(max_supply, initial_supply))
        }

        fn with_caps(max_supply: Balance, initial_supply: Balance) -> Self {
            let deployer = Self::env().caller();
            Self {
                max_supply,
                initial_supply,
                total_supply: 0,
                balances: Mapping::default(),
                allowances: Mapping::default(),
                owner: deployer,
                paused: false,
                initialized: false,
                rewards_pool: deployer,
                partners: Mapping::default(),
                monthly_partner_spending: Mapping::default(),
                rewards_balance: Mapping::default(),
                snapshot_id: 0,
                nonces: Mapping::default(),
                chain_id: 0,
                domain_separator: [0u8; 32],
            }
        }

        /// One-time setup: hand control to `owner`, seed the allocation
        /// accounts with the initial supply and fix the permit domain.
        ///
        /// The already-initialized flag is checked first and set last.
        ///
        /// # Errors
        /// - [`Error::AlreadyInitialized`]: called a second time.
        /// - [`Error::NotOwner`]:           caller is not the deployer.
        /// - [`Error::InvalidAddress`]:     `owner` or an allocation account
        ///   is the zero account.
        #[ink(message)]
        pub fn initialize(
            &mut self,
            owner: AccountId,
            allocation: Allocation,
            chain_id: u64,
        ) -> Result<(), Error> {
            if self.initialized {
                return Err(Error::AlreadyInitialized);
            }
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            if owner == zero_account() || allocation.accounts().contains(&zero_account()) {
                return Err(Error::InvalidAddress);
            }

            let shares = allocation.shares(self.initial_supply)?;
            for (account, amount) in shares {
                self.credit_balance(account, amount)?;
                self.env().emit_event(Transfer {
                    from: None,
                    to: Some(account),
                    value: amount,
                });
            }
            self.total_supply = self.initial_supply;

            let contract = account_bytes(&self.env().account_id());
            self.domain_separator =
                typed_data::domain_separator(TOKEN_NAME, PERMIT_VERSION, chain_id, &contract);
            self.chain_id = chain_id;
            self.rewards_pool = allocation.rewards_pool;
            self.owner = owner;

            self.env().emit_event(OwnershipTransferred {
                previous_owner: None,
                new_owner: owner,
            });
            self.env().emit_event(Initialized {
                owner,
                rewards_pool: allocation.rewards_pool,
                initial_supply: self.initial_supply,
            });

            self.initialized = true;
            Ok(())
        }

        // =====================================================================
        // LEDGER
        // =====================================================================

        /// Mint `amount` to `to`. Allowed while paused.
        ///
        /// # Errors
        /// - [`Error::NotOwner`]:         caller is not the owner.
        /// - [`Error::InvalidAddress`]:   `to` is the zero account.
        /// - [`Error::ExceedsMaxSupply`]: `total_supply + amount > max_supply`.
        #[ink(message)]
        pub fn mint(&mut self, to: AccountId, amount: Balance) -> Result<(), Error> {
            self.ensure_owner()?;
            if to == zero_account() {
                return Err(Error::InvalidAddress);
            }

            let new_supply = self
                .total_supply
                .checked_add(amount)
                .ok_or(Error::ExceedsMaxSupply)?;
            if new_supply > self.max_supply {
                return Err(Error::ExceedsMaxSupply);
            }

            self.credit_balance(to, amount)?;
            self.total_supply = new_supply;
            self.env().emit_event(Transfer {
                from: None,
                to: Some(to),
                value: amount,
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer(&mut self, to: AccountId, value: Balance) -> Result<(), Error> {
            self.ensure_transfers_enabled()?;
            let from = self.env().caller();
            self.transfer_impl(from, to, value)
        }

        #[ink(message)]
        pub fn approve(&mut self, spender: AccountId, value: Balance) -> Result<(), Error> {
            self.ensure_initialized()?;
            let owner = self.env().caller();
            self.allowances.insert((owner, spender), &value);
            self.env().emit_event(Approval { owner, spender, value });
            Ok(())
        }

        /// Move `value` from `from` to `to`, spending the caller's allowance.
        #[ink(message)]
        pub fn transfer_from(
            &mut self,
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<(), Error> {
            self.ensure_transfers_enabled()?;
            let caller = self.env().caller();
            let current_allowance = self.allowance(from, caller);
            if current_allowance < value {
                return Err(Error::InsufficientAllowance);
            }
            self.transfer_impl(from, to, value)?;
            self.allowances
                .insert((from, caller), &current_allowance.saturating_sub(value));
            Ok(())
        }

        // =====================================================================
        // REWARDS ENGINE
        // =====================================================================

        #[ink(message)]
        pub fn add_partner(&mut self, partner: AccountId) -> Result<(), Error> {
            self.ensure_owner()?;
            if self.partners(partner) {
                return Err(Error::PartnerAlreadyExists);
            }
            self.partners.insert(partner, &true);
            self.env().emit_event(PartnerAdded { partner });
            Ok(())
        }

        #[ink(message)]
        pub fn remove_partner(&mut self, partner: AccountId) -> Result<(), Error> {
            self.ensure_owner()?;
            if !self.partners(partner) {
                return Err(Error::PartnerDoesNotExist);
            }
            self.partners.insert(partner, &false);
            self.env().emit_event(PartnerRemoved { partner });
            Ok(())
        }

        /// Bonus percentage unlocked by the account's partner spend this month.
        #[ink(message)]
        pub fn get_bonus_percentage(&self, account: AccountId) -> u32 {
            rewards::bonus_percentage(self.monthly_partner_spending(account))
        }

        /// Top up each listed account's accrued reward by its tier bonus, then
        /// advance the snapshot clock once.
        ///
        /// An account listed twice is credited twice, the second time on top
        /// of the first. Callers chunk long lists across calls; each call
        /// advances the clock.
        ///
        /// ```text
        /// accrued' = accrued + floor(accrued × bonus_percentage / 100)
        /// ```
        #[ink(message)]
        pub fn distribute_monthly_bonus_rewards(
            &mut self,
            accounts: Vec<AccountId>,
        ) -> Result<(), Error> {
            self.ensure_owner()?;

            let closed_id = self.snapshot_id;
            let next_id = closed_id.checked_add(1).ok_or(Error::Overflow)?;

            // Stage every credit first so an overflow leaves storage untouched.
            let mut credited: BTreeMap<AccountId, Balance> = BTreeMap::new();
            for account in accounts {
                let accrued = match credited.get(&account) {
                    Some(staged) => *staged,
                    None => self.rewards_balance(account),
                };
                let percent = self.get_bonus_percentage(account);
                let bonus = rewards::bonus_amount(accrued, percent).ok_or(Error::Overflow)?;
                let updated = accrued.checked_add(bonus).ok_or(Error::Overflow)?;
                credited.insert(account, updated);
            }

            for (account, balance) in credited {
                self.rewards_balance.insert(account, &balance);
            }
            self.snapshot_id = next_id;

            self.env().emit_event(SnapshotCreated { id: closed_id });
            Ok(())
        }

        /// Zero the monthly partner spend and accrued reward of every listed
        /// account. Unlisted accounts are untouched.
        #[ink(message)]
        pub fn clear_monthly_data(&mut self, accounts: Vec<AccountId>) -> Result<(), Error> {
            self.ensure_owner()?;
            let count = u32::try_from(accounts.len()).unwrap_or(u32::MAX);
            for account in accounts {
                self.monthly_partner_spending.insert(account, &0);
                self.rewards_balance.insert(account, &0);
            }
            self.env().emit_event(MonthlyDataCleared { accounts: count });
            Ok(())
        }

        /// Fund `amount` real tokens to `account` out of the rewards pool.
        ///
        /// Goes through the ordinary transfer path, so the pool accrues the
        /// usual 1% credit as sender. Not gated by pause.
        ///
        /// # Errors
        /// - [`Error::NotOwner`]:                       caller is not the owner.
        /// - [`Error::InsufficientRewardsPoolBalance`]: pool holds less than `amount`.
        #[ink(message)]
        pub fn reward_user(&mut self, account: AccountId, amount: Balance) -> Result<(), Error> {
            self.ensure_owner()?;
            let pool = self.rewards_pool;
            if self.balance_of(pool) < amount {
                return Err(Error::InsufficientRewardsPoolBalance);
            }
            self.transfer_impl(pool, account, amount)?;
            self.env().emit_event(UserRewarded { account, amount });
            Ok(())
        }

        // =====================================================================
        // DELEGATED AUTHORISATION
        // =====================================================================

        /// Set `owner → spender` allowance from an off-line signature over the
        /// typed `Permit` struct (see [`crate::typed_data`]).
        ///
        /// The signed struct embeds the owner's current nonce; a successful
        /// permit bumps it, so the same signature never verifies twice.
        ///
        /// # Errors
        /// - [`Error::PermitExpired`]:    `block_timestamp > deadline`.
        /// - [`Error::InvalidSignature`]: malformed signature or signer ≠ `owner`.
        #[ink(message)]
        #[allow(clippy::too_many_arguments)]
        pub fn permit(
            &mut self,
            owner: AccountId,
            spender: AccountId,
            value: Balance,
            deadline: Timestamp,
            v: u8,
            r: [u8; 32],
            s: [u8; 32],
        ) -> Result<(), Error> {
            self.ensure_initialized()?;
            if self.env().block_timestamp() > deadline {
                return Err(Error::PermitExpired);
            }

            let nonce = self.nonces(owner);
            let digest = PermitMessage {
                owner: account_bytes(&owner),
                spender: account_bytes(&spender),
                value,
                nonce,
                deadline,
            }
            .digest(&self.domain_separator);

            let signature =
                typed_data::signature_from_parts(v, &r, &s).ok_or(Error::InvalidSignature)?;
            let public_key = self
                .env()
                .ecdsa_recover(&signature, &digest)
                .map_err(|_| Error::InvalidSignature)?;
            let signer = AccountId::from(typed_data::account_from_public_key(&public_key));
            if signer != owner {
                return Err(Error::InvalidSignature);
            }

            let next_nonce = nonce.checked_add(1).ok_or(Error::Overflow)?;
            self.nonces.insert(owner, &next_nonce);
            self.allowances.insert((owner, spender), &value);
            self.env().emit_event(Approval { owner, spender, value });
            Ok(())
        }

        // =====================================================================
        // ACCESS GATE
        // =====================================================================

        #[ink(message)]
        pub fn pause(&mut self) -> Result<(), Error> {
            self.ensure_owner()?;
            if self.paused {
                return Err(Error::AlreadyPaused);
            }
            self.paused = true;
            self.env().emit_event(Paused {
                account: self.env().caller(),
            });
            Ok(())
        }

        #[ink(message)]
        pub fn unpause(&mut self) -> Result<(), Error> {
            self.ensure_owner()?;
            if !self.paused {
                return Err(Error::NotPaused);
            }
            self.paused = false;
            self.env().emit_event(Unpaused {
                account: self.env().caller(),
            });
            Ok(())
        }

        #[ink(message)]
        pub fn transfer_ownership(&mut self, new_owner: AccountId) -> Result<(), Error> {
            self.ensure_owner()?;
            if new_owner == zero_account() {
                return Err(Error::InvalidAddress);
            }
            let previous_owner = self.owner;
            self.owner = new_owner;
            self.env().emit_event(OwnershipTransferred {
                previous_owner: Some(previous_owner),
                new_owner,
            });
            Ok(())
        }

        // =====================================================================
        // VIEW FUNCTIONS
        // =====================================================================

        #[ink(message)]
        pub fn name(&self) -> String { String::from(TOKEN_NAME) }

        #[ink(message)]
        pub fn symbol(&self) -> String { String::from(TOKEN_SYMBOL) }

        #[ink(message)]
        pub fn decimals(&self) -> u8 { DECIMALS }

        #[ink(message)]
        pub fn total_supply(&self) -> Balance { self.total_supply }

        #[ink(message)]
        pub fn max_supply(&self) -> Balance { self.max_supply }

        #[ink(message)]
        pub fn initial_supply(&self) -> Balance { self.initial_supply }

        #[ink(message)]
        pub fn balance_of(&self, account: AccountId) -> Balance {
            self.balances.get(account).unwrap_or(0)
        }

        #[ink(message)]
        pub fn allowance(&self, owner: AccountId, spender: AccountId) -> Balance {
            self.allowances.get((owner, spender)).unwrap_or(0)
        }

        #[ink(message)]
        pub fn owner(&self) -> AccountId { self.owner }

        #[ink(message)]
        pub fn paused(&self) -> bool { self.paused }

        #[ink(message)]
        pub fn is_initialized(&self) -> bool { self.initialized }

        #[ink(message)]
        pub fn rewards_pool(&self) -> AccountId { self.rewards_pool }

        #[ink(message)]
        pub fn partners(&self, account: AccountId) -> bool {
            self.partners.get(account).unwrap_or(false)
        }

        #[ink(message)]
        pub fn monthly_partner_spending(&self, account: AccountId) -> Balance {
            self.monthly_partner_spending.get(account).unwrap_or(0)
        }

        /// Accrued, not yet funded, reward credit.
        #[ink(message)]
        pub fn rewards_balance(&self, account: AccountId) -> Balance {
            self.rewards_balance.get(account).unwrap_or(0)
        }

        /// Number of bonus distributions run so far.
        #[ink(message)]
        pub fn clock(&self) -> u64 { self.snapshot_id }

        #[ink(message)]
        pub fn nonces(&self, owner: AccountId) -> u64 {
            self.nonces.get(owner).unwrap_or(0)
        }

        #[ink(message)]
        pub fn chain_id(&self) -> u64 { self.chain_id }

        /// Domain separator off-line signers hash permits under.
        #[ink(message)]
        pub fn domain_separator(&self) -> [u8; 32] { self.domain_separator }

        // =====================================================================
        // INTERNAL HELPERS
        // =====================================================================

        fn ensure_initialized(&self) -> Result<(), Error> {
            if !self.initialized {
                return Err(Error::NotInitialized);
            }
            Ok(())
        }

        fn ensure_owner(&self) -> Result<(), Error> {
            self.ensure_initialized()?;
            if self.env().caller() != self.owner {
                return Err(Error::NotOwner);
            }
            Ok(())
        }

        fn ensure_transfers_enabled(&self) -> Result<(), Error> {
            self.ensure_initialized()?;
            if self.paused {
                return Err(Error::TokenTransferWhilePaused);
            }
            Ok(())
        }

        /// Balance movement followed by the reward hook. Every check runs
        /// before the first write.
        fn transfer_impl(
            &mut self,
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<(), Error> {
            if to == zero_account() {
                return Err(Error::InvalidAddress);
            }
            let from_balance = self.balance_of(from);
            if from_balance < value {
                return Err(Error::InsufficientBalance);
            }
            let accrual = self.compute_accrual(from, to, value)?;

            if from != to {
                let to_balance = self
                    .balance_of(to)
                    .checked_add(value)
                    .ok_or(Error::Overflow)?;
                self.balances.insert(from, &from_balance.saturating_sub(value));
                self.balances.insert(to, &to_balance);
            }

            self.env().emit_event(Transfer {
                from: Some(from),
                to: Some(to),
                value,
            });

            if let Some(accrual) = accrual {
                self.record_accrual(from, to, value, accrual);
            }
            Ok(())
        }

        fn credit_balance(&mut self, account: AccountId, amount: Balance) -> Result<(), Error> {
            let balance = self.balance_of(account);
            let new_balance = balance.checked_add(amount).ok_or(Error::Overflow)?;
            self.balances.insert(account, &new_balance);
            Ok(())
        }

        /// `None` for zero-value transfers: nothing accrues, nothing is spent.
        fn compute_accrual(
            &self,
            from: AccountId,
            to: AccountId,
            value: Balance,
        ) -> Result<Option<Accrual>, Error> {
            if value == 0 {
                return Ok(None);
            }

            let reward = rewards::transfer_reward(value);
            let rewards_balance = self
                .rewards_balance(from)
                .checked_add(reward)
                .ok_or(Error::Overflow)?;

            let partner_spend = if self.partners(to) {
                Some(
                    self.monthly_partner_spending(from)
                        .checked_add(value)
                        .ok_or(Error::Overflow)?,
                )
            } else {
                None
            };

            Ok(Some(Accrual {
                reward,
                rewards_balance,
                partner_spend,
            }))
        }

        fn record_accrual(&mut self, from: AccountId, to: AccountId, value: Balance, accrual: Accrual) {
            self.rewards_balance.insert(from, &accrual.rewards_balance);
            if let Some(spend) = accrual.partner_spend {
                self.monthly_partner_spending.insert(from, &spend);
            }
            self.env().emit_event(TransferWithReward {
                from,
                to,
                value,
                reward: accrual.reward,
                partner: accrual.partner_spend.is_some(),
            });
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

}
