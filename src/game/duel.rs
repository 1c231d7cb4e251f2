//! The match state machine.
//!
//! A `Match` owns both characters, the catalog they draw from and the RNG.
//! A half-turn takes two calls: a play (`play_card`, `play_opponent_turn`
//! or `apply_remote_move`) followed by `end_turn`, which refills the next
//! actor's hand and passes the turn. The gap between the two is where a UI
//! shows the play; a second play in that gap is rejected.
//!
//! ## Managed sides
//!
//! Every side is *managed* in a single-player match: this instance deals
//! its cards, grants it counters and refills its hand. A multiplayer peer
//! manages only its own character. The remote side's hand is whatever the
//! peer last announced, and nothing is ever added to it locally.

use im::Vector;
use log::{debug, info, warn};

use crate::cards::{CardCatalog, CardInstance};
use crate::core::{Character, GameRng, MatchConfig, MatchError, Side, SideMap};
use crate::deck::DeckManager;
use crate::effects::{EffectResolver, LogEntry, ResolverContext};
use crate::rules::{OpponentPolicy, ScoreEvent, Scoring};

use super::report::{victory_line, PlayedMove, StatLine, TurnReport};
use super::snapshot::MatchSnapshot;

/// Where the match is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchPhase {
    /// Dealt, waiting for `start`.
    NotStarted,
    /// Multiplayer guest waiting for the host's opening state.
    AwaitingSync,
    InProgress,
    Finished { winner: Side },
}

/// A two-sided duel.
#[derive(Clone, Debug)]
pub struct Match {
    catalog: CardCatalog,
    config: MatchConfig,
    scoring: Scoring,
    sides: SideMap<Character>,
    managed: SideMap<bool>,
    phase: MatchPhase,
    active: Side,
    has_played: bool,
    turn: u32,
    rng: GameRng,
}

impl Match {
    /// A single-player match with both sides dealt.
    ///
    /// Each side gets its full deck, an opening hand of two weighted
    /// attacks, a defense and an evasion, then any missing category.
    pub fn new(catalog: CardCatalog, config: MatchConfig, seed: u64) -> Self {
        let mut rng = GameRng::new(seed);
        let sides = deal(&catalog, &config, &mut rng);
        Self {
            scoring: Scoring::from(&config),
            catalog,
            config,
            sides,
            managed: SideMap::with_value(true),
            phase: MatchPhase::NotStarted,
            active: Side::Player,
            has_played: false,
            turn: 0,
            rng,
        }
    }

    /// A multiplayer host: deals both sides, then manages only its own.
    ///
    /// The host's opening snapshot is what the guest adopts.
    pub fn host(catalog: CardCatalog, config: MatchConfig, seed: u64) -> Self {
        let mut game = Self::new(catalog, config, seed);
        game.managed[Side::Enemy] = false;
        game
    }

    /// A multiplayer guest: empty until the host's snapshot is restored.
    pub fn guest(catalog: CardCatalog, config: MatchConfig, seed: u64) -> Self {
        let sides = SideMap::from_fn(|side| Character::new(config.starting_stats[side]));
        Self {
            scoring: Scoring::from(&config),
            catalog,
            config,
            sides,
            managed: SideMap::new(true, false),
            phase: MatchPhase::AwaitingSync,
            active: Side::Enemy,
            has_played: false,
            turn: 0,
            rng: GameRng::new(seed),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    #[must_use]
    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    /// Side whose half-turn it is.
    #[must_use]
    pub fn active(&self) -> Side {
        self.active
    }

    /// Whether the active side has already played this half-turn.
    #[must_use]
    pub fn has_played(&self) -> bool {
        self.has_played
    }

    /// Half-turns played so far.
    #[must_use]
    pub fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn character(&self, side: Side) -> &Character {
        &self.sides[side]
    }

    #[must_use]
    pub fn sides(&self) -> &SideMap<Character> {
        &self.sides
    }

    /// Whether this instance deals cards to `side`.
    #[must_use]
    pub fn is_managed(&self, side: Side) -> bool {
        self.managed[side]
    }

    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &CardCatalog {
        &self.catalog
    }

    #[must_use]
    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            MatchPhase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.winner().is_some()
    }

    /// Current numbers for both sides.
    #[must_use]
    pub fn stats(&self) -> SideMap<StatLine> {
        SideMap::from_fn(|side| StatLine::from(&self.sides[side]))
    }

    // =========================================================================
    // Turn flow
    // =========================================================================

    /// Begin play with `first` to act.
    pub fn start(&mut self, first: Side) -> Result<(), MatchError> {
        match self.phase {
            MatchPhase::NotStarted => {}
            MatchPhase::AwaitingSync => return Err(MatchError::AwaitingSync),
            MatchPhase::InProgress | MatchPhase::Finished { .. } => return Err(MatchError::GameOver),
        }
        self.phase = MatchPhase::InProgress;
        self.active = first;
        self.has_played = false;
        self.turn = 1;
        info!("match started, {first} goes first");
        Ok(())
    }

    /// Begin play with a coin flip deciding who acts first.
    pub fn start_with_coin_flip(&mut self) -> Result<Side, MatchError> {
        let first = if self.rng.coin_flip() { Side::Player } else { Side::Enemy };
        self.start(first)?;
        Ok(first)
    }

    /// Play the card at `hand_index` for `side`.
    ///
    /// A coin flip stored on the card by an earlier play is discarded.
    pub fn play_card(&mut self, side: Side, hand_index: usize) -> Result<TurnReport, MatchError> {
        self.check_turn(side)?;
        let mut card = self.sides[side]
            .hand
            .get(hand_index)
            .cloned()
            .ok_or(MatchError::NoSuchCard { index: hand_index })?;
        if card.used {
            return Err(MatchError::CardUsed { name: card.name().to_string() });
        }

        self.has_played = true;
        card.consume_use();
        card.resolved_stat = None;
        Ok(self.resolve(side, card, Some(hand_index)))
    }

    /// Pass the turn to the other side and refill its hand if managed.
    ///
    /// Returns the side now acting.
    pub fn end_turn(&mut self) -> Result<Side, MatchError> {
        self.check_phase()?;
        self.active = self.active.opponent();
        self.has_played = false;
        self.turn += 1;

        if self.managed[self.active] {
            self.refill(self.active);
        }
        Ok(self.active)
    }

    /// Play the computer opponent's half-turn.
    ///
    /// May first pull a card back from the discard pile. A held repeat card
    /// takes the whole turn: it is spent or dropped. Otherwise `policy`
    /// picks the card, and an empty choice plays nothing.
    pub fn play_opponent_turn<P: OpponentPolicy>(&mut self, policy: &P) -> Result<TurnReport, MatchError> {
        let side = Side::Enemy;
        self.check_turn(side)?;
        self.has_played = true;
        self.replay_from_discard(side);

        if let Some(index) = self.sides[side].hand.iter().position(|c| c.is_repeat() && !c.used) {
            return Ok(self.hold_repeat(side, index));
        }

        let choice = policy
            .choose_card(&self.sides[side], &self.sides[side.opponent()], &mut self.rng)
            .filter(|&i| self.sides[side].hand.get(i).is_some_and(|c| !c.used));

        match choice {
            Some(index) => {
                let mut card = self.sides[side].hand[index].clone();
                card.consume_use();
                card.resolved_stat = None;
                Ok(self.resolve(side, card, Some(index)))
            }
            None => {
                let mut report = TurnReport::new(side, self.turn);
                report.log.push("The Skeptic: \"I have nothing to say...\"".to_string());
                report.score_events = self.after_play(side, None);
                Ok(self.conclude(report))
            }
        }
    }

    /// Replay a move announced by the remote peer.
    ///
    /// `card` is the card as the peer played it, before resolution. An
    /// announced `hand` replaces the mirrored hand first. A card missing
    /// from the mirrored hand still resolves; the report is flagged as a
    /// desync.
    pub fn apply_remote_move(
        &mut self,
        card: CardInstance,
        hand: Option<Vector<CardInstance>>,
    ) -> Result<TurnReport, MatchError> {
        let side = Side::Enemy;
        self.check_turn(side)?;
        if let Some(hand) = hand {
            self.sides[side].hand = hand;
        }

        let index = self.sides[side]
            .hand
            .iter()
            .position(|c| c.name() == card.name() && !c.used);
        if index.is_none() {
            warn!("remote card `{}` not in mirrored hand", card.name());
        }

        self.has_played = true;
        let mut report = self.resolve(side, card, index);
        report.played = None;
        report.desync = index.is_none();
        Ok(report)
    }

    // =========================================================================
    // Snapshots
    // =========================================================================

    /// The state as seen from this instance.
    #[must_use]
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot {
            sides: self.sides.clone(),
            active: self.active,
            has_played: self.has_played,
            turn: self.turn,
            winner: self.winner(),
        }
    }

    /// Adopt `snapshot`, in which this instance's own character is the
    /// `perspective` side.
    ///
    /// In a multiplayer match, a managed side that already holds cards
    /// keeps its own hand, deck and discard pile; the sender only knows
    /// the last announced hand.
    pub fn restore(&mut self, snapshot: MatchSnapshot, perspective: Side) {
        let snapshot = match perspective {
            Side::Player => snapshot,
            Side::Enemy => snapshot.swapped(),
        };
        let mirrored = self.managed.iter().any(|(_, managed)| !managed);
        let mut sides = snapshot.sides;
        let mut kept = SideMap::with_value(false);

        for side in Side::BOTH {
            let local = &self.sides[side];
            let keep = mirrored && self.managed[side] && !(local.hand.is_empty() && local.deck.is_empty());
            kept[side] = keep;
            if keep {
                sides[side].hand = local.hand.clone();
                sides[side].deck = local.deck.clone();
                sides[side].discard_pile = local.discard_pile.clone();
                sides[side].discard_count = local.discard_count;
            }
        }

        self.sides = sides;
        self.active = snapshot.active;
        self.has_played = snapshot.has_played;
        self.turn = snapshot.turn;
        self.phase = match snapshot.winner {
            Some(winner) => MatchPhase::Finished { winner },
            None => MatchPhase::InProgress,
        };
        debug!("restored snapshot at turn {}, {} to act", self.turn, self.active);

        // A turn handed over while this peer was away never refilled its hand.
        if kept[self.active] && !self.has_played && self.phase == MatchPhase::InProgress {
            self.refill(self.active);
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn refill(&mut self, side: Side) {
        let manager = DeckManager::new(&self.catalog, self.config.counter_chance);
        let drawn = manager.draw_to_hand_limit(&mut self.sides[side], &mut self.rng);
        debug!("{side} drew {drawn} cards");
    }

    fn check_phase(&self) -> Result<(), MatchError> {
        match self.phase {
            MatchPhase::InProgress => Ok(()),
            MatchPhase::NotStarted => Err(MatchError::NotStarted),
            MatchPhase::AwaitingSync => Err(MatchError::AwaitingSync),
            MatchPhase::Finished { .. } => Err(MatchError::GameOver),
        }
    }

    fn check_turn(&self, side: Side) -> Result<(), MatchError> {
        self.check_phase()?;
        if side != self.active {
            return Err(MatchError::NotYourTurn(side));
        }
        if self.has_played {
            return Err(MatchError::AlreadyPlayed(side));
        }
        Ok(())
    }

    /// Resolve a card whose use has already been consumed, put it back in
    /// hand or in the discard pile, then score and grant.
    fn resolve(&mut self, side: Side, mut card: CardInstance, hand_index: Option<usize>) -> TurnReport {
        let target_side = side.opponent();
        let hand_before = self.sides[side].hand.clone();
        let mut payload = card.clone();

        let (source, target) = self.sides.pair_mut(side);
        let resolution = {
            let mut ctx = ResolverContext {
                catalog: self.managed[target_side].then_some(&self.catalog),
                rng: &mut self.rng,
            };
            EffectResolver::apply_card(&mut card, source, target, &mut ctx)
        };
        payload.resolved_stat = card.resolved_stat;

        match hand_index {
            Some(index) if card.used => {
                source.hand.remove(index);
                source.discard(card.clone());
            }
            Some(index) => {
                source.hand.set(index, card.clone());
            }
            None if card.used => source.discard(card.clone()),
            None => {}
        }

        info!("{side} played `{}`: {resolution}", card.name());

        let mut report = TurnReport::new(side, self.turn);
        report.log.push(resolution.to_string());
        report.score_events = self.after_play(side, Some(&card));
        report.card = Some(card);
        report.resolution = Some(resolution);
        if !self.managed[target_side] {
            report.played = Some(PlayedMove {
                card: payload,
                hand: hand_before,
            });
        }
        self.conclude(report)
    }

    /// Score the half-turn, then grant the target its defense, counter and
    /// missing categories if it is managed.
    fn after_play(&mut self, side: Side, played: Option<&CardInstance>) -> Vec<ScoreEvent> {
        let target_side = side.opponent();
        let (source, target) = self.sides.pair_mut(side);
        let events = self.scoring.check_points(side, source, target);

        if self.managed[target_side] {
            let manager = DeckManager::new(&self.catalog, self.config.counter_chance);
            manager.grant_defense_when_low(target, &mut self.rng);
            if let Some(card) = played {
                if let Some(counter) = manager.counter_card(card, target, target_side, &mut self.rng) {
                    debug!("{target_side} countered with `{}`", counter.name());
                    DeckManager::add_to_hand(counter, target);
                }
            }
            manager.ensure_minimum_composition(target, target_side, &mut self.rng);
        }
        events
    }

    /// Fill in the closing state and check for victory.
    fn conclude(&mut self, mut report: TurnReport) -> TurnReport {
        report.log.extend(report.score_events.iter().map(ToString::to_string));

        if let Some(winner) = self.scoring.check_victory(&self.sides) {
            self.phase = MatchPhase::Finished { winner };
            info!("match over, {winner} wins at turn {}", self.turn);
            report.log.push(victory_line(winner, self.scoring.points_to_win));
            report.winner = Some(winner);
        }

        report.stats = self.stats();
        report.hands = SideMap::from_fn(|side| self.sides[side].hand.clone());
        report
    }

    /// Spend or drop a held repeat card. Either way the turn is lost.
    fn hold_repeat(&mut self, side: Side, index: usize) -> TurnReport {
        let mut repeat = self.sides[side].hand.remove(index);
        let mut report = TurnReport::new(side, self.turn);

        if self.rng.chance(self.config.repeat_spend_chance) {
            repeat.used = true;
            report.log.push(format!("{} {}", repeat.text(), LogEntry::RepeatSpent));
            info!("{side} spent `{}`", repeat.name());
            report.card = Some(repeat.clone());
            self.sides[side].discard(repeat);
        } else {
            debug!("{side} dropped `{}`", repeat.name());
        }

        report.score_events = self.after_play(side, None);
        self.conclude(report)
    }

    /// Maybe pull a random card out of the discard pile into a short hand.
    fn replay_from_discard(&mut self, side: Side) {
        let character = &self.sides[side];
        let playable = character.hand.iter().filter(|c| !c.used).count();
        if self.config.discard_replay_chance <= 0.0
            || character.discard_pile.is_empty()
            || playable >= self.config.discard_replay_hand_size
            || !self.rng.chance(self.config.discard_replay_chance)
        {
            return;
        }

        let character = &mut self.sides[side];
        let index = self.rng.gen_range_usize(0..character.discard_pile.len());
        let mut card = character.discard_pile.remove(index);
        card.used = false;
        card.uses_left = card.template.uses;
        card.from_discard = true;
        info!("{side} pulled `{}` back from the discard pile", card.name());
        character.hand.push_back(card);
    }
}

/// Build both decks and opening hands.
fn deal(catalog: &CardCatalog, config: &MatchConfig, rng: &mut GameRng) -> SideMap<Character> {
    let manager = DeckManager::new(catalog, config.counter_chance);
    SideMap::from_fn(|side| {
        let mut character = Character::new(config.starting_stats[side]);
        character.deck = manager.build_deck(side);
        character.hand = manager.deal_initial_hand(&character, side, rng);
        manager.ensure_minimum_composition(&mut character, side, rng);
        character
    })
}
