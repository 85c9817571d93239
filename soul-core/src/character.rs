//! The character facade — one bundle of the six layered stores.
//!
//! A [`Character`] exclusively owns its emotion vector and the opt-in
//! layer states; the shared [`Registry`] arrives behind an `Arc` and the
//! clock is injected. Every public operation on one character must be
//! serialised by the host; different characters are independent.
//!
//! Within `apply_interaction` the post-steps are wired statically in the
//! canonical order — history update first (so baselines fold in the new
//! values), presentation recompute second, observational custom hooks
//! last. The ordering is an invariant of this type, not a property of
//! registration calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::belief::{Belief, BeliefEvaluator, BeliefStore, Evaluation};
use crate::config::SoulConfig;
use crate::emotion::{self, PreHook};
use crate::erosion::{self, Direction, ErosionState, TippingEvent};
use crate::error::{Result, SoulError};
use crate::history::{HistoryState, ShiftRecord};
use crate::presentation::PresentationState;
use crate::registry::Registry;
use crate::trigger::{self, FiredTopic, Sensitivity, TriggerState};
use crate::types::{
    CharacterId, Emotion, EmotionDeltas, EmotionVector, PersonId, Personality, TimeSource,
    Timestamp, zero_clock,
};

/// A post-hook: observes a completed interaction after history and
/// presentation have settled. Purely observational — it cannot mutate
/// core emotions.
pub type PostHook = Box<dyn Fn(&Character, &str, &EmotionDeltas) + Send + Sync>;

/// Everything that happened during one conversation turn.
#[derive(Debug, Default)]
pub struct TurnReport {
    /// Topics fired by the trigger scan.
    pub fired_topics: Vec<FiredTopic>,
    /// The evaluator's raw output, when a belief layer ran.
    pub evaluation: Option<Evaluation>,
    /// Evaluator deltas that actually landed (post-clamp, post-scaling).
    pub applied_deltas: EmotionDeltas,
    /// Beliefs that tipped this turn.
    pub tipping_events: Vec<TippingEvent>,
}

/// One character's complete inner state.
pub struct Character {
    id: CharacterId,
    personality: Personality,
    emotions: EmotionVector,
    registry: Arc<Registry>,
    config: SoulConfig,
    clock: TimeSource,
    history: Option<HistoryState>,
    presentation: Option<PresentationState>,
    beliefs: Option<BeliefStore>,
    triggers: Option<TriggerState>,
    evaluator: Option<Box<dyn BeliefEvaluator>>,
    pre_hooks: Vec<PreHook>,
    post_hooks: Vec<PostHook>,
}

impl fmt::Debug for Character {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Character")
            .field("id", &self.id)
            .field("personality", &self.personality)
            .field("emotions", &self.emotions)
            .field("history", &self.history.is_some())
            .field("presentation", &self.presentation.is_some())
            .field("beliefs", &self.beliefs.is_some())
            .field("triggers", &self.triggers.is_some())
            .finish_non_exhaustive()
    }
}

impl Character {
    /// Start building a character against a shared registry.
    #[must_use]
    pub fn builder(registry: Arc<Registry>, personality: Personality) -> CharacterBuilder {
        CharacterBuilder::new(registry, personality)
    }

    /// This character's ID.
    #[must_use]
    pub fn id(&self) -> CharacterId {
        self.id
    }

    /// The immutable personality tag.
    #[must_use]
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// The full core emotion vector.
    #[must_use]
    pub fn emotions(&self) -> &EmotionVector {
        &self.emotions
    }

    /// One core emotion value.
    #[must_use]
    pub fn emotion(&self, emotion: Emotion) -> f32 {
        self.emotions.get(emotion)
    }

    /// Engine configuration this character was built with.
    #[must_use]
    pub fn config(&self) -> &SoulConfig {
        &self.config
    }

    fn now(&self) -> Timestamp {
        (self.clock)()
    }

    pub(crate) fn presentation_state(&self) -> Option<&PresentationState> {
        self.presentation.as_ref()
    }

    // -----------------------------------------------------------------
    // Core emotions
    // -----------------------------------------------------------------

    /// Apply a catalogued interaction at the given intensity.
    ///
    /// Pipeline: scale → pre-hooks → cross-effects → personality scaling
    /// → clamped commit → history update → presentation recompute →
    /// custom post-hooks. Returns the applied map (post-personality,
    /// pre-clamp).
    ///
    /// # Errors
    /// `UnknownInteraction` when the name is not catalogued.
    pub fn apply_interaction(&mut self, name: &str, intensity: f32) -> Result<EmotionDeltas> {
        let applied = emotion::apply_interaction(
            &mut self.emotions,
            &self.registry,
            self.personality,
            name,
            intensity,
            &self.pre_hooks,
        )?;

        let now = self.now();
        if let Some(history) = &mut self.history {
            history.update(&self.emotions, name, now);
        }
        if let Some(presentation) = &mut self.presentation {
            if presentation.active_situation().is_some() {
                presentation.recompute(&self.emotions, self.personality, &self.registry);
            }
        }
        for hook in &self.post_hooks {
            hook(&*self, name, &applied);
        }
        Ok(applied)
    }

    /// Nudge one emotion directly: personality-scale, add, clamp.
    /// Skips cross-effects, history, presentation, and hooks. Returns
    /// the change that actually landed.
    pub fn nudge(&mut self, emotion: Emotion, delta: f32) -> f32 {
        emotion::nudge(
            &mut self.emotions,
            &self.registry,
            self.personality,
            emotion,
            delta,
        )
    }

    // -----------------------------------------------------------------
    // History
    // -----------------------------------------------------------------

    /// Read-only view of the history layer.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn history(&self) -> Result<&HistoryState> {
        self.history
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("history"))
    }

    /// Capture the full emotion vector under a label at an explicit
    /// timestamp.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn take_snapshot(&mut self, timestamp: Timestamp, label: &str) -> Result<()> {
        let emotions = self.emotions;
        let history = self
            .history
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("history"))?;
        history.take_snapshot(&emotions, timestamp, label);
        Ok(())
    }

    /// Most recent recorded baseline shift for one emotion.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn find_shift(&self, emotion: Emotion) -> Result<Option<&ShiftRecord>> {
        Ok(self.history()?.find_shift(emotion))
    }

    /// Shifts large enough to narrate.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn narrative_shifts(&self, threshold: f32) -> Result<Vec<&ShiftRecord>> {
        Ok(self.history()?.narrative_shifts(threshold))
    }

    // -----------------------------------------------------------------
    // Presentation
    // -----------------------------------------------------------------

    /// Enter a situation with the given people present.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled;
    /// `UnknownSituation` when the name is not catalogued.
    pub fn enter_situation(&mut self, situation: &str, people: &[PersonId]) -> Result<()> {
        self.registry.situation(situation)?;
        let emotions = self.emotions;
        let personality = self.personality;
        let registry = Arc::clone(&self.registry);
        let presentation = self
            .presentation
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("presentation"))?;
        presentation.enter(situation, people, &emotions, personality, &registry);
        Ok(())
    }

    /// Leave the active situation.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn leave_situation(&mut self) -> Result<()> {
        self.presentation
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("presentation"))?
            .leave();
        Ok(())
    }

    /// Register one person's pull on one presented emotion. Takes effect
    /// immediately when that person is present in the active situation.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn set_person_modifier(
        &mut self,
        person: PersonId,
        emotion: Emotion,
        bias: f32,
        strength: f32,
    ) -> Result<()> {
        let emotions = self.emotions;
        let personality = self.personality;
        let registry = Arc::clone(&self.registry);
        let presentation = self
            .presentation
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("presentation"))?;
        presentation.set_person_modifier(person, emotion, bias, strength);
        if presentation.active_situation().is_some() {
            presentation.recompute(&emotions, personality, &registry);
        }
        Ok(())
    }

    /// The outward-facing emotion vector. Identical to core when no
    /// situation is active.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn perceived(&self) -> Result<EmotionVector> {
        let presentation = self
            .presentation
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("presentation"))?;
        Ok(presentation.perceived(&self.emotions))
    }

    /// Current masking strain, in [0, 1].
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn masking_strain(&self) -> Result<f32> {
        let presentation = self
            .presentation
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("presentation"))?;
        Ok(presentation.masking_strain(&self.emotions, &self.config.presentation))
    }

    // -----------------------------------------------------------------
    // Beliefs & erosion
    // -----------------------------------------------------------------

    fn belief_store(&self) -> Result<&BeliefStore> {
        self.beliefs
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("beliefs"))
    }

    fn belief_store_mut(&mut self) -> Result<&mut BeliefStore> {
        self.beliefs
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("beliefs"))
    }

    /// Append a belief, seeding its erosion state from the engine's
    /// tuning and anchoring its clock at the current time. Returns the
    /// belief's stable index. Use [`Character::add_belief_with_erosion`]
    /// to keep a hand-crafted erosion state instead.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn add_belief(&mut self, mut belief: Belief) -> Result<usize> {
        belief.erosion = ErosionState::from_tuning(&self.config.erosion, self.now());
        Ok(self.belief_store_mut()?.add(belief))
    }

    /// Append a belief keeping its erosion state as given, stamping only
    /// the decay clock. Returns the belief's stable index.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn add_belief_with_erosion(&mut self, mut belief: Belief) -> Result<usize> {
        belief.erosion.last_event_time = self.now();
        Ok(self.belief_store_mut()?.add(belief))
    }

    /// All beliefs in stable-index order.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn beliefs(&self) -> Result<&[Belief]> {
        Ok(self.belief_store()?.beliefs())
    }

    /// Beliefs carrying a tag, with their stable indices.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn beliefs_with_tag(&self, tag: &str) -> Result<Vec<(usize, &Belief)>> {
        Ok(self.belief_store()?.with_tag(tag))
    }

    /// Install or replace the evaluator backend.
    pub fn set_evaluator(&mut self, evaluator: Box<dyn BeliefEvaluator>) {
        self.evaluator = Some(evaluator);
    }

    /// Run the evaluator against a scene and conversation. Does not
    /// apply anything — see [`Character::process_turn`] for the wired
    /// flow.
    ///
    /// # Errors
    /// `LayerNotInitialized` / `EvaluatorNotConfigured`, or
    /// `InvalidBeliefIndex` when the backend fabricates indices.
    pub fn evaluate(&self, scene: &str, conversation: &str) -> Result<Evaluation> {
        let store = self.belief_store()?;
        let evaluator = self
            .evaluator
            .as_ref()
            .ok_or(SoulError::EvaluatorNotConfigured)?;
        let evaluation = evaluator.evaluate(store.beliefs(), &self.emotions, scene, conversation);
        evaluation.validate(store.len())?;
        Ok(evaluation)
    }

    /// Scripted discontinuous belief update, gated by inertia. Returns
    /// whether the shock landed.
    ///
    /// # Errors
    /// `LayerNotInitialized` / `InvalidBeliefIndex`.
    pub fn apply_shock(
        &mut self,
        index: usize,
        direction: Direction,
        magnitude: f32,
    ) -> Result<bool> {
        self.belief_store_mut()?
            .apply_shock(index, direction, magnitude)
    }

    /// Accumulate erosion pressure on one belief.
    ///
    /// # Errors
    /// `LayerNotInitialized` / `InvalidBeliefIndex`.
    pub fn apply_pressure(
        &mut self,
        index: usize,
        direction: Direction,
        amount: f32,
    ) -> Result<()> {
        erosion::apply_pressure(self.belief_store_mut()?, index, direction, amount)
    }

    /// Tip the belief if its pressure has reached the threshold.
    ///
    /// # Errors
    /// `LayerNotInitialized` / `InvalidBeliefIndex`.
    pub fn check_tipping_point(&mut self, index: usize) -> Result<Option<TippingEvent>> {
        let hardening = self.config.erosion.hardening_factor;
        erosion::check_tipping_point(self.belief_store_mut()?, index, hardening)
    }

    /// How close one belief is to tipping, in [0, 1].
    ///
    /// # Errors
    /// `LayerNotInitialized` / `InvalidBeliefIndex`.
    pub fn tipping_proximity(&self, index: usize) -> Result<f32> {
        Ok(self.belief_store()?.belief(index)?.erosion.tipping_proximity())
    }

    /// Decay every belief's pressure for the elapsed time up to
    /// `current_time`.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn erosion_tick(&mut self, current_time: Timestamp) -> Result<()> {
        let store = self.belief_store_mut()?;
        for index in 0..store.len() {
            erosion::tick(store, index, current_time)?;
        }
        Ok(())
    }

    /// Feed an evaluation's impacts into erosion, collecting tipping
    /// events. Emotion deltas are *not* applied here — route them
    /// through [`Character::nudge`] or use [`Character::process_turn`].
    ///
    /// # Errors
    /// `LayerNotInitialized` / `InvalidBeliefIndex`.
    pub fn process_evaluation(&mut self, evaluation: &Evaluation) -> Result<Vec<TippingEvent>> {
        let tuning = self.config.erosion.clone();
        erosion::process_evaluation(
            self.belief_store_mut()?,
            &evaluation.impacts,
            &evaluation.emotion_deltas,
            &tuning,
        )
    }

    // -----------------------------------------------------------------
    // Triggers
    // -----------------------------------------------------------------

    fn trigger_state_mut(&mut self) -> Result<&mut TriggerState> {
        self.triggers
            .as_mut()
            .ok_or(SoulError::LayerNotInitialized("triggers"))
    }

    /// Scan text for sensitive topics, firing each hit through nudge.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn process_text(&mut self, text: &str) -> Result<Vec<FiredTopic>> {
        let registry = Arc::clone(&self.registry);
        let personality = self.personality;
        let mut emotions = self.emotions;
        let state = self.trigger_state_mut()?;
        let fired = trigger::process_text(state, &registry, &mut emotions, personality, text);
        self.emotions = emotions;
        Ok(fired)
    }

    /// Fire a topic directly, bypassing the keyword scan but honouring
    /// the cooldown.
    ///
    /// # Errors
    /// `LayerNotInitialized` / `UnknownTopic`.
    pub fn trigger_topic(&mut self, topic: &str) -> Result<Option<FiredTopic>> {
        let registry = Arc::clone(&self.registry);
        let personality = self.personality;
        let mut emotions = self.emotions;
        let state = self.trigger_state_mut()?;
        let fired = trigger::trigger_topic(state, &registry, &mut emotions, personality, topic)?;
        self.emotions = emotions;
        Ok(fired)
    }

    /// Advance one conversational turn's worth of cooldowns.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn advance_turn(&mut self) -> Result<()> {
        self.trigger_state_mut()?.advance_turn();
        Ok(())
    }

    /// Configured sensitivities ranked by current intensity.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn sensitive_topics(&self) -> Result<Vec<(String, f32)>> {
        Ok(self
            .triggers
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("triggers"))?
            .sensitive_topics())
    }

    /// Read-only view of the trigger layer.
    ///
    /// # Errors
    /// `LayerNotInitialized` when the layer was never enabled.
    pub fn triggers(&self) -> Result<&TriggerState> {
        self.triggers
            .as_ref()
            .ok_or(SoulError::LayerNotInitialized("triggers"))
    }

    // -----------------------------------------------------------------
    // Turn orchestration
    // -----------------------------------------------------------------

    /// Run one inbound conversation turn end to end: advance trigger
    /// cooldowns, scan the conversation for triggers, run the belief
    /// evaluator, route its deltas through nudge, feed its impacts into
    /// erosion, and decay pressure to the current time. Layers that were
    /// never enabled are skipped; an enabled belief layer without an
    /// evaluator is an error.
    ///
    /// # Errors
    /// `EvaluatorNotConfigured` / `InvalidBeliefIndex` from the belief
    /// step.
    pub fn process_turn(&mut self, scene: &str, conversation: &str) -> Result<TurnReport> {
        let mut report = TurnReport::default();

        if self.triggers.is_some() {
            self.advance_turn()?;
            report.fired_topics = self.process_text(conversation)?;
        }

        if self.beliefs.is_some() {
            let evaluation = self.evaluate(scene, conversation)?;
            for (emotion, delta) in evaluation.emotion_deltas.iter() {
                report
                    .applied_deltas
                    .set(emotion, self.nudge(emotion, delta));
            }
            report.tipping_events = self.process_evaluation(&evaluation)?;
            report.evaluation = Some(evaluation);
            self.erosion_tick(self.now())?;
        }

        Ok(report)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Option bag for constructing a fully wired [`Character`].
pub struct CharacterBuilder {
    registry: Arc<Registry>,
    personality: Personality,
    config: SoulConfig,
    clock: TimeSource,
    initial_emotions: EmotionVector,
    with_history: bool,
    with_presentation: bool,
    beliefs: Option<Vec<Belief>>,
    sensitivities: Option<HashMap<String, Sensitivity>>,
    evaluator: Option<Box<dyn BeliefEvaluator>>,
    pre_hooks: Vec<PreHook>,
    post_hooks: Vec<PostHook>,
}

impl fmt::Debug for CharacterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CharacterBuilder")
            .field("personality", &self.personality)
            .field("with_history", &self.with_history)
            .field("with_presentation", &self.with_presentation)
            .finish_non_exhaustive()
    }
}

impl CharacterBuilder {
    /// Builder with every layer off and a zero clock.
    #[must_use]
    pub fn new(registry: Arc<Registry>, personality: Personality) -> Self {
        Self {
            registry,
            personality,
            config: SoulConfig::default(),
            clock: zero_clock(),
            initial_emotions: EmotionVector::neutral(),
            with_history: false,
            with_presentation: false,
            beliefs: None,
            sensitivities: None,
            evaluator: None,
            pre_hooks: Vec::new(),
            post_hooks: Vec::new(),
        }
    }

    /// Use a non-default engine configuration.
    #[must_use]
    pub fn config(mut self, config: SoulConfig) -> Self {
        self.config = config;
        self
    }

    /// Inject the host's monotonic clock.
    #[must_use]
    pub fn clock(mut self, clock: TimeSource) -> Self {
        self.clock = clock;
        self
    }

    /// Start from a non-neutral emotion vector.
    #[must_use]
    pub fn initial_emotions(mut self, emotions: EmotionVector) -> Self {
        self.initial_emotions = emotions;
        self
    }

    /// Enable the history layer (EMA alpha and shift threshold come from
    /// the configuration).
    #[must_use]
    pub fn with_history(mut self) -> Self {
        self.with_history = true;
        self
    }

    /// Enable the presentation layer.
    #[must_use]
    pub fn with_presentation(mut self) -> Self {
        self.with_presentation = true;
        self
    }

    /// Enable the belief layer, seeded with an initial belief list.
    #[must_use]
    pub fn with_beliefs(mut self, beliefs: Vec<Belief>) -> Self {
        self.beliefs = Some(beliefs);
        self
    }

    /// Enable the trigger layer with per-topic sensitivity overrides
    /// (an empty map is valid: every topic at intensity 1.0).
    #[must_use]
    pub fn with_triggers(mut self, sensitivities: HashMap<String, Sensitivity>) -> Self {
        self.sensitivities = Some(sensitivities);
        self
    }

    /// Install the evaluator backend.
    #[must_use]
    pub fn evaluator(mut self, evaluator: Box<dyn BeliefEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Append a pre-hook; hooks run in registration order.
    #[must_use]
    pub fn pre_hook(mut self, hook: PreHook) -> Self {
        self.pre_hooks.push(hook);
        self
    }

    /// Append an observational post-hook; hooks run in registration
    /// order, after history and presentation have settled.
    #[must_use]
    pub fn post_hook(mut self, hook: PostHook) -> Self {
        self.post_hooks.push(hook);
        self
    }

    /// Reassemble a character from previously saved layer states. The
    /// presented cache is rebuilt here since it is never persisted.
    pub(crate) fn restore_parts(
        self,
        id: CharacterId,
        emotions: EmotionVector,
        history: Option<HistoryState>,
        mut presentation: Option<PresentationState>,
        beliefs: Option<Vec<Belief>>,
        triggers: Option<TriggerState>,
    ) -> Character {
        if let Some(p) = &mut presentation {
            p.recompute(&emotions, self.personality, &self.registry);
        }
        Character {
            id,
            personality: self.personality,
            emotions,
            registry: self.registry,
            config: self.config,
            clock: self.clock,
            history,
            presentation,
            beliefs: beliefs.map(BeliefStore::new),
            triggers,
            evaluator: self.evaluator,
            pre_hooks: self.pre_hooks,
            post_hooks: self.post_hooks,
        }
    }

    /// Construct the wired character.
    #[must_use]
    pub fn build(self) -> Character {
        let now = (self.clock)();
        let history = self.with_history.then(|| {
            HistoryState::new(
                &self.initial_emotions,
                self.config.history.ema_alpha,
                self.config.history.shift_threshold,
            )
        });
        let presentation = self.with_presentation.then(PresentationState::new);
        let erosion_tuning = self.config.erosion.clone();
        let beliefs = self.beliefs.map(|mut list| {
            for belief in &mut list {
                belief.erosion = ErosionState::from_tuning(&erosion_tuning, now);
            }
            BeliefStore::new(list)
        });
        let triggers = self
            .sensitivities
            .map(|s| TriggerState::new(s, self.config.triggers.cooldown_turns));

        Character {
            id: CharacterId::new(),
            personality: self.personality,
            emotions: self.initial_emotions,
            registry: self.registry,
            config: self.config,
            clock: self.clock,
            history,
            presentation,
            beliefs,
            triggers,
            evaluator: self.evaluator,
            pre_hooks: self.pre_hooks,
            post_hooks: self.post_hooks,
        }
    }
}
